//! Outcome of a bulk dispatch and the per-message failure report.

use std::collections::HashMap;

use super::{EmailError, MessageId};

/// Messages a transport attempted but could not deliver, keyed by identity.
///
/// A message absent from the report was delivered.
#[derive(Debug, Default)]
pub struct FailureReport {
    failures: HashMap<MessageId, EmailError>,
}

impl FailureReport {
    /// Create an empty report
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the cause for one failed message
    ///
    /// A second cause for the same message replaces the first.
    pub fn insert(&mut self, id: MessageId, cause: EmailError) {
        self.failures.insert(id, cause);
    }

    /// Builder-style [`insert`](Self::insert)
    #[must_use]
    pub fn with_failure(mut self, id: MessageId, cause: EmailError) -> Self {
        self.insert(id, cause);
        self
    }

    /// Take the cause recorded for `id`, if any
    pub fn take(&mut self, id: MessageId) -> Option<EmailError> {
        self.failures.remove(&id)
    }

    /// Whether a failure is recorded for `id`
    #[must_use]
    pub fn contains(&self, id: MessageId) -> bool {
        self.failures.contains_key(&id)
    }

    /// Ids of every failed message, in no particular order
    pub fn ids(&self) -> impl Iterator<Item = MessageId> + '_ {
        self.failures.keys().copied()
    }

    /// Number of failed messages
    #[must_use]
    pub fn len(&self) -> usize {
        self.failures.len()
    }

    /// Whether the report holds no failures
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }
}

impl FromIterator<(MessageId, EmailError)> for FailureReport {
    fn from_iter<I: IntoIterator<Item = (MessageId, EmailError)>>(iter: I) -> Self {
        Self {
            failures: iter.into_iter().collect(),
        }
    }
}

/// Result of handing one batch to a [`MailTransport`](super::MailTransport)
#[derive(Debug)]
pub enum BatchOutcome {
    /// Every message was delivered
    Delivered,

    /// Delivery was attempted; the messages in the report failed
    Partial(FailureReport),

    /// The transport could not attempt delivery at all
    Failed(EmailError),
}

impl BatchOutcome {
    /// Collapse a report into an outcome, treating an empty report as delivered
    #[must_use]
    pub fn from_report(report: FailureReport) -> Self {
        if report.is_empty() {
            Self::Delivered
        } else {
            Self::Partial(report)
        }
    }
}
