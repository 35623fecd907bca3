//! Testing utilities
//!
//! In-memory stand-ins for the writer's collaborators, for use in pipeline tests.
//!
//! # Examples
//!
//! ```rust
//! use acton_mail_batch::email::{Email, EmailError};
//! use acton_mail_batch::testing::{RecordingHandler, ScriptedTransport};
//! use acton_mail_batch::writer::BatchMailWriter;
//!
//! # async fn example() {
//! let batch = vec![Email::new().subject("m1"), Email::new().subject("m2")];
//!
//! let transport = ScriptedTransport::new().fail(batch[0].id(), "FOO");
//! let handler = RecordingHandler::new();
//!
//! let writer = BatchMailWriter::new(transport.clone()).with_failure_handler(handler.clone());
//! writer.write(&batch).await.unwrap();
//!
//! assert_eq!(transport.dispatch_count(), 1);
//! assert_eq!(handler.causes(), vec!["FOO".to_string()]);
//! # }
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::email::{BatchOutcome, Email, EmailError, FailureReport, MailTransport, MessageId};
use crate::error::MailWriteError;
use crate::handler::FailureHandler;

#[derive(Debug, Clone)]
enum Script {
    Deliver,
    Fail(Vec<(MessageId, String)>),
    Unreachable(String),
}

#[derive(Debug)]
struct TransportState {
    script: Script,
    dispatched: Vec<Vec<Email>>,
}

/// Mail transport that records every dispatch and replays a scripted outcome
///
/// Clones share their state, so a clone can be handed to the writer while the
/// test keeps another for assertions.
#[derive(Debug, Clone)]
pub struct ScriptedTransport {
    state: Arc<Mutex<TransportState>>,
}

impl Default for ScriptedTransport {
    fn default() -> Self {
        Self {
            state: Arc::new(Mutex::new(TransportState {
                script: Script::Deliver,
                dispatched: Vec::new(),
            })),
        }
    }
}

impl ScriptedTransport {
    /// Transport that delivers everything
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Report `id` as failed with a [`EmailError::Rejected`] cause
    ///
    /// Failures accumulate; calling this again adds another entry.
    #[must_use]
    pub fn fail(self, id: MessageId, cause: &str) -> Self {
        {
            let mut state = self.state.lock();
            let mut failures = match &state.script {
                Script::Fail(failures) => failures.clone(),
                Script::Deliver | Script::Unreachable(_) => Vec::new(),
            };
            failures.push((id, cause.to_string()));
            state.script = Script::Fail(failures);
        }
        self
    }

    /// Fail every dispatch before attempting delivery
    #[must_use]
    pub fn unreachable(self, cause: &str) -> Self {
        self.state.lock().script = Script::Unreachable(cause.to_string());
        self
    }

    /// Number of `send_all` calls received
    #[must_use]
    pub fn dispatch_count(&self) -> usize {
        self.state.lock().dispatched.len()
    }

    /// Every batch received, in call order
    #[must_use]
    pub fn dispatched(&self) -> Vec<Vec<Email>> {
        self.state.lock().dispatched.clone()
    }
}

#[async_trait]
impl MailTransport for ScriptedTransport {
    async fn send(&self, email: &Email) -> Result<(), EmailError> {
        match self.send_all(std::slice::from_ref(email)).await {
            BatchOutcome::Delivered => Ok(()),
            BatchOutcome::Partial(mut report) => report
                .take(email.id())
                .map_or(Ok(()), Err),
            BatchOutcome::Failed(cause) => Err(cause),
        }
    }

    async fn send_all(&self, emails: &[Email]) -> BatchOutcome {
        let mut state = self.state.lock();
        state.dispatched.push(emails.to_vec());

        match &state.script {
            Script::Deliver => BatchOutcome::Delivered,
            Script::Fail(failures) => BatchOutcome::from_report(
                failures
                    .iter()
                    .map(|(id, cause)| (*id, EmailError::rejected(cause.clone())))
                    .collect::<FailureReport>(),
            ),
            Script::Unreachable(cause) => BatchOutcome::Failed(EmailError::smtp(cause.clone())),
        }
    }
}

/// Failure handler that records every call
///
/// Resolves every failure unless told to abort on a specific message.
#[derive(Debug, Clone, Default)]
pub struct RecordingHandler {
    calls: Arc<Mutex<Vec<(MessageId, String)>>>,
    abort_on: Option<MessageId>,
}

impl RecordingHandler {
    /// Handler that resolves every failure
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Abort when the failure for `id` is handled
    #[must_use]
    pub const fn abort_on(mut self, id: MessageId) -> Self {
        self.abort_on = Some(id);
        self
    }

    /// Ids and cause descriptions received, in call order
    #[must_use]
    pub fn calls(&self) -> Vec<(MessageId, String)> {
        self.calls.lock().clone()
    }

    /// Cause descriptions received, in call order
    #[must_use]
    pub fn causes(&self) -> Vec<String> {
        self.calls.lock().iter().map(|(_, cause)| cause.clone()).collect()
    }
}

impl FailureHandler for RecordingHandler {
    fn handle(&self, email: &Email, cause: EmailError) -> Result<(), MailWriteError> {
        self.calls.lock().push((email.id(), cause.to_string()));

        if self.abort_on == Some(email.id()) {
            return Err(MailWriteError::Undelivered {
                message_id: email.id(),
                source: cause,
            });
        }
        Ok(())
    }
}
