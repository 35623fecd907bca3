//! Batch mail writer
//!
//! [`BatchMailWriter`] is the sink stage of a batch pipeline. Each call to
//! [`write`](BatchMailWriter::write) hands the whole batch to the transport in a
//! single dispatch and turns a partial failure into one [`FailureHandler`] call per
//! undelivered message.
//!
//! Every message of a batch ends up in exactly one state:
//! - delivered (absent from the transport's failure report)
//! - failed and resolved (the handler returned `Ok`)
//! - failed and unresolved (the handler returned `Err`, aborting the write)
//!
//! Failures are handled in batch submission order. The first unresolved failure
//! stops the write; failures after it are not handled.
//!
//! # Examples
//!
//! ```rust,no_run
//! use acton_mail_batch::prelude::*;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let writer = BatchMailWriter::builder()
//!     .transport(SmtpBackend::from_env()?)
//!     .failure_handler(LogAndContinue)
//!     .build()?;
//!
//! let batch = vec![
//!     Email::new()
//!         .to("user@example.com")
//!         .from("noreply@myapp.com")
//!         .subject("Your weekly digest")
//!         .text("Nothing new this week."),
//! ];
//!
//! writer.write(&batch).await?;
//! # Ok(())
//! # }
//! ```

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error, instrument, warn};

use crate::email::{BatchOutcome, Email, FailureReport, MailTransport, MessageId};
use crate::error::MailWriteError;
use crate::handler::{AbortOnFailure, FailureHandler};

/// A sink stage that accepts one already-sized chunk of items per call
#[async_trait]
pub trait ItemWriter<T: Sync>: Send + Sync {
    /// Error returned when the chunk could not be written
    type Error: std::error::Error + Send + Sync + 'static;

    /// Write one chunk of items
    ///
    /// # Errors
    ///
    /// Returns an error if the chunk could not be written in full
    async fn write(&self, items: &[T]) -> Result<(), Self::Error>;
}

/// Sends batches of emails through a [`MailTransport`]
///
/// The transport and failure handler are fixed at construction. Without an
/// explicit handler the writer uses [`AbortOnFailure`].
#[derive(Clone)]
pub struct BatchMailWriter {
    transport: Arc<dyn MailTransport>,
    handler: Arc<dyn FailureHandler>,
}

impl fmt::Debug for BatchMailWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BatchMailWriter").finish_non_exhaustive()
    }
}

impl BatchMailWriter {
    /// Create a writer using the default [`AbortOnFailure`] handler
    #[must_use]
    pub fn new<T: MailTransport + 'static>(transport: T) -> Self {
        Self::from_parts(Arc::new(transport), Arc::new(AbortOnFailure))
    }

    /// Create a writer from shared collaborators
    #[must_use]
    pub fn from_parts(
        transport: Arc<dyn MailTransport>,
        handler: Arc<dyn FailureHandler>,
    ) -> Self {
        Self { transport, handler }
    }

    /// Start building a writer
    #[must_use]
    pub fn builder() -> BatchMailWriterBuilder {
        BatchMailWriterBuilder::default()
    }

    /// Replace the failure handler
    #[must_use]
    pub fn with_failure_handler<H: FailureHandler + 'static>(mut self, handler: H) -> Self {
        self.handler = Arc::new(handler);
        self
    }

    /// Deliver one batch
    ///
    /// Performs exactly one transport dispatch with the batch as given, empty
    /// batches included. Never retries, splits or reorders.
    ///
    /// # Errors
    ///
    /// - [`MailWriteError::Transport`] if the transport could not attempt delivery
    /// - [`MailWriteError::UnknownMessage`] if the transport reported a failure for
    ///   a message that is not in `batch`; no handler runs in that case
    /// - whatever the failure handler returned for the first failure it did not
    ///   resolve, unchanged
    #[instrument(skip_all, fields(batch_size = batch.len()))]
    pub async fn write(&self, batch: &[Email]) -> Result<(), MailWriteError> {
        debug!("Dispatching mail batch");

        match self.transport.send_all(batch).await {
            BatchOutcome::Delivered => {
                debug!("Mail batch delivered");
                Ok(())
            }
            BatchOutcome::Partial(report) => self.handle_failures(batch, report),
            BatchOutcome::Failed(cause) => {
                error!(error = %cause, "Mail transport failed, nothing delivered");
                Err(MailWriteError::Transport(cause))
            }
        }
    }

    fn handle_failures(
        &self,
        batch: &[Email],
        mut report: FailureReport,
    ) -> Result<(), MailWriteError> {
        warn!(failed = report.len(), "Mail batch partially delivered");

        let submitted: HashSet<MessageId> = batch.iter().map(Email::id).collect();
        if let Some(unknown) = report.ids().find(|id| !submitted.contains(id)) {
            error!(message_id = %unknown, "Transport reported a message outside the batch");
            return Err(MailWriteError::UnknownMessage(unknown));
        }

        // Walking the batch gives submission order and handles a repeated
        // message once, since its entry is taken on first sight.
        for email in batch {
            let Some(cause) = report.take(email.id()) else {
                continue;
            };

            if let Err(e) = self.handler.handle(email, cause) {
                error!(
                    message_id = %email.id(),
                    error = %e,
                    unhandled = report.len(),
                    "Failure handler aborted mail batch"
                );
                return Err(e);
            }
            debug!(message_id = %email.id(), "Delivery failure resolved");
        }

        Ok(())
    }
}

#[async_trait]
impl ItemWriter<Email> for BatchMailWriter {
    type Error = MailWriteError;

    async fn write(&self, items: &[Email]) -> Result<(), Self::Error> {
        Self::write(self, items).await
    }
}

/// Builder for [`BatchMailWriter`]
#[derive(Default)]
pub struct BatchMailWriterBuilder {
    transport: Option<Arc<dyn MailTransport>>,
    handler: Option<Arc<dyn FailureHandler>>,
}

impl BatchMailWriterBuilder {
    /// Set the transport (required)
    #[must_use]
    pub fn transport<T: MailTransport + 'static>(self, transport: T) -> Self {
        self.shared_transport(Arc::new(transport))
    }

    /// Set a transport shared with other components (required)
    #[must_use]
    pub fn shared_transport(mut self, transport: Arc<dyn MailTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Set the failure handler (defaults to [`AbortOnFailure`])
    #[must_use]
    pub fn failure_handler<H: FailureHandler + 'static>(self, handler: H) -> Self {
        self.shared_failure_handler(Arc::new(handler))
    }

    /// Set a failure handler shared with other components
    #[must_use]
    pub fn shared_failure_handler(mut self, handler: Arc<dyn FailureHandler>) -> Self {
        self.handler = Some(handler);
        self
    }

    /// Build the writer
    ///
    /// # Errors
    ///
    /// Returns [`MailWriteError::Config`] if no transport was set
    pub fn build(self) -> Result<BatchMailWriter, MailWriteError> {
        let transport = self
            .transport
            .ok_or_else(|| MailWriteError::config("a mail transport is required"))?;
        let handler = self
            .handler
            .unwrap_or_else(|| Arc::new(AbortOnFailure));
        Ok(BatchMailWriter::from_parts(transport, handler))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::email::{EmailError, MockMailTransport};
    use crate::handler;
    use parking_lot::Mutex;
    use proptest::prelude::*;

    fn email(subject: &str) -> Email {
        Email::new()
            .to("user@example.com")
            .from("noreply@myapp.com")
            .subject(subject)
            .text("Hello")
    }

    fn ids(batch: &[Email]) -> Vec<MessageId> {
        batch.iter().map(Email::id).collect()
    }

    /// Handler that records every call and resolves it
    fn recording() -> (Arc<Mutex<Vec<(MessageId, String)>>>, impl FailureHandler) {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&calls);
        let handler = handler::from_fn(move |email: &Email, cause: EmailError| {
            sink.lock().push((email.id(), cause.to_string()));
            Ok(())
        });
        (calls, handler)
    }

    #[tokio::test]
    async fn test_full_success_dispatches_once_in_order() {
        let batch = vec![email("m1"), email("m2")];
        let expected = ids(&batch);

        let mut transport = MockMailTransport::new();
        transport
            .expect_send_all()
            .withf(move |emails| emails.iter().map(Email::id).eq(expected.iter().copied()))
            .times(1)
            .returning(|_| BatchOutcome::Delivered);

        let writer = BatchMailWriter::new(transport);
        assert!(writer.write(&batch).await.is_ok());
    }

    #[tokio::test]
    async fn test_empty_batch_still_dispatches() {
        let mut transport = MockMailTransport::new();
        transport
            .expect_send_all()
            .withf(|emails| emails.is_empty())
            .times(1)
            .returning(|_| BatchOutcome::Delivered);

        let writer = BatchMailWriter::new(transport);
        assert!(writer.write(&[]).await.is_ok());
    }

    #[tokio::test]
    async fn test_default_handler_aborts_with_cause() {
        let batch = vec![email("m1"), email("m2")];
        let failed = batch[0].id();

        let mut transport = MockMailTransport::new();
        transport.expect_send_all().times(1).returning(move |_| {
            BatchOutcome::Partial(
                FailureReport::new().with_failure(failed, EmailError::rejected("FOO")),
            )
        });

        let writer = BatchMailWriter::new(transport);
        let err = writer.write(&batch).await.unwrap_err();

        match err {
            MailWriteError::Undelivered { message_id, source } => {
                assert_eq!(message_id, failed);
                assert_eq!(source.to_string(), "FOO");
            }
            other => panic!("expected undelivered error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_custom_handler_resolves_every_failure() {
        let batch = vec![email("m1"), email("m2"), email("m3")];
        let (first, third) = (batch[0].id(), batch[2].id());

        let mut transport = MockMailTransport::new();
        transport.expect_send_all().times(1).returning(move |_| {
            BatchOutcome::Partial(
                FailureReport::new()
                    .with_failure(third, EmailError::rejected("BAR"))
                    .with_failure(first, EmailError::rejected("FOO")),
            )
        });

        let (calls, handler) = recording();
        let writer = BatchMailWriter::new(transport).with_failure_handler(handler);

        assert!(writer.write(&batch).await.is_ok());
        assert_eq!(
            *calls.lock(),
            vec![(first, "FOO".to_string()), (third, "BAR".to_string())]
        );
    }

    #[tokio::test]
    async fn test_handler_error_stops_iteration_and_propagates() {
        let batch = vec![email("m1"), email("m2"), email("m3")];
        let failed: Vec<MessageId> = ids(&batch);
        let report_ids = failed.clone();

        let mut transport = MockMailTransport::new();
        transport.expect_send_all().times(1).returning(move |_| {
            BatchOutcome::Partial(
                report_ids
                    .iter()
                    .map(|id| (*id, EmailError::rejected("FOO")))
                    .collect(),
            )
        });

        let calls = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&calls);
        let stop_at = failed[1];
        let handler = handler::from_fn(move |email: &Email, _cause: EmailError| {
            sink.lock().push(email.id());
            if email.id() == stop_at {
                Err(anyhow::anyhow!("retry queue full").into())
            } else {
                Ok(())
            }
        });

        let writer = BatchMailWriter::new(transport).with_failure_handler(handler);
        let err = writer.write(&batch).await.unwrap_err();

        assert!(matches!(err, MailWriteError::Handler(_)));
        assert_eq!(err.to_string(), "retry queue full");
        assert_eq!(*calls.lock(), vec![failed[0], failed[1]]);
    }

    #[tokio::test]
    async fn test_total_failure_skips_handler() {
        let mut transport = MockMailTransport::new();
        transport
            .expect_send_all()
            .times(1)
            .returning(|_| BatchOutcome::Failed(EmailError::smtp("connection refused")));

        let (calls, handler) = recording();
        let writer = BatchMailWriter::new(transport).with_failure_handler(handler);
        let err = writer.write(&[email("m1")]).await.unwrap_err();

        assert!(matches!(
            &err,
            MailWriteError::Transport(EmailError::SmtpError(msg)) if msg == "connection refused"
        ));
        assert!(calls.lock().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_message_in_report_aborts_before_handling() {
        let batch = vec![email("m1")];
        let known = batch[0].id();
        let stranger = MessageId::new();

        let mut transport = MockMailTransport::new();
        transport.expect_send_all().times(1).returning(move |_| {
            BatchOutcome::Partial(
                FailureReport::new()
                    .with_failure(known, EmailError::rejected("FOO"))
                    .with_failure(stranger, EmailError::rejected("BAR")),
            )
        });

        let (calls, handler) = recording();
        let writer = BatchMailWriter::new(transport).with_failure_handler(handler);
        let err = writer.write(&batch).await.unwrap_err();

        assert!(matches!(err, MailWriteError::UnknownMessage(id) if id == stranger));
        assert!(calls.lock().is_empty());
    }

    #[tokio::test]
    async fn test_repeated_message_handled_once() {
        let message = email("m1");
        let batch = vec![message.clone(), message.clone()];
        let failed = message.id();

        let mut transport = MockMailTransport::new();
        transport.expect_send_all().times(1).returning(move |_| {
            BatchOutcome::Partial(
                FailureReport::new().with_failure(failed, EmailError::rejected("FOO")),
            )
        });

        let (calls, handler) = recording();
        let writer = BatchMailWriter::new(transport).with_failure_handler(handler);

        assert!(writer.write(&batch).await.is_ok());
        assert_eq!(calls.lock().len(), 1);
    }

    #[test]
    fn test_builder_requires_transport() {
        let err = BatchMailWriter::builder().build().unwrap_err();
        assert!(matches!(err, MailWriteError::Config(_)));
    }

    #[tokio::test]
    async fn test_builder_defaults_to_abort() {
        let batch = vec![email("m1"), email("m2")];
        let failed = batch[1].id();

        let mut transport = MockMailTransport::new();
        transport.expect_send_all().times(1).returning(move |_| {
            BatchOutcome::Partial(
                FailureReport::new().with_failure(failed, EmailError::rejected("FOO")),
            )
        });

        let writer = BatchMailWriter::builder()
            .transport(transport)
            .build()
            .unwrap();

        assert!(matches!(
            writer.write(&batch).await,
            Err(MailWriteError::Undelivered { message_id, .. }) if message_id == failed
        ));
    }

    #[tokio::test]
    async fn test_item_writer_delegates() {
        let mut transport = MockMailTransport::new();
        transport
            .expect_send_all()
            .times(1)
            .returning(|_| BatchOutcome::Delivered);

        let writer = BatchMailWriter::new(transport);
        let sink: &dyn ItemWriter<Email, Error = MailWriteError> = &writer;
        assert!(sink.write(&[email("m1")]).await.is_ok());
    }

    proptest! {
        #[test]
        fn prop_resolving_handler_sees_each_failure_once_in_batch_order(
            failures in proptest::collection::vec(any::<bool>(), 0..16)
        ) {
            let batch: Vec<Email> = (0..failures.len())
                .map(|i| email(&format!("m{i}")))
                .collect();
            let expected: Vec<(MessageId, String)> = batch
                .iter()
                .zip(&failures)
                .filter(|(_, failed)| **failed)
                .map(|(email, _)| (email.id(), format!("cause for {}", email.id())))
                .collect();

            let scripted = expected.clone();
            let mut transport = MockMailTransport::new();
            transport.expect_send_all().times(1).returning(move |_| {
                BatchOutcome::from_report(
                    scripted
                        .iter()
                        .map(|(id, cause)| (*id, EmailError::rejected(cause.clone())))
                        .collect(),
                )
            });

            let (calls, handler) = recording();
            let writer = BatchMailWriter::new(transport).with_failure_handler(handler);

            let runtime = tokio::runtime::Builder::new_current_thread()
                .build()
                .unwrap();
            prop_assert!(runtime.block_on(writer.write(&batch)).is_ok());
            prop_assert_eq!(&*calls.lock(), &expected);
        }
    }
}
