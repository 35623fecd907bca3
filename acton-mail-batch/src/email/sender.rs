//! Mail transport trait abstraction
//!
//! This module defines the core `MailTransport` trait that all email backends implement.

use async_trait::async_trait;

use super::{BatchOutcome, Email, EmailError, FailureReport};

/// Trait for delivering emails
///
/// Implemented by all email backends (SMTP, console, etc.)
///
/// # Examples
///
/// ```rust,no_run
/// use acton_mail_batch::email::{BatchOutcome, Email, MailTransport, SmtpBackend};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let transport = SmtpBackend::from_env()?;
///
/// let batch = vec![
///     Email::new()
///         .to("user@example.com")
///         .from("noreply@myapp.com")
///         .subject("Hello!")
///         .text("Hello, World!"),
/// ];
///
/// match transport.send_all(&batch).await {
///     BatchOutcome::Delivered => println!("all sent"),
///     BatchOutcome::Partial(report) => println!("{} failed", report.len()),
///     BatchOutcome::Failed(e) => return Err(e.into()),
/// }
/// # Ok(())
/// # }
/// ```
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MailTransport: Send + Sync {
    /// Send a single email
    ///
    /// # Errors
    ///
    /// Returns `EmailError` if the email cannot be sent or is invalid
    async fn send(&self, email: &Email) -> Result<(), EmailError>;

    /// Send a whole batch in one dispatch
    ///
    /// Default implementation sends emails sequentially and records each failure
    /// in the report. Backends override this when they can detect a total failure
    /// up front or send more efficiently.
    async fn send_all(&self, emails: &[Email]) -> BatchOutcome {
        let mut report = FailureReport::new();
        for email in emails {
            if let Err(cause) = self.send(email).await {
                report.insert(email.id(), cause);
            }
        }
        BatchOutcome::from_report(report)
    }
}
