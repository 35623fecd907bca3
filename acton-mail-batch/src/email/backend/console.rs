//! Console backend for development
//!
//! Logs emails instead of sending them.

use async_trait::async_trait;
use tracing::{debug, info};

use crate::email::{Email, EmailError, MailTransport};

/// Console email backend for development
///
/// Logs emails through `tracing` instead of sending them. Emails that fail
/// validation are reported as failed, so a pipeline can be exercised end to end
/// without SMTP credentials.
///
/// # Examples
///
/// ```rust
/// use acton_mail_batch::email::{BatchOutcome, ConsoleBackend, Email, MailTransport};
///
/// # async fn example() {
/// let backend = ConsoleBackend::new();
///
/// let batch = vec![
///     Email::new()
///         .to("user@example.com")
///         .from("noreply@myapp.com")
///         .subject("Hello!")
///         .text("Hello, World!"),
/// ];
///
/// assert!(matches!(backend.send_all(&batch).await, BatchOutcome::Delivered));
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct ConsoleBackend {
    /// Whether to log email content in debug mode
    verbose: bool,
}

impl ConsoleBackend {
    /// Create a new console backend
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a verbose console backend that logs full email content
    #[must_use]
    pub const fn verbose() -> Self {
        Self { verbose: true }
    }
}

#[async_trait]
impl MailTransport for ConsoleBackend {
    async fn send(&self, email: &Email) -> Result<(), EmailError> {
        email.validate()?;

        let from = email.from.as_ref().ok_or(EmailError::NoSender)?;
        let subject = email.subject.as_ref().ok_or(EmailError::NoSubject)?;

        info!(
            message_id = %email.id(),
            from = %from,
            to = ?email.to,
            cc = ?email.cc,
            bcc = ?email.bcc,
            subject = %subject,
            "Console email sent"
        );

        if self.verbose {
            debug!(
                message_id = %email.id(),
                reply_to = ?email.reply_to,
                has_html = email.html.is_some(),
                has_text = email.text.is_some(),
                headers = ?email.headers,
                "Email details"
            );

            if let Some(text) = &email.text {
                debug!(text = %text, "Email text content");
            }

            if let Some(html) = &email.html {
                debug!(html = %html, "Email HTML content");
            }
        }

        Ok(())
    }
}
