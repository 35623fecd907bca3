//! Email builder with fluent API
//!
//! Provides a convenient builder pattern for constructing emails.

use serde::{Deserialize, Serialize};

use super::{EmailError, MessageId};

/// An email message
///
/// Emails reach the batch writer fully formed; the writer never looks at their
/// content, only at their [`MessageId`].
///
/// ```rust
/// use acton_mail_batch::email::Email;
///
/// let email = Email::new()
///     .to("user@example.com")
///     .from("noreply@myapp.com")
///     .subject("Welcome!")
///     .text("Welcome to our app!")
///     .html("<h1>Welcome to our app!</h1>");
///
/// assert!(email.validate().is_ok());
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Email {
    /// Identity used to correlate transport failures
    #[serde(default)]
    id: MessageId,

    /// Email recipients (To)
    #[serde(default)]
    pub to: Vec<String>,

    /// Email sender (From)
    pub from: Option<String>,

    /// Reply-To address
    pub reply_to: Option<String>,

    /// CC recipients
    #[serde(default)]
    pub cc: Vec<String>,

    /// BCC recipients
    #[serde(default)]
    pub bcc: Vec<String>,

    /// Email subject
    pub subject: Option<String>,

    /// Plain text body
    pub text: Option<String>,

    /// HTML body
    pub html: Option<String>,

    /// Custom headers
    #[serde(default)]
    pub headers: Vec<(String, String)>,
}

impl Email {
    /// Create a new empty email with a fresh identity
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The identity of this email
    ///
    /// Clones share the id of the email they were cloned from.
    #[must_use]
    pub const fn id(&self) -> MessageId {
        self.id
    }

    /// Add a recipient (To)
    #[must_use]
    pub fn to(mut self, address: &str) -> Self {
        self.to.push(address.to_string());
        self
    }

    /// Add multiple recipients (To)
    ///
    /// # Examples
    ///
    /// ```rust
    /// use acton_mail_batch::email::Email;
    ///
    /// let email = Email::new()
    ///     .to_multiple(&["user1@example.com", "user2@example.com"]);
    /// assert_eq!(email.to.len(), 2);
    /// ```
    #[must_use]
    pub fn to_multiple(mut self, addresses: &[&str]) -> Self {
        for address in addresses {
            self.to.push((*address).to_string());
        }
        self
    }

    /// Set the sender (From)
    #[must_use]
    pub fn from(mut self, address: &str) -> Self {
        self.from = Some(address.to_string());
        self
    }

    /// Set the reply-to address
    #[must_use]
    pub fn reply_to(mut self, address: &str) -> Self {
        self.reply_to = Some(address.to_string());
        self
    }

    /// Add a CC recipient
    #[must_use]
    pub fn cc(mut self, address: &str) -> Self {
        self.cc.push(address.to_string());
        self
    }

    /// Add a BCC recipient
    #[must_use]
    pub fn bcc(mut self, address: &str) -> Self {
        self.bcc.push(address.to_string());
        self
    }

    /// Set the email subject
    #[must_use]
    pub fn subject(mut self, subject: &str) -> Self {
        self.subject = Some(subject.to_string());
        self
    }

    /// Set the plain text body
    #[must_use]
    pub fn text(mut self, body: &str) -> Self {
        self.text = Some(body.to_string());
        self
    }

    /// Set the HTML body
    #[must_use]
    pub fn html(mut self, body: &str) -> Self {
        self.html = Some(body.to_string());
        self
    }

    /// Add a custom header
    ///
    /// The SMTP backend forwards headers as-is; a name that is not a valid
    /// header name fails that message with `EmailError::InvalidHeader`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use acton_mail_batch::email::Email;
    ///
    /// let email = Email::new()
    ///     .header("X-Priority", "1");
    /// assert_eq!(email.headers.len(), 1);
    /// ```
    #[must_use]
    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    /// Validate the email
    ///
    /// Checks that all required fields are present
    ///
    /// # Errors
    ///
    /// Returns errors if:
    /// - No recipients
    /// - No sender
    /// - No subject
    /// - No content (text or HTML)
    pub fn validate(&self) -> Result<(), EmailError> {
        if self.to.is_empty() && self.cc.is_empty() && self.bcc.is_empty() {
            return Err(EmailError::NoRecipients);
        }

        if self.from.is_none() {
            return Err(EmailError::NoSender);
        }

        if self.subject.is_none() {
            return Err(EmailError::NoSubject);
        }

        if self.text.is_none() && self.html.is_none() {
            return Err(EmailError::NoContent);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_builder() {
        let email = Email::new()
            .to("user@example.com")
            .from("noreply@myapp.com")
            .subject("Test")
            .text("Hello, World!");

        assert_eq!(email.to, vec!["user@example.com"]);
        assert_eq!(email.from, Some("noreply@myapp.com".to_string()));
        assert_eq!(email.subject, Some("Test".to_string()));
        assert_eq!(email.text, Some("Hello, World!".to_string()));
    }

    #[test]
    fn test_clone_keeps_identity() {
        let email = Email::new().to("user@example.com");
        let copy = email.clone();

        assert_eq!(email.id(), copy.id());
    }

    #[test]
    fn test_identical_content_has_distinct_identity() {
        let first = Email::new().to("user@example.com").subject("Same");
        let second = Email::new().to("user@example.com").subject("Same");

        assert_ne!(first.id(), second.id());
    }

    #[test]
    fn test_identity_survives_serialization() {
        let email = Email::new()
            .to("user@example.com")
            .from("noreply@myapp.com")
            .subject("Test")
            .text("Hello");

        let json = serde_json::to_string(&email).unwrap();
        let restored: Email = serde_json::from_str(&json).unwrap();

        assert_eq!(restored.id(), email.id());
        assert_eq!(restored.to, email.to);
    }

    #[test]
    fn test_missing_id_gets_fresh_identity() {
        let restored: Email =
            serde_json::from_str(r#"{"to":["user@example.com"],"subject":"Hi"}"#).unwrap();

        assert_eq!(restored.to, vec!["user@example.com"]);
        assert_eq!(restored.subject.as_deref(), Some("Hi"));
    }

    #[test]
    fn test_email_validation_no_recipients() {
        let email = Email::new()
            .from("noreply@myapp.com")
            .subject("Test")
            .text("Hello");

        assert!(matches!(email.validate(), Err(EmailError::NoRecipients)));
    }

    #[test]
    fn test_email_validation_no_sender() {
        let email = Email::new()
            .to("user@example.com")
            .subject("Test")
            .text("Hello");

        assert!(matches!(email.validate(), Err(EmailError::NoSender)));
    }

    #[test]
    fn test_email_validation_no_subject() {
        let email = Email::new()
            .to("user@example.com")
            .from("noreply@myapp.com")
            .text("Hello");

        assert!(matches!(email.validate(), Err(EmailError::NoSubject)));
    }

    #[test]
    fn test_email_validation_no_content() {
        let email = Email::new()
            .to("user@example.com")
            .from("noreply@myapp.com")
            .subject("Test");

        assert!(matches!(email.validate(), Err(EmailError::NoContent)));
    }

    #[test]
    fn test_bcc_only_counts_as_recipient() {
        let email = Email::new()
            .bcc("admin@example.com")
            .from("noreply@myapp.com")
            .subject("Test")
            .html("<p>Hello</p>");

        assert!(email.validate().is_ok());
    }
}
