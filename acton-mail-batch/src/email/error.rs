//! Email error types

use thiserror::Error;

/// Errors that can occur for a single email
///
/// This is the cause carried by a [`FailureReport`](super::FailureReport) entry
/// and by a total transport failure.
#[derive(Debug, Error)]
pub enum EmailError {
    /// Email has no recipients
    #[error("email must have at least one recipient")]
    NoRecipients,

    /// Email has no sender
    #[error("email must have a from address")]
    NoSender,

    /// Email has no subject
    #[error("email must have a subject")]
    NoSubject,

    /// Email has no body content
    #[error("email must have either text or HTML content")]
    NoContent,

    /// Invalid email address format
    #[error("invalid email address: {0}")]
    InvalidAddress(String),

    /// The transport accepted the batch but refused this message
    #[error("{0}")]
    Rejected(String),

    /// SMTP transport error
    #[error("SMTP error: {0}")]
    SmtpError(String),

    /// Custom header name that cannot be sent
    #[error("invalid header name: {0}")]
    InvalidHeader(String),

    /// Email configuration error
    #[error("email configuration error: {0}")]
    ConfigError(String),
}

impl EmailError {
    /// Create a rejection from the transport's description of the failure
    #[must_use]
    pub fn rejected<T: Into<String>>(msg: T) -> Self {
        Self::Rejected(msg.into())
    }

    /// Create an SMTP error from a string message
    #[must_use]
    pub fn smtp<T: Into<String>>(msg: T) -> Self {
        Self::SmtpError(msg.into())
    }

    /// Create a configuration error from a string message
    #[must_use]
    pub fn config<T: Into<String>>(msg: T) -> Self {
        Self::ConfigError(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejected_displays_raw_cause() {
        assert_eq!(EmailError::rejected("FOO").to_string(), "FOO");
    }

    #[test]
    fn test_smtp_error_display() {
        let err = EmailError::smtp("connection refused");
        assert_eq!(err.to_string(), "SMTP error: connection refused");
    }

    #[test]
    fn test_invalid_header_display() {
        let err = EmailError::InvalidHeader("Bad Header:".to_string());
        assert_eq!(err.to_string(), "invalid header name: Bad Header:");
    }
}
