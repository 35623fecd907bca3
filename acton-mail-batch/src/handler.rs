//! Failure handlers
//!
//! A [`FailureHandler`] decides, for one message the transport could not
//! deliver, whether the batch carries on (`Ok`) or the write aborts (`Err`).
//!
//! Built-in handlers:
//! - [`AbortOnFailure`]: the default, aborts on the first failed message
//! - [`LogAndContinue`]: logs the failure and accepts the loss
//! - [`from_fn`]: wraps a closure as a custom policy
//!
//! # Examples
//!
//! ```rust
//! use acton_mail_batch::email::{Email, EmailError};
//! use acton_mail_batch::handler::{self, FailureHandler};
//! use acton_mail_batch::MailWriteError;
//!
//! // Tolerate rejected recipients, abort on anything else
//! let policy = handler::from_fn(|email: &Email, cause: EmailError| match cause {
//!     EmailError::Rejected(_) | EmailError::InvalidAddress(_) => Ok(()),
//!     other => Err(MailWriteError::Undelivered {
//!         message_id: email.id(),
//!         source: other,
//!     }),
//! });
//!
//! let email = Email::new().to("user@example.com");
//! assert!(policy.handle(&email, EmailError::rejected("550 no such user")).is_ok());
//! assert!(policy.handle(&email, EmailError::smtp("timeout")).is_err());
//! ```

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::email::{Email, EmailError};
use crate::error::MailWriteError;

/// Policy invoked once per message the transport failed to deliver
pub trait FailureHandler: Send + Sync {
    /// Resolve (`Ok`) or re-signal (`Err`) one delivery failure
    ///
    /// # Errors
    ///
    /// Returning an error aborts the current write; the error reaches the
    /// caller unchanged and later failures in the batch are not handled.
    fn handle(&self, email: &Email, cause: EmailError) -> Result<(), MailWriteError>;
}

impl<H: FailureHandler + ?Sized> FailureHandler for Arc<H> {
    fn handle(&self, email: &Email, cause: EmailError) -> Result<(), MailWriteError> {
        (**self).handle(email, cause)
    }
}

/// Default handler: never tolerates message loss
///
/// Wraps the cause in [`MailWriteError::Undelivered`], so the write aborts on
/// the first failed message regardless of its position in the batch.
#[derive(Debug, Clone, Copy, Default)]
pub struct AbortOnFailure;

impl FailureHandler for AbortOnFailure {
    fn handle(&self, email: &Email, cause: EmailError) -> Result<(), MailWriteError> {
        Err(MailWriteError::Undelivered {
            message_id: email.id(),
            source: cause,
        })
    }
}

/// Logs every failure at `warn` and lets the batch continue
#[derive(Debug, Clone, Copy, Default)]
pub struct LogAndContinue;

impl FailureHandler for LogAndContinue {
    fn handle(&self, email: &Email, cause: EmailError) -> Result<(), MailWriteError> {
        warn!(
            message_id = %email.id(),
            to = ?email.to,
            subject = ?email.subject,
            error = %cause,
            "Message not delivered, continuing batch"
        );
        Ok(())
    }
}

/// Failure handler built from a closure, see [`from_fn`]
#[derive(Clone)]
pub struct FnHandler<F> {
    f: F,
}

impl<F> fmt::Debug for FnHandler<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnHandler").finish_non_exhaustive()
    }
}

impl<F> FailureHandler for FnHandler<F>
where
    F: Fn(&Email, EmailError) -> Result<(), MailWriteError> + Send + Sync,
{
    fn handle(&self, email: &Email, cause: EmailError) -> Result<(), MailWriteError> {
        (self.f)(email, cause)
    }
}

/// Use a closure as a failure handler
#[must_use]
pub const fn from_fn<F>(f: F) -> FnHandler<F>
where
    F: Fn(&Email, EmailError) -> Result<(), MailWriteError> + Send + Sync,
{
    FnHandler { f }
}

/// Failure policy selectable from configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Abort the write on the first undelivered message
    #[default]
    Abort,
    /// Log undelivered messages and keep going
    LogAndContinue,
}

impl FailurePolicy {
    /// The built-in handler implementing this policy
    #[must_use]
    pub fn handler(self) -> Arc<dyn FailureHandler> {
        match self {
            Self::Abort => Arc::new(AbortOnFailure),
            Self::LogAndContinue => Arc::new(LogAndContinue),
        }
    }
}
