//! Emails, transports and the per-message failure report
//!
//! This module provides:
//! - The [`Email`] message type with an explicit [`MessageId`] identity
//! - The [`MailTransport`] trait every backend implements
//! - [`BatchOutcome`], the result of one bulk dispatch, and the
//!   [`FailureReport`] it carries on partial failure
//! - SMTP and console backends
//!
//! # Examples
//!
//! ```rust,no_run
//! use acton_mail_batch::email::{BatchOutcome, Email, MailTransport, SmtpBackend};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let backend = SmtpBackend::from_env()?;
//!
//! let welcome = Email::new()
//!     .to("user@example.com")
//!     .from("noreply@myapp.com")
//!     .subject("Welcome!")
//!     .text("Welcome to our app!");
//!
//! if let BatchOutcome::Partial(report) = backend.send_all(&[welcome.clone()]).await {
//!     assert!(report.contains(welcome.id()));
//! }
//! # Ok(())
//! # }
//! ```

mod backend;
mod builder;
mod error;
mod id;
mod report;
mod sender;

pub use backend::{
    console::ConsoleBackend,
    smtp::{SmtpBackend, SmtpConfig},
};
pub use builder::Email;
pub use error::EmailError;
pub use id::MessageId;
pub use report::{BatchOutcome, FailureReport};
pub use sender::MailTransport;

#[cfg(test)]
pub use sender::MockMailTransport;
