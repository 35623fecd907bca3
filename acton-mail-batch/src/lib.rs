//! acton-mail-batch: batch mail writer for pipeline sink stages
//!
//! Hands a whole chunk of pre-composed emails to a mail transport in one
//! dispatch, then turns the transport's partial-failure report into one
//! decision per undelivered message.
//!
//! # Design Principles
//!
//! 1. **One dispatch per batch**: the writer never splits, retries or reorders
//! 2. **No silent loss by default**: without a configured policy the first
//!    undelivered message aborts the write
//! 3. **Explicit identity**: every [`Email`](email::Email) carries a
//!    [`MessageId`](email::MessageId) that correlates failures to messages
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use acton_mail_batch::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     acton_mail_batch::observability::init()?;
//!
//!     let writer = BatchMailWriter::builder()
//!         .transport(SmtpBackend::from_env()?)
//!         .failure_handler(LogAndContinue)
//!         .build()?;
//!
//!     let batch: Vec<Email> = ["alice@example.com", "bob@example.com"]
//!         .iter()
//!         .map(|to| {
//!             Email::new()
//!                 .to(to)
//!                 .from("noreply@myapp.com")
//!                 .subject("Maintenance window")
//!                 .text("We will be offline Sunday 02:00-03:00 UTC.")
//!         })
//!         .collect();
//!
//!     writer.write(&batch).await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod email;
pub mod error;
pub mod handler;
pub mod observability;
pub mod testing;
pub mod writer;

pub use error::MailWriteError;

pub mod prelude {
    //! Convenience re-exports for common types and traits
    //!
    //! ```rust
    //! use acton_mail_batch::prelude::*;
    //! ```

    pub use crate::config::{MailBatchConfig, TransportKind, WriterSettings};
    pub use crate::email::{
        BatchOutcome, ConsoleBackend, Email, EmailError, FailureReport, MailTransport, MessageId,
        SmtpBackend, SmtpConfig,
    };
    pub use crate::error::MailWriteError;
    pub use crate::handler::{
        AbortOnFailure, FailureHandler, FailurePolicy, FnHandler, LogAndContinue,
    };
    pub use crate::writer::{BatchMailWriter, BatchMailWriterBuilder, ItemWriter};
}
