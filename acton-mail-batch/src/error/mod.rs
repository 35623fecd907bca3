//! Error types returned by the batch writer

use thiserror::Error;

use crate::email::{EmailError, MessageId};

/// Why a [`BatchMailWriter::write`](crate::writer::BatchMailWriter::write) call aborted
#[derive(Debug, Error)]
pub enum MailWriteError {
    /// The transport could not attempt delivery of the batch
    #[error("mail transport failed: {0}")]
    Transport(#[source] EmailError),

    /// A message could not be delivered and no handler resolved it
    #[error("failed to deliver message {message_id}: {source}")]
    Undelivered {
        /// The message that was not delivered
        message_id: MessageId,
        /// The cause reported by the transport
        #[source]
        source: EmailError,
    },

    /// The transport reported a failure for a message that was never submitted
    #[error("transport reported a failure for unknown message {0}")]
    UnknownMessage(MessageId),

    /// Writer configuration is incomplete
    #[error("mail writer configuration error: {0}")]
    Config(String),

    /// Error raised by a caller-supplied failure handler
    #[error(transparent)]
    Handler(#[from] anyhow::Error),
}

impl MailWriteError {
    /// Create a configuration error from a string message
    #[must_use]
    pub fn config<T: Into<String>>(msg: T) -> Self {
        Self::Config(msg.into())
    }

    /// The transport cause behind this error, if there is one
    #[must_use]
    pub const fn email_error(&self) -> Option<&EmailError> {
        match self {
            Self::Transport(source) | Self::Undelivered { source, .. } => Some(source),
            _ => None,
        }
    }
}
