//! SMTP backend for sending emails
//!
//! Uses the `lettre` crate to send emails via SMTP servers.

use async_trait::async_trait;
use lettre::{
    message::{
        header::{self, HeaderName, HeaderValue},
        Mailbox, MultiPart, SinglePart,
    },
    transport::smtp::{
        authentication::Credentials,
        client::{Tls, TlsParameters},
    },
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::email::{BatchOutcome, Email, EmailError, FailureReport, MailTransport};

/// SMTP email backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmtpConfig {
    /// SMTP server hostname
    pub host: String,

    /// SMTP server port (usually 587 for STARTTLS, 465 for TLS)
    #[serde(default = "default_port")]
    pub port: u16,

    /// SMTP username
    pub username: String,

    /// SMTP password
    pub password: String,

    /// Use STARTTLS (default: true)
    #[serde(default = "default_use_tls")]
    pub use_tls: bool,
}

const fn default_port() -> u16 {
    587
}

const fn default_use_tls() -> bool {
    true
}

impl SmtpConfig {
    /// Create SMTP configuration from environment variables
    ///
    /// Expects the following environment variables:
    /// - `SMTP_HOST`: SMTP server hostname
    /// - `SMTP_PORT`: SMTP server port (default: 587)
    /// - `SMTP_USERNAME`: SMTP username
    /// - `SMTP_PASSWORD`: SMTP password
    /// - `SMTP_USE_TLS`: Use TLS (default: true)
    ///
    /// # Errors
    ///
    /// Returns `EmailError::ConfigError` if required environment variables are missing
    pub fn from_env() -> Result<Self, EmailError> {
        let host = std::env::var("SMTP_HOST")
            .map_err(|_| EmailError::config("SMTP_HOST environment variable not set"))?;

        let port = match std::env::var("SMTP_PORT") {
            Ok(port) => port
                .parse()
                .map_err(|_| EmailError::config("SMTP_PORT must be a valid port number"))?,
            Err(_) => default_port(),
        };

        let username = std::env::var("SMTP_USERNAME")
            .map_err(|_| EmailError::config("SMTP_USERNAME environment variable not set"))?;

        let password = std::env::var("SMTP_PASSWORD")
            .map_err(|_| EmailError::config("SMTP_PASSWORD environment variable not set"))?;

        let use_tls = std::env::var("SMTP_USE_TLS")
            .ok()
            .and_then(|value| value.parse().ok())
            .unwrap_or_else(default_use_tls);

        Ok(Self {
            host,
            port,
            username,
            password,
            use_tls,
        })
    }
}

/// SMTP email backend
///
/// Opens one SMTP transport per dispatch. Before sending a batch the connection
/// is probed; if the server cannot be reached the whole batch fails with
/// [`BatchOutcome::Failed`] and nothing is sent. Otherwise every message is
/// attempted and individual failures (bad addresses, rejected recipients) are
/// collected into the report.
pub struct SmtpBackend {
    config: SmtpConfig,
}

impl SmtpBackend {
    /// Create a new SMTP backend with the given configuration
    #[must_use]
    pub const fn new(config: SmtpConfig) -> Self {
        Self { config }
    }

    /// Create a new SMTP backend from environment variables
    ///
    /// # Errors
    ///
    /// Returns `EmailError::ConfigError` if required environment variables are missing
    pub fn from_env() -> Result<Self, EmailError> {
        let config = SmtpConfig::from_env()?;
        Ok(Self::new(config))
    }

    /// The configuration this backend connects with
    #[must_use]
    pub const fn config(&self) -> &SmtpConfig {
        &self.config
    }

    fn parse_mailbox(address: &str) -> Result<Mailbox, EmailError> {
        address
            .parse()
            .map_err(|_| EmailError::InvalidAddress(address.to_string()))
    }

    /// Build lettre Message from Email
    fn build_message(email: &Email) -> Result<Message, EmailError> {
        email.validate()?;

        let from_addr = email.from.as_ref().ok_or(EmailError::NoSender)?;
        let mut builder = Message::builder().from(Self::parse_mailbox(from_addr)?);

        for to_addr in &email.to {
            builder = builder.to(Self::parse_mailbox(to_addr)?);
        }
        for cc_addr in &email.cc {
            builder = builder.cc(Self::parse_mailbox(cc_addr)?);
        }
        for bcc_addr in &email.bcc {
            builder = builder.bcc(Self::parse_mailbox(bcc_addr)?);
        }
        if let Some(reply_to_addr) = &email.reply_to {
            builder = builder.reply_to(Self::parse_mailbox(reply_to_addr)?);
        }

        let subject = email.subject.as_ref().ok_or(EmailError::NoSubject)?;
        builder = builder.subject(subject);

        for (name, value) in &email.headers {
            let header_name = HeaderName::new_from_ascii(name.clone())
                .map_err(|_| EmailError::InvalidHeader(name.clone()))?;
            builder = builder.raw_header(HeaderValue::new(header_name, value.clone()));
        }

        let message = match (&email.html, &email.text) {
            (Some(html), Some(text)) => builder.multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(header::ContentType::TEXT_PLAIN)
                            .body(text.clone()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(header::ContentType::TEXT_HTML)
                            .body(html.clone()),
                    ),
            ),
            (Some(html), None) => builder
                .header(header::ContentType::TEXT_HTML)
                .body(html.clone()),
            (None, Some(text)) => builder
                .header(header::ContentType::TEXT_PLAIN)
                .body(text.clone()),
            (None, None) => return Err(EmailError::NoContent),
        };

        message.map_err(|e| EmailError::smtp(e.to_string()))
    }

    /// Create SMTP transport from config
    fn create_transport(&self) -> Result<AsyncSmtpTransport<Tokio1Executor>, EmailError> {
        let credentials = Credentials::new(
            self.config.username.clone(),
            self.config.password.clone(),
        );

        let mut transport = if self.config.use_tls {
            let tls_parameters = TlsParameters::new(self.config.host.clone())
                .map_err(|e| EmailError::smtp(format!("TLS parameters error: {e}")))?;

            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.config.host)
                .map_err(|e| EmailError::smtp(e.to_string()))?
                .credentials(credentials)
                .tls(Tls::Required(tls_parameters))
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&self.config.host)
                .credentials(credentials)
        };

        transport = transport.port(self.config.port);

        Ok(transport.build())
    }

    async fn deliver(
        transport: &AsyncSmtpTransport<Tokio1Executor>,
        email: &Email,
    ) -> Result<(), EmailError> {
        let message = Self::build_message(email)?;
        transport
            .send(message)
            .await
            .map_err(|e| EmailError::smtp(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl MailTransport for SmtpBackend {
    async fn send(&self, email: &Email) -> Result<(), EmailError> {
        let transport = self.create_transport()?;
        Self::deliver(&transport, email).await
    }

    async fn send_all(&self, emails: &[Email]) -> BatchOutcome {
        if emails.is_empty() {
            return BatchOutcome::Delivered;
        }

        let transport = match self.create_transport() {
            Ok(transport) => transport,
            Err(e) => return BatchOutcome::Failed(e),
        };

        match transport.test_connection().await {
            Ok(true) => {}
            Ok(false) => {
                return BatchOutcome::Failed(EmailError::smtp(format!(
                    "server {}:{} refused the connection",
                    self.config.host, self.config.port
                )))
            }
            Err(e) => return BatchOutcome::Failed(EmailError::smtp(e.to_string())),
        }

        let mut report = FailureReport::new();
        for email in emails {
            match Self::deliver(&transport, email).await {
                Ok(()) => debug!(message_id = %email.id(), "SMTP message accepted"),
                Err(cause) => {
                    warn!(message_id = %email.id(), error = %cause, "SMTP message not delivered");
                    report.insert(email.id(), cause);
                }
            }
        }

        BatchOutcome::from_report(report)
    }
}
