//! Configuration management for acton-mail-batch
//!
//! Configuration is loaded from multiple sources with clear precedence:
//!
//! 1. Environment variables (highest priority, `ACTON_` prefix, `__` for nesting)
//! 2. `./config.toml` (development)
//! 3. `~/.config/acton-mail-batch/{service}/config.toml` (user config, XDG)
//! 4. `/etc/acton-mail-batch/{service}/config.toml` (system config)
//! 5. Hardcoded defaults (fallback)
//!
//! Environment variable format: `ACTON_SECTION__FIELD_NAME`, for example
//! `ACTON_WRITER__FAILURE_POLICY=log_and_continue`.
//!
//! # Example Configuration
//!
//! ```toml
//! # config.toml
//! [writer]
//! transport = "smtp"
//! failure_policy = "log_and_continue"
//!
//! [smtp]
//! host = "smtp.example.com"
//! port = 587
//! username = "mailer"
//! password = "secret"
//! use_tls = true
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use acton_mail_batch::config::MailBatchConfig;
//!
//! # fn example() -> anyhow::Result<()> {
//! let config = MailBatchConfig::load_for_service("newsletter")?;
//! let _writer = config.build_writer()?;
//! # Ok(())
//! # }
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::email::{ConsoleBackend, MailTransport, SmtpBackend, SmtpConfig};
use crate::error::MailWriteError;
use crate::handler::FailurePolicy;
use crate::writer::BatchMailWriter;

/// Which backend delivers batches
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// Log emails instead of sending them
    #[default]
    Console,
    /// Send through the `[smtp]` server
    Smtp,
}

/// Batch writer settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WriterSettings {
    /// Backend used for delivery
    pub transport: TransportKind,

    /// What to do with messages the transport could not deliver
    pub failure_policy: FailurePolicy,
}

/// Complete acton-mail-batch configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MailBatchConfig {
    /// Writer settings
    #[serde(default)]
    pub writer: WriterSettings,

    /// SMTP server, required when `writer.transport = "smtp"`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub smtp: Option<SmtpConfig>,
}

impl MailBatchConfig {
    /// Load configuration for a specific service
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Default configuration cannot be serialized to TOML
    /// - A configuration file cannot be read or parsed
    /// - Configuration values fail type conversion
    pub fn load_for_service(service_name: &str) -> anyhow::Result<Self> {
        let mut figment = Figment::new()
            // 5. Defaults (lowest priority)
            .merge(Toml::string(&toml::to_string(&Self::default())?));

        // 4. System config
        let system_config = PathBuf::from("/etc/acton-mail-batch")
            .join(service_name)
            .join("config.toml");
        if system_config.exists() {
            figment = figment.merge(Toml::file(&system_config));
        }

        // 3. User config
        let user_config = Self::recommended_path(service_name);
        if user_config.exists() {
            figment = figment.merge(Toml::file(&user_config));
        }

        // 2. Local config
        let local_config = PathBuf::from("./config.toml");
        if local_config.exists() {
            figment = figment.merge(Toml::file(&local_config));
        }

        // 1. Environment variables
        figment = figment.merge(Env::prefixed("ACTON_").split("__").lowercase(true));

        let config = figment.extract()?;
        Ok(config)
    }

    /// Load configuration from a specific file
    ///
    /// A missing file leaves the defaults in place; environment variables still
    /// override both.
    ///
    /// # Errors
    ///
    /// Returns an error if the file contains invalid TOML or values of the wrong type
    pub fn load_from(path: &str) -> anyhow::Result<Self> {
        let config = Figment::new()
            .merge(Toml::string(&toml::to_string(&Self::default())?))
            .merge(Toml::file(path))
            .merge(Env::prefixed("ACTON_").split("__").lowercase(true))
            .extract()?;

        Ok(config)
    }

    /// Get the recommended XDG config path for a service
    ///
    /// ```rust
    /// use acton_mail_batch::config::MailBatchConfig;
    ///
    /// let path = MailBatchConfig::recommended_path("newsletter");
    /// assert!(path.ends_with("config.toml"));
    /// ```
    #[must_use]
    pub fn recommended_path(service_name: &str) -> PathBuf {
        dirs::config_dir().map_or_else(
            || PathBuf::from("./config.toml"),
            |config_dir| {
                config_dir
                    .join("acton-mail-batch")
                    .join(service_name)
                    .join("config.toml")
            },
        )
    }

    /// Build the configured transport
    ///
    /// # Errors
    ///
    /// Returns [`MailWriteError::Config`] if the SMTP transport is selected
    /// without an `[smtp]` section
    pub fn transport(&self) -> Result<Arc<dyn MailTransport>, MailWriteError> {
        match self.writer.transport {
            TransportKind::Console => Ok(Arc::new(ConsoleBackend::new())),
            TransportKind::Smtp => {
                let smtp = self.smtp.clone().ok_or_else(|| {
                    MailWriteError::config("transport is \"smtp\" but no [smtp] section is set")
                })?;
                Ok(Arc::new(SmtpBackend::new(smtp)))
            }
        }
    }

    /// Build a writer with the configured transport and failure policy
    ///
    /// # Errors
    ///
    /// Returns [`MailWriteError::Config`] if the transport cannot be built
    pub fn build_writer(&self) -> Result<BatchMailWriter, MailWriteError> {
        BatchMailWriter::builder()
            .shared_transport(self.transport()?)
            .shared_failure_handler(self.writer.failure_policy.handler())
            .build()
    }
}
