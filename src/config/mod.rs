//! Configuration management for the mailer binary

use crate::domain::{CssOverrides, MailerOptions};
use anyhow::{Context, Result};
use std::env;
use std::fmt;

/// Application configuration
#[derive(Clone)]
pub struct Config {
    /// Backend kind (`cloud` or `smtp`)
    pub kind: String,
    /// Construction options handed to the factory
    pub mailer: MailerOptions,
    /// CSS injection overrides applied to every render
    pub css: CssOverrides,
    /// Telemetry configuration
    pub telemetry: TelemetryConfig,
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// `pretty` or `json`
    pub log_format: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_format: "pretty".to_string(),
        }
    }
}

impl TelemetryConfig {
    pub fn from_env() -> Self {
        Self {
            log_format: env::var("LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string()),
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("kind", &self.kind)
            .field("mailer", &self.mailer)
            .field("css", &self.css.keys().collect::<Vec<_>>())
            .field("telemetry", &self.telemetry)
            .finish()
    }
}

fn optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_optional<T>(key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    optional(key)
        .map(|v| v.trim().parse::<T>())
        .transpose()
        .with_context(|| format!("Invalid {}", key))
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let css = match optional("MAILER_CSS_OVERRIDES") {
            Some(raw) => serde_json::from_str::<CssOverrides>(&raw)
                .context("MAILER_CSS_OVERRIDES must be a JSON object of strings")?,
            None => CssOverrides::new(),
        };

        Ok(Self {
            kind: env::var("MAILER_KIND").context("MAILER_KIND is required")?,
            mailer: MailerOptions {
                connection_string: optional("MAILER_CONNECTION_STRING"),
                sender_address: optional("MAILER_SENDER_ADDRESS"),
                email_service: optional("SMTP_SERVICE"),
                email_username: optional("SMTP_USERNAME"),
                email_password: optional("SMTP_PASSWORD"),
                smtp_port: parse_optional("SMTP_PORT")?,
                use_tls: Some(parse_optional("SMTP_USE_TLS")?.unwrap_or(true)),
                http_timeout_secs: Some(parse_optional("MAILER_HTTP_TIMEOUT_SECS")?.unwrap_or(30)),
                poll_interval_ms: Some(parse_optional("MAILER_POLL_INTERVAL_MS")?.unwrap_or(1000)),
                max_polls: Some(parse_optional("MAILER_MAX_POLLS")?.unwrap_or(60)),
                transport: None,
            },
            css,
            telemetry: TelemetryConfig::from_env(),
        })
    }
}
