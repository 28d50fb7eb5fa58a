//! Mailer construction options and validated backend configurations

use crate::email::MailTransport;
use crate::error::{MailerError, Result};
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use url::Url;
use validator::Validate;

/// CSS injection point name -> CSS fragment
pub type CssOverrides = HashMap<String, String>;

const MISSING_CONNECTION_STRING: &str =
    "Invalid or missing 'connectionString'. Please provide a valid connection string.";
const MISSING_SENDER_ADDRESS: &str =
    "Invalid or missing 'senderAddress'. Please provide a valid sender's email address.";
const MISSING_EMAIL_SERVICE: &str = "Invalid or missing email service provided";
const MISSING_EMAIL_USERNAME: &str = "Invalid or missing email username provided";
const MISSING_EMAIL_PASSWORD: &str = "Invalid or missing email password provided";

const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;
const DEFAULT_MAX_POLLS: u32 = 60;

/// Backend selected by the factory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MailerKind {
    /// Azure Communication Services Email
    Cloud,
    /// SMTP relay through lettre
    Smtp,
}

impl MailerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cloud => "cloud",
            Self::Smtp => "smtp",
        }
    }
}

impl FromStr for MailerKind {
    type Err = MailerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cloud" | "azure" => Ok(Self::Cloud),
            "smtp" | "nodemailer" => Ok(Self::Smtp),
            _ => Err(MailerError::InvalidArgument(
                "Invalid mailing type. Use 'cloud' or 'smtp'.".to_string(),
            )),
        }
    }
}

impl fmt::Display for MailerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Loose construction options, shared by both backends.
/// Each backend picks the fields it needs and validates them eagerly.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MailerOptions {
    /// `endpoint=https://...;accesskey=...` (cloud)
    #[serde(default)]
    pub connection_string: Option<String>,
    #[serde(default)]
    pub sender_address: Option<String>,
    /// Well-known service name or relay host (smtp)
    #[serde(default)]
    pub email_service: Option<String>,
    #[serde(default)]
    pub email_username: Option<String>,
    #[serde(default)]
    pub email_password: Option<String>,
    #[serde(default)]
    pub smtp_port: Option<u16>,
    #[serde(default)]
    pub use_tls: Option<bool>,
    #[serde(default)]
    pub http_timeout_secs: Option<u64>,
    #[serde(default)]
    pub poll_interval_ms: Option<u64>,
    #[serde(default)]
    pub max_polls: Option<u32>,
    /// Replaces the SMTP relay built from the credentials above
    #[serde(skip)]
    pub transport: Option<Arc<dyn MailTransport>>,
}

impl fmt::Debug for MailerOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MailerOptions")
            .field("connection_string", &self.connection_string.as_ref().map(|_| "***"))
            .field("sender_address", &self.sender_address)
            .field("email_service", &self.email_service)
            .field("email_username", &self.email_username)
            .field("email_password", &self.email_password.as_ref().map(|_| "***"))
            .field("smtp_port", &self.smtp_port)
            .field("use_tls", &self.use_tls)
            .field("http_timeout_secs", &self.http_timeout_secs)
            .field("poll_interval_ms", &self.poll_interval_ms)
            .field("max_polls", &self.max_polls)
            .field("transport", &self.transport.as_ref().map(|_| "custom"))
            .finish()
    }
}

impl MailerOptions {
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs.unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS))
    }
}

fn required<'a>(value: &'a Option<String>, message: &str) -> Result<&'a str> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(MailerError::Configuration(message.to_string())),
    }
}

/// Like `required`, but credentials are kept byte-for-byte once they pass the blank check
fn required_secret<'a>(value: &'a Option<String>, message: &str) -> Result<&'a str> {
    required(value, message)?;
    Ok(value.as_deref().unwrap_or_default())
}

/// SMTP configuration, validated at construction
#[derive(Clone, PartialEq, Validate)]
pub struct SmtpConfig {
    /// Service name as given (e.g. "gmail" or a relay host)
    pub service: String,

    /// SMTP server host
    #[validate(length(min = 1, max = 255))]
    pub host: String,

    /// SMTP server port (typically 587 for STARTTLS, 25 for unencrypted)
    pub port: u16,

    pub username: String,

    pub password: String,

    /// Use STARTTLS
    pub use_tls: bool,

    /// From email address
    #[validate(email)]
    pub sender_address: String,
}

impl fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("service", &self.service)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"***")
            .field("use_tls", &self.use_tls)
            .field("sender_address", &self.sender_address)
            .finish()
    }
}

impl SmtpConfig {
    /// Validate options in a fixed order so the first missing field is reported
    pub fn from_options(options: &MailerOptions) -> Result<Self> {
        let service = required(&options.email_service, MISSING_EMAIL_SERVICE)?;
        let username = required_secret(&options.email_username, MISSING_EMAIL_USERNAME)?;
        let password = required_secret(&options.email_password, MISSING_EMAIL_PASSWORD)?;
        let sender_address = required(&options.sender_address, MISSING_SENDER_ADDRESS)?;

        let use_tls = options.use_tls.unwrap_or(true);
        let (host, default_port) = resolve_smtp_host(service, use_tls);

        let config = Self {
            service: service.to_string(),
            host,
            port: options.smtp_port.unwrap_or(default_port),
            username: username.to_string(),
            password: password.to_string(),
            use_tls,
            sender_address: sender_address.to_string(),
        };

        config
            .validate()
            .map_err(|e| MailerError::Configuration(format!("{} ({})", MISSING_SENDER_ADDRESS, e)))?;

        Ok(config)
    }
}

/// Map a well-known service name to its relay host, or treat the value as a host
fn resolve_smtp_host(service: &str, use_tls: bool) -> (String, u16) {
    let well_known = match service.to_ascii_lowercase().as_str() {
        "gmail" | "googlemail" => Some("smtp.gmail.com"),
        "outlook" | "hotmail" | "live" => Some("smtp-mail.outlook.com"),
        "office365" | "outlook365" => Some("smtp.office365.com"),
        "yahoo" => Some("smtp.mail.yahoo.com"),
        "icloud" => Some("smtp.mail.me.com"),
        "zoho" => Some("smtp.zoho.com"),
        "sendgrid" => Some("smtp.sendgrid.net"),
        "mailgun" => Some("smtp.mailgun.org"),
        _ => None,
    };

    let port = if use_tls { 587 } else { 25 };
    match well_known {
        Some(host) => (host.to_string(), 587),
        None => (service.to_string(), port),
    }
}

/// Azure Communication Services configuration, parsed from a connection string
#[derive(Clone, PartialEq, Validate)]
pub struct CloudConfig {
    pub endpoint: Url,

    /// Decoded HMAC key
    pub access_key: Vec<u8>,

    /// From email address (must belong to a verified domain)
    #[validate(email)]
    pub sender_address: String,

    pub http_timeout: Duration,

    pub poll_interval: Duration,

    pub max_polls: u32,
}

impl fmt::Debug for CloudConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CloudConfig")
            .field("endpoint", &self.endpoint.as_str())
            .field("access_key", &"***")
            .field("sender_address", &self.sender_address)
            .field("http_timeout", &self.http_timeout)
            .field("poll_interval", &self.poll_interval)
            .field("max_polls", &self.max_polls)
            .finish()
    }
}

impl CloudConfig {
    pub fn from_options(options: &MailerOptions) -> Result<Self> {
        let connection_string = required(&options.connection_string, MISSING_CONNECTION_STRING)?;
        let sender_address = required(&options.sender_address, MISSING_SENDER_ADDRESS)?;

        let (endpoint, access_key) = parse_connection_string(connection_string)?;

        let config = Self {
            endpoint,
            access_key,
            sender_address: sender_address.to_string(),
            http_timeout: options.http_timeout(),
            poll_interval: Duration::from_millis(
                options.poll_interval_ms.unwrap_or(DEFAULT_POLL_INTERVAL_MS),
            ),
            max_polls: options.max_polls.unwrap_or(DEFAULT_MAX_POLLS).max(1),
        };

        config
            .validate()
            .map_err(|e| MailerError::Configuration(format!("{} ({})", MISSING_SENDER_ADDRESS, e)))?;

        Ok(config)
    }
}

/// Split `endpoint=...;accesskey=...` into a base URL and the decoded key
fn parse_connection_string(connection_string: &str) -> Result<(Url, Vec<u8>)> {
    let mut endpoint = None;
    let mut access_key = None;

    for part in connection_string.split(';').map(str::trim).filter(|p| !p.is_empty()) {
        let Some((key, value)) = part.split_once('=') else {
            continue;
        };
        match key.trim().to_ascii_lowercase().as_str() {
            "endpoint" => endpoint = Some(value.trim()),
            "accesskey" => access_key = Some(value.trim()),
            _ => {}
        }
    }

    let endpoint = endpoint.filter(|e| !e.is_empty()).ok_or_else(|| {
        MailerError::Configuration("Invalid 'connectionString': missing endpoint".to_string())
    })?;
    let access_key = access_key.filter(|k| !k.is_empty()).ok_or_else(|| {
        MailerError::Configuration("Invalid 'connectionString': missing accesskey".to_string())
    })?;

    let endpoint = Url::parse(endpoint).map_err(|e| {
        MailerError::Configuration(format!("Invalid 'connectionString' endpoint: {}", e))
    })?;
    if !matches!(endpoint.scheme(), "http" | "https") {
        return Err(MailerError::Configuration(
            "Invalid 'connectionString' endpoint: expected an http(s) URL".to_string(),
        ));
    }

    let access_key = base64::engine::general_purpose::STANDARD
        .decode(access_key)
        .map_err(|e| {
            MailerError::Configuration(format!("Invalid 'connectionString' accesskey: {}", e))
        })?;

    Ok((endpoint, access_key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn smtp_options() -> MailerOptions {
        MailerOptions {
            email_service: Some("gmail".to_string()),
            email_username: Some("username".to_string()),
            email_password: Some("password".to_string()),
            sender_address: Some("sender@example.com".to_string()),
            ..Default::default()
        }
    }

    fn cloud_options() -> MailerOptions {
        MailerOptions {
            connection_string: Some(
                "endpoint=https://acme.communication.azure.com/;accesskey=c2VjcmV0LWtleQ=="
                    .to_string(),
            ),
            sender_address: Some("DoNotReply@acme.example".to_string()),
            ..Default::default()
        }
    }

    #[rstest]
    #[case("cloud", MailerKind::Cloud)]
    #[case("azure", MailerKind::Cloud)]
    #[case("SMTP", MailerKind::Smtp)]
    #[case("nodemailer", MailerKind::Smtp)]
    fn test_mailer_kind_parse(#[case] input: &str, #[case] expected: MailerKind) {
        assert_eq!(input.parse::<MailerKind>().unwrap(), expected);
    }

    #[test]
    fn test_mailer_kind_invalid() {
        let err = "sendmail".parse::<MailerKind>().unwrap_err();
        assert!(matches!(err, MailerError::InvalidArgument(_)));
        assert!(err.to_string().contains("Use 'cloud' or 'smtp'"));
    }

    #[test]
    fn test_smtp_config_well_known_service() {
        let config = SmtpConfig::from_options(&smtp_options()).unwrap();
        assert_eq!(config.host, "smtp.gmail.com");
        assert_eq!(config.port, 587);
        assert!(config.use_tls);
    }

    #[test]
    fn test_smtp_config_custom_host() {
        let options = MailerOptions {
            email_service: Some("mail.internal".to_string()),
            use_tls: Some(false),
            ..smtp_options()
        };
        let config = SmtpConfig::from_options(&options).unwrap();
        assert_eq!(config.host, "mail.internal");
        assert_eq!(config.port, 25);

        let options = MailerOptions {
            smtp_port: Some(2525),
            ..options
        };
        assert_eq!(SmtpConfig::from_options(&options).unwrap().port, 2525);
    }

    #[rstest]
    #[case(MailerOptions { email_service: None, ..smtp_options() }, "Invalid or missing email service provided")]
    #[case(MailerOptions { email_username: Some(String::new()), ..smtp_options() }, "Invalid or missing email username provided")]
    #[case(MailerOptions { email_password: None, ..smtp_options() }, "Invalid or missing email password provided")]
    #[case(MailerOptions { sender_address: Some("  ".to_string()), ..smtp_options() }, "Invalid or missing 'senderAddress'. Please provide a valid sender's email address.")]
    fn test_smtp_config_missing_field(#[case] options: MailerOptions, #[case] message: &str) {
        let err = SmtpConfig::from_options(&options).unwrap_err();
        assert!(matches!(err, MailerError::Configuration(_)));
        assert_eq!(err.to_string(), message);
    }

    #[test]
    fn test_smtp_config_keeps_credential_whitespace() {
        let options = MailerOptions {
            email_username: Some(" user@example.com".to_string()),
            email_password: Some(" pass word ".to_string()),
            ..smtp_options()
        };
        let config = SmtpConfig::from_options(&options).unwrap();
        assert_eq!(config.username, " user@example.com");
        assert_eq!(config.password, " pass word ");

        let blank = MailerOptions {
            email_password: Some("   ".to_string()),
            ..smtp_options()
        };
        assert_eq!(
            SmtpConfig::from_options(&blank).unwrap_err().to_string(),
            "Invalid or missing email password provided"
        );
    }

    #[test]
    fn test_smtp_config_reports_first_missing_field() {
        let options = MailerOptions {
            email_service: Some("gmail".to_string()),
            ..Default::default()
        };
        let err = SmtpConfig::from_options(&options).unwrap_err();
        assert_eq!(err.to_string(), "Invalid or missing email username provided");
    }

    #[test]
    fn test_smtp_config_invalid_sender() {
        let options = MailerOptions {
            sender_address: Some("not-an-email".to_string()),
            ..smtp_options()
        };
        let err = SmtpConfig::from_options(&options).unwrap_err();
        assert!(err.to_string().contains("senderAddress"));
    }

    #[test]
    fn test_smtp_config_debug_masks_password() {
        let config = SmtpConfig::from_options(&smtp_options()).unwrap();
        let debug = format!("{:?}", config);
        assert!(!debug.contains("\"password\""));
        assert!(debug.contains("***"));
    }

    #[test]
    fn test_cloud_config_from_options() {
        let config = CloudConfig::from_options(&cloud_options()).unwrap();
        assert_eq!(config.endpoint.as_str(), "https://acme.communication.azure.com/");
        assert_eq!(config.access_key, b"secret-key".to_vec());
        assert_eq!(config.max_polls, 60);
        assert_eq!(config.poll_interval, Duration::from_millis(1000));
        assert_eq!(config.http_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_cloud_config_key_order_and_case() {
        let options = MailerOptions {
            connection_string: Some(
                "AccessKey=c2VjcmV0LWtleQ==; Endpoint=https://acme.communication.azure.com"
                    .to_string(),
            ),
            ..cloud_options()
        };
        let config = CloudConfig::from_options(&options).unwrap();
        assert_eq!(config.endpoint.host_str(), Some("acme.communication.azure.com"));
    }

    #[rstest]
    #[case(None, "Invalid or missing 'connectionString'")]
    #[case(Some(""), "Invalid or missing 'connectionString'")]
    #[case(Some("accesskey=c2VjcmV0"), "missing endpoint")]
    #[case(Some("endpoint=https://acme.example/"), "missing accesskey")]
    #[case(Some("endpoint=not a url;accesskey=c2VjcmV0"), "endpoint")]
    #[case(Some("endpoint=https://acme.example/;accesskey=***"), "accesskey")]
    fn test_cloud_config_invalid_connection_string(
        #[case] connection_string: Option<&str>,
        #[case] message: &str,
    ) {
        let options = MailerOptions {
            connection_string: connection_string.map(str::to_string),
            ..cloud_options()
        };
        let err = CloudConfig::from_options(&options).unwrap_err();
        assert!(matches!(err, MailerError::Configuration(_)));
        assert!(err.to_string().contains(message), "{}", err);
    }

    #[test]
    fn test_cloud_config_missing_sender() {
        let options = MailerOptions {
            sender_address: None,
            ..cloud_options()
        };
        let err = CloudConfig::from_options(&options).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid or missing 'senderAddress'. Please provide a valid sender's email address."
        );
    }

    #[test]
    fn test_mailer_options_debug_masks_secrets() {
        let debug = format!("{:?}", MailerOptions { ..smtp_options() });
        assert!(!debug.contains("password\")"));
        assert!(!debug.contains("Some(\"password\")"));

        let debug = format!("{:?}", cloud_options());
        assert!(!debug.contains("c2VjcmV0LWtleQ"));
    }

    #[test]
    fn test_mailer_options_deserialization() {
        let json = r#"{
            "emailService": "gmail",
            "emailUsername": "user",
            "emailPassword": "pass",
            "senderAddress": "sender@example.com",
            "smtpPort": 465
        }"#;
        let options: MailerOptions = serde_json::from_str(json).unwrap();
        assert_eq!(options.smtp_port, Some(465));
        assert!(options.transport.is_none());
        assert!(SmtpConfig::from_options(&options).is_ok());
    }
}
