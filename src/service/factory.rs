//! Mailer construction by backend kind

use super::Mailer;
use crate::domain::{CloudConfig, CssOverrides, MailerKind, MailerOptions, SmtpConfig};
use crate::email::{CloudEmailProvider, EmailProvider, SmtpEmailProvider};
use crate::error::{MailerError, Result};
use std::sync::Arc;

/// Build a mailer for `kind` (`"cloud"` or `"smtp"`).
///
/// Options are validated eagerly; no network I/O happens here.
pub fn create_mailer(kind: &str, options: &MailerOptions, css: CssOverrides) -> Result<Mailer> {
    let kind: MailerKind = kind.parse()?;
    let provider = create_provider(kind, options)?;

    tracing::debug!(kind = %kind, provider = provider.provider_name(), "Mailer created");

    Ok(Mailer::new(provider, css))
}

/// Build the delivery backend for an already parsed kind
pub fn create_provider(kind: MailerKind, options: &MailerOptions) -> Result<Arc<dyn EmailProvider>> {
    match kind {
        MailerKind::Cloud => {
            let config = CloudConfig::from_options(options)?;
            let provider = CloudEmailProvider::from_config(&config)?;
            Ok(Arc::new(provider))
        }
        MailerKind::Smtp => {
            let config = SmtpConfig::from_options(options)?;
            let http_client = reqwest::Client::builder()
                .timeout(options.http_timeout())
                .build()
                .map_err(|e| {
                    MailerError::Configuration(format!("Failed to create HTTP client: {}", e))
                })?;

            let provider = match &options.transport {
                Some(transport) => {
                    SmtpEmailProvider::with_transport(&config, transport.clone(), http_client)?
                }
                None => SmtpEmailProvider::from_config(&config, http_client)?,
            };
            Ok(Arc::new(provider))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::email::smtp::MockMailTransport;

    fn smtp_options() -> MailerOptions {
        MailerOptions {
            email_service: Some("gmail".to_string()),
            email_username: Some("username".to_string()),
            email_password: Some("password".to_string()),
            sender_address: Some("sender@example.com".to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_smtp_mailer() {
        let mailer = create_mailer("smtp", &smtp_options(), CssOverrides::new()).unwrap();
        assert_eq!(mailer.provider_name(), "smtp");
    }

    #[tokio::test]
    async fn test_create_smtp_mailer_with_custom_transport() {
        let mut transport = MockMailTransport::new();
        transport.expect_test_connection().times(1).returning(|| Ok(()));

        let options = MailerOptions {
            transport: Some(Arc::new(transport)),
            ..smtp_options()
        };
        let mailer = create_mailer("nodemailer", &options, CssOverrides::new()).unwrap();
        assert!(mailer.test_connection().await.is_ok());
    }

    #[tokio::test]
    async fn test_create_cloud_mailer() {
        let options = MailerOptions {
            connection_string: Some(
                "endpoint=https://acme.communication.azure.com/;accesskey=c2VjcmV0LWtleQ=="
                    .to_string(),
            ),
            sender_address: Some("DoNotReply@acme.example".to_string()),
            ..Default::default()
        };
        let mailer = create_mailer("cloud", &options, CssOverrides::new()).unwrap();
        assert_eq!(mailer.provider_name(), "cloud");
    }

    #[test]
    fn test_create_mailer_invalid_kind() {
        let err = create_mailer("carrier-pigeon", &smtp_options(), CssOverrides::new())
            .err()
            .unwrap();
        assert!(matches!(err, MailerError::InvalidArgument(_)));
    }

    #[test]
    fn test_create_mailer_missing_password() {
        let options = MailerOptions {
            email_password: None,
            ..smtp_options()
        };
        let err = create_mailer("smtp", &options, CssOverrides::new()).err().unwrap();
        assert_eq!(err.to_string(), "Invalid or missing email password provided");
    }
}
