//! SMTP email provider implementation using lettre

use super::attachment::{AttachmentResolver, ResolvedAttachment};
use super::provider::{EmailProvider, EmailProviderError};
use crate::domain::{EmailAddress, EmailMessage, EmailSendResult, SmtpConfig};
use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Attachment, Mailbox, MultiPart, SinglePart},
    transport::smtp::authentication::Credentials,
    Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use reqwest::Client;
use std::sync::Arc;

/// Delivers a fully built MIME message.
///
/// The default implementation is an SMTP relay; callers can plug in their own
/// (a queue, a test double, a different relay library).
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MailTransport: Send + Sync {
    /// Deliver the message, returning the server response if there is one
    async fn deliver(&self, message: Message) -> Result<Option<String>, EmailProviderError>;

    async fn test_connection(&self) -> Result<(), EmailProviderError>;
}

/// SMTP relay built from service credentials
pub struct RelayTransport {
    inner: AsyncSmtpTransport<Tokio1Executor>,
}

impl RelayTransport {
    pub fn from_config(config: &SmtpConfig) -> Result<Self, EmailProviderError> {
        let builder = if config.use_tls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
                .map_err(|e| EmailProviderError::InvalidConfiguration(e.to_string()))?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host)
        };

        let inner = builder
            .port(config.port)
            .credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ))
            .build();

        Ok(Self { inner })
    }
}

fn classify_smtp_error(error_msg: String) -> EmailProviderError {
    if error_msg.contains("authentication") || error_msg.contains("AUTH") {
        EmailProviderError::AuthenticationFailed(error_msg)
    } else if error_msg.contains("connection") || error_msg.contains("timeout") {
        EmailProviderError::ConnectionError(error_msg)
    } else {
        EmailProviderError::SendFailed(error_msg)
    }
}

#[async_trait]
impl MailTransport for RelayTransport {
    async fn deliver(&self, message: Message) -> Result<Option<String>, EmailProviderError> {
        let response = self
            .inner
            .send(message)
            .await
            .map_err(|e| classify_smtp_error(e.to_string()))?;

        let text = response.message().collect::<Vec<_>>().join(" ");
        Ok(if text.is_empty() {
            None
        } else {
            Some(format!("{} {}", response.code(), text))
        })
    }

    async fn test_connection(&self) -> Result<(), EmailProviderError> {
        match self.inner.test_connection().await {
            Ok(true) => Ok(()),
            Ok(false) => Err(EmailProviderError::ConnectionError(
                "SMTP server did not accept the connection".to_string(),
            )),
            Err(e) => {
                let error_msg = e.to_string();
                if error_msg.contains("authentication") || error_msg.contains("AUTH") {
                    Err(EmailProviderError::AuthenticationFailed(error_msg))
                } else {
                    Err(EmailProviderError::ConnectionError(error_msg))
                }
            }
        }
    }
}

/// SMTP-based email provider
pub struct SmtpEmailProvider {
    transport: Arc<dyn MailTransport>,
    attachments: AttachmentResolver,
    from: Mailbox,
}

impl SmtpEmailProvider {
    /// Create a new SMTP provider from configuration
    pub fn from_config(config: &SmtpConfig, http_client: Client) -> Result<Self, EmailProviderError> {
        let transport = RelayTransport::from_config(config)?;
        Self::with_transport(config, Arc::new(transport), http_client)
    }

    /// Create a provider that hands messages to a caller-supplied transport
    pub fn with_transport(
        config: &SmtpConfig,
        transport: Arc<dyn MailTransport>,
        http_client: Client,
    ) -> Result<Self, EmailProviderError> {
        let from = parse_mailbox(&EmailAddress::new(config.sender_address.clone()))
            .map_err(|e| {
                EmailProviderError::InvalidConfiguration(format!("Invalid from address: {}", e))
            })?;

        Ok(Self {
            transport,
            attachments: AttachmentResolver::new(http_client),
            from,
        })
    }

    /// Build the MIME message: HTML alone, text+HTML alternative, and a mixed
    /// wrapper when attachments are present
    fn build_message(
        &self,
        message: &EmailMessage,
        attachments: Vec<ResolvedAttachment>,
    ) -> Result<Message, EmailProviderError> {
        if message.to.is_empty() {
            return Err(EmailProviderError::InvalidConfiguration(
                "No recipients specified".to_string(),
            ));
        }

        let mut email_builder = Message::builder()
            .from(self.from.clone())
            .subject(&message.subject);

        for to in &message.to {
            email_builder = email_builder.to(parse_mailbox(to).map_err(|e| {
                EmailProviderError::InvalidConfiguration(format!("Invalid to address: {}", e))
            })?);
        }
        for cc in &message.cc {
            email_builder = email_builder.cc(parse_address(cc, "cc")?);
        }
        for bcc in &message.bcc {
            email_builder = email_builder.bcc(parse_address(bcc, "bcc")?);
        }
        if let Some(reply_to) = &message.reply_to {
            email_builder = email_builder.reply_to(parse_address(reply_to, "reply-to")?);
        }

        let alternative = message.text_body.as_ref().map(|text_body| {
            MultiPart::alternative()
                .singlepart(SinglePart::plain(text_body.clone()))
                .singlepart(SinglePart::html(message.html_body.clone()))
        });

        let email = if attachments.is_empty() {
            match alternative {
                Some(alternative) => email_builder.multipart(alternative),
                None => email_builder
                    .header(ContentType::TEXT_HTML)
                    .body(message.html_body.clone()),
            }
        } else {
            let mut mixed = match alternative {
                Some(alternative) => MultiPart::mixed().multipart(alternative),
                None => MultiPart::mixed().singlepart(SinglePart::html(message.html_body.clone())),
            };
            for attachment in attachments {
                let content_type = ContentType::parse(&attachment.content_type).map_err(|e| {
                    EmailProviderError::SendFailed(format!(
                        "Invalid content type '{}' for attachment '{}': {}",
                        attachment.content_type, attachment.name, e
                    ))
                })?;
                mixed = mixed
                    .singlepart(Attachment::new(attachment.name).body(attachment.content, content_type));
            }
            email_builder.multipart(mixed)
        };

        email.map_err(|e| EmailProviderError::SendFailed(e.to_string()))
    }
}

fn parse_mailbox(address: &EmailAddress) -> Result<Mailbox, lettre::address::AddressError> {
    let email: Address = address.email.trim().parse()?;
    let name = address.name.clone().filter(|n| !n.is_empty());
    Ok(Mailbox::new(name, email))
}

fn parse_address(address: &str, field: &str) -> Result<Mailbox, EmailProviderError> {
    parse_mailbox(&EmailAddress::new(address)).map_err(|e| {
        EmailProviderError::InvalidConfiguration(format!("Invalid {} address '{}': {}", field, address, e))
    })
}

#[async_trait]
impl EmailProvider for SmtpEmailProvider {
    async fn send(&self, message: &EmailMessage) -> Result<EmailSendResult, EmailProviderError> {
        let attachments = self.attachments.resolve_all(&message.attachments).await?;
        let email = self.build_message(message, attachments)?;

        let response = self.transport.deliver(email).await?;
        Ok(EmailSendResult::new(response))
    }

    async fn test_connection(&self) -> Result<(), EmailProviderError> {
        self.transport.test_connection().await
    }

    fn provider_name(&self) -> &'static str {
        "smtp"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AttachmentRef, MailerOptions};

    fn test_smtp_config() -> SmtpConfig {
        SmtpConfig::from_options(&MailerOptions {
            email_service: Some("localhost".to_string()),
            email_username: Some("user".to_string()),
            email_password: Some("password".to_string()),
            sender_address: Some("test@example.com".to_string()),
            smtp_port: Some(1025),
            use_tls: Some(false),
            ..Default::default()
        })
        .unwrap()
    }

    fn provider_with(transport: MockMailTransport) -> SmtpEmailProvider {
        SmtpEmailProvider::with_transport(&test_smtp_config(), Arc::new(transport), Client::new())
            .unwrap()
    }

    fn raw(message: &Message) -> String {
        String::from_utf8_lossy(&message.formatted()).to_string()
    }

    #[test]
    fn test_smtp_provider_creation() {
        let provider = SmtpEmailProvider::from_config(&test_smtp_config(), Client::new());
        assert!(provider.is_ok());
        assert_eq!(provider.unwrap().provider_name(), "smtp");
    }

    #[test]
    fn test_smtp_provider_with_tls() {
        let config = SmtpConfig {
            host: "smtp.example.com".to_string(),
            port: 587,
            use_tls: true,
            ..test_smtp_config()
        };
        assert!(SmtpEmailProvider::from_config(&config, Client::new()).is_ok());
    }

    #[test]
    fn test_build_plain_html_message() {
        let provider = provider_with(MockMailTransport::new());
        let message = EmailMessage::new(
            EmailAddress::with_name("jo@example.com", "Jo"),
            "Hello",
            "<p>Hi</p>",
        )
        .with_reply_to("support@example.com")
        .with_cc(vec!["cc@example.com".to_string()])
        .with_bcc(vec!["audit@example.com".to_string()]);

        let email = provider.build_message(&message, vec![]).unwrap();
        let mut recipients: Vec<String> =
            email.envelope().to().iter().map(|a| a.to_string()).collect();
        recipients.sort();
        assert_eq!(
            recipients,
            vec!["audit@example.com", "cc@example.com", "jo@example.com"]
        );

        let raw = raw(&email);
        assert!(raw.contains("Subject: Hello"));
        assert!(raw.contains("Reply-To: support@example.com"));
        assert!(raw.contains("Content-Type: text/html"));
        assert!(!raw.contains("Bcc:"));
    }

    #[test]
    fn test_build_alternative_with_attachment() {
        let provider = provider_with(MockMailTransport::new());
        let message = EmailMessage::new(EmailAddress::new("jo@example.com"), "Report", "<p>See attached</p>")
            .with_text_body("See attached");

        let email = provider
            .build_message(
                &message,
                vec![ResolvedAttachment {
                    name: "report.pdf".to_string(),
                    content_type: "application/pdf".to_string(),
                    content: b"%PDF".to_vec(),
                }],
            )
            .unwrap();

        let raw = raw(&email);
        assert!(raw.contains("multipart/mixed"));
        assert!(raw.contains("multipart/alternative"));
        assert!(raw.contains("text/plain"));
        assert!(raw.contains("application/pdf"));
        assert!(raw.contains("report.pdf"));
    }

    #[test]
    fn test_build_rejects_bad_addresses() {
        let provider = provider_with(MockMailTransport::new());

        let mut message = EmailMessage::new(EmailAddress::new("jo@example.com"), "S", "<p></p>");
        message.to.clear();
        let err = provider.build_message(&message, vec![]).unwrap_err();
        assert!(matches!(err, EmailProviderError::InvalidConfiguration(ref m) if m.contains("No recipients")));

        let message = EmailMessage::new(EmailAddress::new("not an address"), "S", "<p></p>");
        assert!(provider.build_message(&message, vec![]).is_err());

        let message = EmailMessage::new(EmailAddress::new("jo@example.com"), "S", "<p></p>")
            .with_cc(vec!["broken".to_string()]);
        assert!(provider.build_message(&message, vec![]).is_err());
    }

    #[tokio::test]
    async fn test_send_delegates_to_transport() {
        let mut transport = MockMailTransport::new();
        transport
            .expect_deliver()
            .withf(|m| m.envelope().to().iter().any(|a| a.to_string() == "jo@example.com"))
            .times(1)
            .returning(|_| Ok(Some("250 2.0.0 OK queued".to_string())));

        let provider = provider_with(transport);
        let message = EmailMessage::new(EmailAddress::new("jo@example.com"), "Hi", "<p>Hi</p>");

        let result = provider.send(&message).await.unwrap();
        assert_eq!(result.message_id.as_deref(), Some("250 2.0.0 OK queued"));
    }

    #[tokio::test]
    async fn test_send_transport_error() {
        let mut transport = MockMailTransport::new();
        transport
            .expect_deliver()
            .returning(|_| Err(EmailProviderError::SendFailed("550 mailbox unavailable".to_string())));

        let provider = provider_with(transport);
        let message = EmailMessage::new(EmailAddress::new("jo@example.com"), "Hi", "<p>Hi</p>");

        let err = provider.send(&message).await.unwrap_err();
        assert!(matches!(err, EmailProviderError::SendFailed(_)));
    }

    #[tokio::test]
    async fn test_send_attachment_failure_skips_transport() {
        let mut transport = MockMailTransport::new();
        transport.expect_deliver().never();

        let provider = provider_with(transport);
        let message = EmailMessage::new(EmailAddress::new("jo@example.com"), "Hi", "<p>Hi</p>")
            .with_attachments(vec![AttachmentRef::new("/definitely/not/here.pdf")]);

        let err = provider.send(&message).await.unwrap_err();
        assert!(matches!(err, EmailProviderError::AttachmentFetch(_)));
    }

    #[test]
    fn test_classify_smtp_error() {
        assert!(matches!(
            classify_smtp_error("535 authentication failed".to_string()),
            EmailProviderError::AuthenticationFailed(_)
        ));
        assert!(matches!(
            classify_smtp_error("connection refused".to_string()),
            EmailProviderError::ConnectionError(_)
        ));
        assert!(matches!(
            classify_smtp_error("550 no such user".to_string()),
            EmailProviderError::SendFailed(_)
        ));
    }
}
