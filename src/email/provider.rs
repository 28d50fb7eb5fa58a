//! Email provider trait and error types

use crate::domain::{EmailMessage, EmailSendResult};
use async_trait::async_trait;
use thiserror::Error;

/// Email provider error types
#[derive(Error, Debug)]
pub enum EmailProviderError {
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Send failed: {0}")]
    SendFailed(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Attachment fetch failed: {0}")]
    AttachmentFetch(String),

    #[error("Rate limited")]
    RateLimited,
}

impl EmailProviderError {
    /// Short label used as the `reason` metric dimension
    pub fn reason(&self) -> &'static str {
        match self {
            Self::ConnectionError(_) => "connection",
            Self::AuthenticationFailed(_) => "authentication",
            Self::SendFailed(_) => "send_failed",
            Self::InvalidConfiguration(_) => "invalid_configuration",
            Self::AttachmentFetch(_) => "attachment",
            Self::RateLimited => "rate_limited",
        }
    }
}

/// Sending backend. One implementation per vendor transport.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EmailProvider: Send + Sync {
    /// Resolve attachments, build the vendor message and deliver it
    async fn send(&self, message: &EmailMessage) -> Result<EmailSendResult, EmailProviderError>;

    /// Test connection to the email provider
    async fn test_connection(&self) -> Result<(), EmailProviderError>;

    /// Get the provider name
    fn provider_name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::EmailAddress;

    #[tokio::test]
    async fn test_mock_email_provider() {
        let mut mock = MockEmailProvider::new();

        mock.expect_provider_name().returning(|| "mock");

        mock.expect_test_connection().returning(|| Ok(()));

        mock.expect_send()
            .returning(|_| Ok(EmailSendResult::new(Some("msg-123".to_string()))));

        assert_eq!(mock.provider_name(), "mock");
        assert!(mock.test_connection().await.is_ok());

        let message = EmailMessage::new(
            EmailAddress::new("test@example.com"),
            "Test",
            "<p>Hello</p>",
        );
        let result = mock.send(&message).await.unwrap();
        assert_eq!(result.message_id.as_deref(), Some("msg-123"));
    }

    #[test]
    fn test_email_provider_error_display() {
        let errors = vec![
            EmailProviderError::ConnectionError("timeout".to_string()),
            EmailProviderError::AuthenticationFailed("bad password".to_string()),
            EmailProviderError::SendFailed("recipient rejected".to_string()),
            EmailProviderError::InvalidConfiguration("missing host".to_string()),
            EmailProviderError::AttachmentFetch("404".to_string()),
            EmailProviderError::RateLimited,
        ];

        for err in errors {
            let msg = err.to_string();
            assert!(!msg.is_empty());
            assert!(!err.reason().is_empty());
        }
    }
}
