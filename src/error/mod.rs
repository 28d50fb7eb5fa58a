//! Unified error handling for the mailer

use crate::email::EmailProviderError;
use thiserror::Error;

/// Mailer-wide result type
pub type Result<T> = std::result::Result<T, MailerError>;

/// Mailer error types
#[derive(Error, Debug)]
pub enum MailerError {
    /// Bad constructor arguments; always fatal
    #[error("{0}")]
    Configuration(String),

    /// Bad request shape (missing subject, empty recipient list, unknown template...)
    #[error("{0}")]
    Validation(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Attachment error: {0}")]
    Attachment(String),

    #[error("Transport error: {0}")]
    Transport(EmailProviderError),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl MailerError {
    /// Short, stable label used for metrics and structured logs
    pub fn kind(&self) -> &'static str {
        match self {
            MailerError::Configuration(_) => "configuration",
            MailerError::Validation(_) => "validation",
            MailerError::InvalidArgument(_) => "invalid_argument",
            MailerError::Attachment(_) => "attachment",
            MailerError::Transport(_) => "transport",
            MailerError::Internal(_) => "internal",
        }
    }
}

impl From<EmailProviderError> for MailerError {
    fn from(err: EmailProviderError) -> Self {
        match err {
            EmailProviderError::AttachmentFetch(msg) => MailerError::Attachment(msg),
            EmailProviderError::InvalidConfiguration(msg) => MailerError::Configuration(msg),
            other => MailerError::Transport(other),
        }
    }
}
