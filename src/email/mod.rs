//! Email delivery backends
//!
//! Two providers sit behind the same [`EmailProvider`] trait:
//! - SMTP (using lettre, or any caller-supplied [`MailTransport`])
//! - Azure Communication Services Email (REST, HMAC-signed)

pub mod attachment;
pub mod cloud;
pub mod provider;
pub mod smtp;
pub mod templates;

pub use attachment::{AttachmentResolver, ResolvedAttachment};
pub use cloud::CloudEmailProvider;
pub use provider::{EmailProvider, EmailProviderError};
pub use smtp::{MailTransport, RelayTransport, SmtpEmailProvider};
pub use templates::{EmailTemplate, TemplateEngine};
