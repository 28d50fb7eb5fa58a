//! Templated Mailer
//!
//! Renders templated HTML emails (value placeholders and CSS injection points)
//! and dispatches them singly or in bulk through an SMTP relay or Azure
//! Communication Services Email.

pub mod config;
pub mod domain;
pub mod email;
pub mod error;
pub mod service;
pub mod telemetry;

// Re-export commonly used types
pub use config::Config;
pub use domain::{BulkRequest, BulkResult, CssOverrides, MailerOptions, SendEmailRequest};
pub use error::{MailerError, Result};
pub use service::{create_mailer, Mailer};
