//! Email message, request and result types

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Display name used when an attachment does not carry one
pub const DEFAULT_ATTACHMENT_NAME: &str = "attachment";

/// Content type used when an attachment does not carry one
pub const DEFAULT_ATTACHMENT_CONTENT_TYPE: &str = "application/octet-stream";

/// Status reported by a bulk send that got past validation
pub const BULK_QUEUED_STATUS: &str = "Emails queued for sending";

/// Email address with optional display name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailAddress {
    pub email: String,
    pub name: Option<String>,
}

impl EmailAddress {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            name: None,
        }
    }

    pub fn with_name(email: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            name: Some(name.into()),
        }
    }
}

/// Reference to an attachment source. Resolved to bytes on every send attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentRef {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub content_type: Option<String>,
    /// `http(s)://` URL or local file path
    #[serde(default)]
    pub url: String,
}

impl AttachmentRef {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            name: None,
            content_type: None,
            url: url.into(),
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn display_name(&self) -> &str {
        match self.name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => DEFAULT_ATTACHMENT_NAME,
        }
    }

    pub fn content_type(&self) -> &str {
        match self.content_type.as_deref() {
            Some(ct) if !ct.is_empty() => ct,
            _ => DEFAULT_ATTACHMENT_CONTENT_TYPE,
        }
    }
}

/// Email message to be sent, already rendered
#[derive(Debug, Clone)]
pub struct EmailMessage {
    pub to: Vec<EmailAddress>,
    pub subject: String,
    pub html_body: String,
    pub text_body: Option<String>,
    pub reply_to: Option<String>,
    pub cc: Vec<String>,
    pub bcc: Vec<String>,
    pub attachments: Vec<AttachmentRef>,
}

impl EmailMessage {
    pub fn new(to: EmailAddress, subject: impl Into<String>, html_body: impl Into<String>) -> Self {
        Self {
            to: vec![to],
            subject: subject.into(),
            html_body: html_body.into(),
            text_body: None,
            reply_to: None,
            cc: Vec::new(),
            bcc: Vec::new(),
            attachments: Vec::new(),
        }
    }

    pub fn with_text_body(mut self, text_body: impl Into<String>) -> Self {
        self.text_body = Some(text_body.into());
        self
    }

    pub fn with_reply_to(mut self, reply_to: impl Into<String>) -> Self {
        self.reply_to = Some(reply_to.into());
        self
    }

    pub fn with_cc(mut self, cc: Vec<String>) -> Self {
        self.cc = cc;
        self
    }

    pub fn with_bcc(mut self, bcc: Vec<String>) -> Self {
        self.bcc = bcc;
        self
    }

    pub fn with_attachments(mut self, attachments: Vec<AttachmentRef>) -> Self {
        self.attachments = attachments;
        self
    }

    /// First recipient address, used for logging
    pub fn primary_recipient(&self) -> &str {
        self.to.first().map(|a| a.email.as_str()).unwrap_or_default()
    }
}

/// Result of sending an email
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailSendResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
}

impl EmailSendResult {
    pub fn new(message_id: Option<String>) -> Self {
        Self { message_id }
    }
}

/// Where the HTML of a request comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateSource<'a> {
    /// One of the built-in templates, by name
    Builtin(&'a str),
    /// Caller-supplied HTML
    Custom(&'a str),
}

/// Single templated send
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendEmailRequest {
    #[serde(default)]
    pub with_default_template: bool,
    #[serde(default)]
    pub template_name: Option<String>,
    #[serde(default)]
    pub template: Option<String>,
    #[serde(default)]
    pub constants: HashMap<String, String>,
    #[serde(default)]
    pub subject: String,
    pub email: String,
    #[serde(default)]
    pub username: Option<String>,
    /// Plain-text alternative body
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub reply_to: Option<String>,
    #[serde(default)]
    pub cc: Vec<String>,
    #[serde(default)]
    pub bcc: Vec<String>,
    #[serde(default)]
    pub attachments: Vec<AttachmentRef>,
}

impl SendEmailRequest {
    pub fn template_source(&self) -> Option<TemplateSource<'_>> {
        template_source(
            self.with_default_template,
            self.template_name.as_deref(),
            self.template.as_deref(),
        )
    }
}

/// One recipient of a bulk send
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkRecipient {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub reply_to: Option<String>,
    #[serde(default)]
    pub attachments: Vec<AttachmentRef>,
    /// Extra per-recipient placeholder values
    #[serde(default)]
    pub values: HashMap<String, String>,
}

impl BulkRecipient {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            ..Default::default()
        }
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn with_value(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    pub fn with_attachment(mut self, attachment: AttachmentRef) -> Self {
        self.attachments.push(attachment);
        self
    }

    /// Batch constants overlaid with this recipient's own fields and values.
    /// Recipient keys win on collision.
    pub fn merged_values(&self, constants: &HashMap<String, String>) -> HashMap<String, String> {
        let mut values = constants.clone();
        values.insert("email".to_string(), self.email.clone());
        if let Some(username) = &self.username {
            values.insert("username".to_string(), username.clone());
        }
        if let Some(message) = &self.message {
            values.insert("message".to_string(), message.clone());
        }
        if let Some(reply_to) = &self.reply_to {
            values.insert("replyTo".to_string(), reply_to.clone());
        }
        values.extend(self.values.iter().map(|(k, v)| (k.clone(), v.clone())));
        values
    }
}

/// Templated send to many recipients
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkRequest {
    #[serde(default)]
    pub with_default_template: bool,
    #[serde(default)]
    pub template_name: Option<String>,
    #[serde(default)]
    pub template: Option<String>,
    #[serde(default)]
    pub constants: HashMap<String, String>,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub users: Vec<BulkRecipient>,
    #[serde(default)]
    pub cc: Vec<String>,
    #[serde(default)]
    pub bcc: Vec<String>,
    /// Attachments sent to every recipient, ahead of the recipient's own
    #[serde(default)]
    pub attachments: Vec<AttachmentRef>,
}

impl BulkRequest {
    pub fn template_source(&self) -> Option<TemplateSource<'_>> {
        template_source(
            self.with_default_template,
            self.template_name.as_deref(),
            self.template.as_deref(),
        )
    }

    /// Batch attachments first, then the recipient's
    pub fn attachments_for(&self, recipient: &BulkRecipient) -> Vec<AttachmentRef> {
        self.attachments
            .iter()
            .chain(recipient.attachments.iter())
            .cloned()
            .collect()
    }
}

fn template_source<'a>(
    with_default_template: bool,
    template_name: Option<&'a str>,
    template: Option<&'a str>,
) -> Option<TemplateSource<'a>> {
    if with_default_template {
        template_name.map(TemplateSource::Builtin)
    } else {
        template.map(TemplateSource::Custom)
    }
}

/// Outcome of a bulk send
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkResult {
    pub status: String,
    pub failed_emails: Vec<String>,
}

impl BulkResult {
    pub fn queued(failed_emails: Vec<String>) -> Self {
        Self {
            status: BULK_QUEUED_STATUS.to_string(),
            failed_emails,
        }
    }

    pub fn rejected(reason: impl std::fmt::Display) -> Self {
        Self {
            status: format!("Sending Error: {}", reason),
            failed_emails: Vec::new(),
        }
    }

    pub fn is_queued(&self) -> bool {
        self.status == BULK_QUEUED_STATUS
    }
}
