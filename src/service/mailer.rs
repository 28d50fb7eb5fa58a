//! Templated sending on top of an [`EmailProvider`]

use crate::domain::{
    BulkRecipient, BulkRequest, BulkResult, CssOverrides, EmailAddress, EmailMessage,
    EmailSendResult, SendEmailRequest, TemplateSource,
};
use crate::email::templates::substitute_values;
use crate::email::{EmailProvider, EmailTemplate, TemplateEngine};
use crate::error::{MailerError, Result};
use std::borrow::Cow;
use std::sync::Arc;

const INVALID_SUBJECT: &str = "Invalid or missing 'subject'. Please provide a valid subject.";
const INVALID_USERS: &str = "Invalid 'users'. It should be a non-empty array.";
const INVALID_EMAIL: &str = "Invalid or missing 'email'. Please provide a valid email address.";
const MISSING_TEMPLATE_NAME: &str =
    "Invalid or missing 'templateName'. Please provide a valid template name.";
const MISSING_TEMPLATE: &str = "Invalid or missing 'template'. Please provide a valid template.";

/// Mailer bound to one delivery backend and one set of CSS overrides
pub struct Mailer {
    provider: Arc<dyn EmailProvider>,
    engine: TemplateEngine,
}

impl Mailer {
    pub fn new(provider: Arc<dyn EmailProvider>, css: CssOverrides) -> Self {
        Self {
            provider,
            engine: TemplateEngine::with_css(css),
        }
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.provider_name()
    }

    /// Check that the backend is reachable and accepts the credentials
    pub async fn test_connection(&self) -> Result<()> {
        self.provider.test_connection().await.map_err(MailerError::from)
    }

    /// Deliver an already rendered message
    pub async fn send_one(&self, message: &EmailMessage) -> Result<EmailSendResult> {
        let provider = self.provider.provider_name();

        match self.provider.send(message).await {
            Ok(result) => {
                metrics::counter!("mailer_emails_sent_total", "provider" => provider).increment(1);
                tracing::info!(
                    provider,
                    to = %message.primary_recipient(),
                    message_id = ?result.message_id,
                    "Email sent"
                );
                Ok(result)
            }
            Err(e) => {
                metrics::counter!(
                    "mailer_emails_failed_total",
                    "provider" => provider,
                    "reason" => e.reason()
                )
                .increment(1);
                tracing::error!(
                    provider,
                    to = %message.primary_recipient(),
                    error = %e,
                    "Error sending email"
                );
                Err(e.into())
            }
        }
    }

    /// Render a template for one recipient and send it
    pub async fn send_email(&self, request: &SendEmailRequest) -> Result<EmailSendResult> {
        let template = resolve_template(request.template_source())?;

        if request.email.trim().is_empty() {
            return Err(MailerError::Validation(INVALID_EMAIL.to_string()));
        }

        let html = substitute_values(&self.engine.style(&template), &request.constants);

        let to = match request.username.as_deref().filter(|n| !n.is_empty()) {
            Some(name) => EmailAddress::with_name(request.email.trim(), name),
            None => EmailAddress::new(request.email.trim()),
        };

        let mut message = EmailMessage::new(to, request.subject.clone(), html)
            .with_cc(request.cc.clone())
            .with_bcc(request.bcc.clone())
            .with_attachments(request.attachments.clone());
        if let Some(text) = &request.message {
            message = message.with_text_body(text.clone());
        }
        if let Some(reply_to) = &request.reply_to {
            message = message.with_reply_to(reply_to.clone());
        }

        self.send_one(&message).await
    }

    /// Send one templated message per recipient.
    ///
    /// Validation problems come back as a `Sending Error:` status rather than an error.
    /// Per-recipient failures never stop the batch; they are collected in input order.
    pub async fn send_bulk(&self, request: &BulkRequest) -> BulkResult {
        let template = match validate_bulk(request) {
            Ok(template) => template,
            Err(e) => {
                metrics::counter!("mailer_bulk_batches_total", "outcome" => "rejected")
                    .increment(1);
                tracing::warn!(error = %e, "Bulk send rejected");
                return BulkResult::rejected(e);
            }
        };

        let provider = self.provider.provider_name();
        let content = self.engine.style(&template);
        let mut failed_emails = Vec::new();

        for recipient in &request.users {
            let message = self.recipient_message(request, recipient, &content);

            match self.provider.send(&message).await {
                Ok(result) => {
                    metrics::counter!("mailer_emails_sent_total", "provider" => provider)
                        .increment(1);
                    tracing::info!(
                        provider,
                        to = %recipient.email,
                        message_id = ?result.message_id,
                        "Email sent"
                    );
                }
                Err(e) => {
                    metrics::counter!(
                        "mailer_emails_failed_total",
                        "provider" => provider,
                        "reason" => e.reason()
                    )
                    .increment(1);
                    tracing::warn!(provider, to = %recipient.email, error = %e, "Error sending email");
                    failed_emails.push(recipient.email.clone());
                }
            }
        }

        let outcome = if failed_emails.is_empty() { "complete" } else { "partial" };
        metrics::counter!("mailer_bulk_batches_total", "outcome" => outcome).increment(1);

        if failed_emails.is_empty() {
            tracing::info!(provider, recipients = request.users.len(), "Bulk send finished");
        } else {
            tracing::warn!(
                provider,
                recipients = request.users.len(),
                failed = ?failed_emails,
                "Failed to send emails to some recipients"
            );
        }

        BulkResult::queued(failed_emails)
    }

    fn recipient_message(
        &self,
        request: &BulkRequest,
        recipient: &BulkRecipient,
        content: &str,
    ) -> EmailMessage {
        let values = recipient.merged_values(&request.constants);
        let html = substitute_values(content, &values);

        let to = match recipient.username.as_deref().filter(|n| !n.is_empty()) {
            Some(name) => EmailAddress::with_name(recipient.email.trim(), name),
            None => EmailAddress::new(recipient.email.trim()),
        };

        let mut message = EmailMessage::new(to, request.subject.clone(), html)
            .with_cc(request.cc.clone())
            .with_bcc(request.bcc.clone())
            .with_attachments(request.attachments_for(recipient));
        if let Some(text) = &recipient.message {
            message = message.with_text_body(text.clone());
        }
        if let Some(reply_to) = &recipient.reply_to {
            message = message.with_reply_to(reply_to.clone());
        }
        message
    }
}

fn validate_bulk(request: &BulkRequest) -> Result<Cow<'_, str>> {
    if request.subject.is_empty() {
        return Err(MailerError::Validation(INVALID_SUBJECT.to_string()));
    }
    if request.users.is_empty() {
        return Err(MailerError::Validation(INVALID_USERS.to_string()));
    }
    resolve_template(request.template_source())
}

fn resolve_template(source: Option<TemplateSource<'_>>) -> Result<Cow<'_, str>> {
    match source {
        Some(TemplateSource::Builtin(name)) => EmailTemplate::from_name(name)
            .map(|t| Cow::Borrowed(t.html_body()))
            .ok_or_else(|| MailerError::Validation(format!("Unknown template '{}'", name))),
        Some(TemplateSource::Custom(html)) if !html.trim().is_empty() => Ok(Cow::Borrowed(html)),
        Some(TemplateSource::Custom(_)) => Err(MailerError::Validation(MISSING_TEMPLATE.to_string())),
        None => Err(MailerError::Validation(MISSING_TEMPLATE_NAME.to_string())),
    }
}
