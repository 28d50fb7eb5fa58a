//! Common test utilities
#![allow(dead_code)]

use async_trait::async_trait;
use lettre::Message;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use templated_mailer::email::{EmailProviderError, MailTransport};
use templated_mailer::{BulkRequest, MailerOptions};

/// Base64 of `secret-key`
pub const ACCESS_KEY: &str = "c2VjcmV0LWtleQ==";

/// In-memory transport that records delivered messages and rejects chosen recipients
#[derive(Default)]
pub struct RecordingTransport {
    delivered: Mutex<Vec<Message>>,
    reject: Vec<String>,
}

impl RecordingTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn rejecting(addresses: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            delivered: Mutex::new(Vec::new()),
            reject: addresses.iter().map(|a| a.to_string()).collect(),
        })
    }

    /// `To` recipients of every delivered message, in delivery order
    pub fn delivered_to(&self) -> Vec<String> {
        self.delivered
            .lock()
            .unwrap()
            .iter()
            .map(|m| {
                m.headers()
                    .get_raw("To")
                    .unwrap_or_default()
                    .to_string()
            })
            .collect()
    }

    pub fn delivered_count(&self) -> usize {
        self.delivered.lock().unwrap().len()
    }

    pub fn raw_messages(&self) -> Vec<String> {
        self.delivered
            .lock()
            .unwrap()
            .iter()
            .map(|m| String::from_utf8_lossy(&m.formatted()).to_string())
            .collect()
    }
}

#[async_trait]
impl MailTransport for RecordingTransport {
    async fn deliver(&self, message: Message) -> Result<Option<String>, EmailProviderError> {
        let rejected = message
            .envelope()
            .to()
            .iter()
            .any(|addr| self.reject.contains(&addr.to_string()));
        if rejected {
            return Err(EmailProviderError::SendFailed(
                "550 5.1.1 mailbox unavailable".to_string(),
            ));
        }

        self.delivered.lock().unwrap().push(message);
        Ok(Some("250 2.0.0 OK".to_string()))
    }

    async fn test_connection(&self) -> Result<(), EmailProviderError> {
        Ok(())
    }
}

pub fn smtp_options(transport: Option<Arc<dyn MailTransport>>) -> MailerOptions {
    MailerOptions {
        email_service: Some("gmail".to_string()),
        email_username: Some("mailer@acme.example".to_string()),
        email_password: Some("app-password".to_string()),
        sender_address: Some("mailer@acme.example".to_string()),
        transport,
        ..Default::default()
    }
}

pub fn cloud_options(endpoint: &str) -> MailerOptions {
    MailerOptions {
        connection_string: Some(format!("endpoint={};accesskey={}", endpoint, ACCESS_KEY)),
        sender_address: Some("DoNotReply@acme.example".to_string()),
        poll_interval_ms: Some(5),
        max_polls: Some(5),
        ..Default::default()
    }
}

/// Bulk request against the `welcome` template
pub fn welcome_batch(recipients: &[(&str, &str)]) -> BulkRequest {
    let users = recipients
        .iter()
        .map(|(email, username)| {
            serde_json::json!({"email": email, "username": username})
        })
        .collect::<Vec<_>>();

    serde_json::from_value(serde_json::json!({
        "withDefaultTemplate": true,
        "templateName": "welcome",
        "subject": "Welcome aboard",
        "constants": {"platform": "Acme", "body": "Glad to have you", "sender": "Team"},
        "users": users,
    }))
    .unwrap()
}

pub fn values(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}
