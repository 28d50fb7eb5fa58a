//! Azure Communication Services email provider
//!
//! Talks to the Email REST API directly:
//! - `POST {endpoint}/emails:send` with an HMAC-SHA256 signed request
//! - `202 Accepted` hands back an `Operation-Location` which is polled until the
//!   send reaches a terminal state

use super::attachment::AttachmentResolver;
use super::provider::{EmailProvider, EmailProviderError};
use crate::domain::{CloudConfig, EmailMessage, EmailSendResult};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use hmac::{Hmac, Mac};
use reqwest::{Client, Method, Response, StatusCode};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::time::Duration;
use url::Url;

type HmacSha256 = Hmac<Sha256>;

const API_VERSION: &str = "2023-03-31";

/// Headers that authenticate one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestSignature {
    pub date: String,
    pub content_hash: String,
    pub authorization: String,
}

/// Sign a request the way the Communication Services gateway expects.
///
/// String to sign: `METHOD\npath?query\ndate;host;content-hash`
pub fn sign_request(
    access_key: &[u8],
    method: &Method,
    url: &Url,
    body: &[u8],
    date: &str,
) -> Result<RequestSignature, EmailProviderError> {
    let content_hash = STANDARD.encode(Sha256::digest(body));

    let host = match (url.host_str(), url.port()) {
        (Some(host), Some(port)) => format!("{}:{}", host, port),
        (Some(host), None) => host.to_string(),
        (None, _) => {
            return Err(EmailProviderError::InvalidConfiguration(format!(
                "URL has no host: {}",
                url
            )))
        }
    };
    let path_and_query = match url.query() {
        Some(query) => format!("{}?{}", url.path(), query),
        None => url.path().to_string(),
    };

    let string_to_sign = format!(
        "{}\n{}\n{};{};{}",
        method.as_str(),
        path_and_query,
        date,
        host,
        content_hash
    );

    let mut mac = HmacSha256::new_from_slice(access_key)
        .map_err(|e| EmailProviderError::InvalidConfiguration(e.to_string()))?;
    mac.update(string_to_sign.as_bytes());
    let signature = STANDARD.encode(mac.finalize().into_bytes());

    Ok(RequestSignature {
        date: date.to_string(),
        content_hash,
        authorization: format!(
            "HMAC-SHA256 SignedHeaders=x-ms-date;host;x-ms-content-sha256&Signature={}",
            signature
        ),
    })
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SendEmailPayload<'a> {
    sender_address: &'a str,
    content: ContentPayload<'a>,
    recipients: RecipientsPayload<'a>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    reply_to: Vec<AddressPayload<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    attachments: Vec<AttachmentPayload>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ContentPayload<'a> {
    subject: &'a str,
    html: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    plain_text: Option<&'a str>,
}

#[derive(Serialize)]
struct RecipientsPayload<'a> {
    to: Vec<AddressPayload<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    cc: Vec<AddressPayload<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    bcc: Vec<AddressPayload<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AddressPayload<'a> {
    address: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    display_name: Option<&'a str>,
}

impl<'a> AddressPayload<'a> {
    fn bare(address: &'a str) -> Self {
        Self {
            address,
            display_name: None,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AttachmentPayload {
    name: String,
    content_type: String,
    content_in_base64: String,
}

#[derive(Debug, Deserialize)]
struct OperationStatus {
    #[serde(default)]
    id: Option<String>,
    status: String,
    #[serde(default)]
    error: Option<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl ErrorDetail {
    fn describe(&self) -> String {
        match (&self.code, &self.message) {
            (Some(code), Some(message)) => format!("{}: {}", code, message),
            (None, Some(message)) => message.clone(),
            (Some(code), None) => code.clone(),
            (None, None) => "unknown error".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: Option<ErrorDetail>,
}

/// Azure Communication Services email provider
pub struct CloudEmailProvider {
    http_client: Client,
    attachments: AttachmentResolver,
    endpoint: Url,
    access_key: Vec<u8>,
    sender_address: String,
    poll_interval: Duration,
    max_polls: u32,
}

impl CloudEmailProvider {
    /// Create a new provider from a parsed connection string
    pub fn from_config(config: &CloudConfig) -> Result<Self, EmailProviderError> {
        let http_client = Client::builder()
            .timeout(config.http_timeout)
            .build()
            .map_err(|e| {
                EmailProviderError::InvalidConfiguration(format!(
                    "Failed to create HTTP client: {}",
                    e
                ))
            })?;

        Ok(Self {
            attachments: AttachmentResolver::new(http_client.clone()),
            http_client,
            endpoint: config.endpoint.clone(),
            access_key: config.access_key.clone(),
            sender_address: config.sender_address.clone(),
            poll_interval: config.poll_interval,
            max_polls: config.max_polls,
        })
    }

    fn api_url(&self, segments: &[&str]) -> Result<Url, EmailProviderError> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|_| {
                EmailProviderError::InvalidConfiguration(format!(
                    "Endpoint cannot be a base URL: {}",
                    self.endpoint
                ))
            })?
            .pop_if_empty()
            .extend(segments);
        url.query_pairs_mut().append_pair("api-version", API_VERSION);
        Ok(url)
    }

    async fn signed_request(
        &self,
        method: Method,
        url: Url,
        body: Vec<u8>,
        operation_id: Option<&str>,
    ) -> Result<Response, EmailProviderError> {
        let date = chrono::Utc::now()
            .format("%a, %d %b %Y %H:%M:%S GMT")
            .to_string();
        let signature = sign_request(&self.access_key, &method, &url, &body, &date)?;

        let mut request = self
            .http_client
            .request(method, url)
            .header("x-ms-date", signature.date)
            .header("x-ms-content-sha256", signature.content_hash)
            .header("Authorization", signature.authorization);

        if let Some(operation_id) = operation_id {
            request = request.header("Operation-Id", operation_id);
        }
        if !body.is_empty() {
            request = request
                .header("Content-Type", "application/json")
                .body(body);
        }

        request.send().await.map_err(|e| {
            if e.is_timeout() || e.is_connect() {
                EmailProviderError::ConnectionError(e.to_string())
            } else {
                EmailProviderError::SendFailed(e.to_string())
            }
        })
    }

    async fn build_payload(&self, message: &EmailMessage) -> Result<Vec<u8>, EmailProviderError> {
        if message.to.is_empty() {
            return Err(EmailProviderError::InvalidConfiguration(
                "No recipients specified".to_string(),
            ));
        }

        let attachments = self
            .attachments
            .resolve_all(&message.attachments)
            .await?
            .into_iter()
            .map(|a| AttachmentPayload {
                name: a.name,
                content_type: a.content_type,
                content_in_base64: STANDARD.encode(a.content),
            })
            .collect();

        let payload = SendEmailPayload {
            sender_address: &self.sender_address,
            content: ContentPayload {
                subject: &message.subject,
                html: &message.html_body,
                plain_text: message.text_body.as_deref(),
            },
            recipients: RecipientsPayload {
                to: message
                    .to
                    .iter()
                    .map(|addr| AddressPayload {
                        address: &addr.email,
                        display_name: addr.name.as_deref().filter(|n| !n.is_empty()),
                    })
                    .collect(),
                cc: message.cc.iter().map(|a| AddressPayload::bare(a)).collect(),
                bcc: message.bcc.iter().map(|a| AddressPayload::bare(a)).collect(),
            },
            reply_to: message
                .reply_to
                .iter()
                .map(|a| AddressPayload::bare(a))
                .collect(),
            attachments,
        };

        serde_json::to_vec(&payload).map_err(|e| EmailProviderError::SendFailed(e.to_string()))
    }

    /// Poll the operation until it succeeds, fails, or the poll budget runs out
    async fn poll_until_done(
        &self,
        operation_url: Url,
        operation_id: &str,
    ) -> Result<Option<String>, EmailProviderError> {
        let mut wait = self.poll_interval;
        let max_wait = self.poll_interval * self.max_polls;

        for attempt in 1..=self.max_polls {
            tokio::time::sleep(wait).await;

            let response = self
                .signed_request(Method::GET, operation_url.clone(), Vec::new(), None)
                .await?;
            if !response.status().is_success() {
                return Err(error_from_response(response).await);
            }

            wait = retry_after(&response, max_wait).unwrap_or(self.poll_interval);

            let status: OperationStatus = response.json().await.map_err(|e| {
                EmailProviderError::SendFailed(format!("Failed to parse operation status: {}", e))
            })?;

            tracing::debug!(
                operation_id = %operation_id,
                attempt,
                status = %status.status,
                "Polled email send operation"
            );

            if let Some(result) = terminal_result(status, operation_id) {
                return result;
            }
        }

        Err(EmailProviderError::SendFailed(format!(
            "Email send operation {} did not complete after {} polls",
            operation_id, self.max_polls
        )))
    }
}

/// `Some` once the operation has reached a terminal state
fn terminal_result(
    status: OperationStatus,
    operation_id: &str,
) -> Option<Result<Option<String>, EmailProviderError>> {
    match status.status.as_str() {
        "Succeeded" => Some(Ok(Some(
            status.id.unwrap_or_else(|| operation_id.to_string()),
        ))),
        "Failed" | "Canceled" => {
            let reason = status
                .error
                .map(|e| e.describe())
                .unwrap_or_else(|| status.status.clone());
            Some(Err(EmailProviderError::SendFailed(format!(
                "Email send operation {} {}: {}",
                operation_id,
                status.status.to_lowercase(),
                reason
            ))))
        }
        _ => None,
    }
}

/// Server-suggested poll delay, capped at `max_wait`
fn retry_after(response: &Response, max_wait: Duration) -> Option<Duration> {
    response
        .headers()
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(|secs| Duration::from_secs(secs).min(max_wait))
}

async fn error_from_response(response: Response) -> EmailProviderError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorResponse>(&body)
        .ok()
        .and_then(|e| e.error)
        .map(|e| e.describe())
        .unwrap_or(body);

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            EmailProviderError::AuthenticationFailed(format!("{} - {}", status, message))
        }
        StatusCode::TOO_MANY_REQUESTS => EmailProviderError::RateLimited,
        _ => EmailProviderError::SendFailed(format!("{} - {}", status, message)),
    }
}

#[async_trait]
impl EmailProvider for CloudEmailProvider {
    async fn send(&self, message: &EmailMessage) -> Result<EmailSendResult, EmailProviderError> {
        let body = self.build_payload(message).await?;
        let operation_id = uuid::Uuid::new_v4().to_string();
        let url = self.api_url(&["emails:send"])?;

        let response = self
            .signed_request(Method::POST, url, body, Some(&operation_id))
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let operation_url = response
            .headers()
            .get("operation-location")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| Url::parse(v).ok());

        let accepted: Option<OperationStatus> = response.json().await.ok();
        if let Some(result) = accepted.and_then(|s| terminal_result(s, &operation_id)) {
            return result.map(EmailSendResult::new);
        }

        let message_id = match operation_url {
            Some(operation_url) => self.poll_until_done(operation_url, &operation_id).await?,
            None => Some(operation_id),
        };

        Ok(EmailSendResult::new(message_id))
    }

    async fn test_connection(&self) -> Result<(), EmailProviderError> {
        let nil_operation_id = uuid::Uuid::nil().to_string();
        let url = self.api_url(&["emails", "operations", nil_operation_id.as_str()])?;
        let response = self.signed_request(Method::GET, url, Vec::new(), None).await?;

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Err(error_from_response(response).await)
            }
            _ => Ok(()),
        }
    }

    fn provider_name(&self) -> &'static str {
        "cloud"
    }
}
