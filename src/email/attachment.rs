//! Attachment resolution
//!
//! Sources starting with `http://` or `https://` are downloaded, anything else is read
//! from the local filesystem. Nothing is cached: every send attempt resolves again.

use super::provider::EmailProviderError;
use crate::domain::AttachmentRef;
use reqwest::Client;

/// Attachment content ready to be handed to a transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAttachment {
    pub name: String,
    pub content_type: String,
    pub content: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct AttachmentResolver {
    http_client: Client,
}

impl AttachmentResolver {
    pub fn new(http_client: Client) -> Self {
        Self { http_client }
    }

    /// Resolve every attachment in order, failing on the first one that cannot be read
    pub async fn resolve_all(
        &self,
        attachments: &[AttachmentRef],
    ) -> Result<Vec<ResolvedAttachment>, EmailProviderError> {
        let mut resolved = Vec::with_capacity(attachments.len());
        for attachment in attachments {
            resolved.push(self.resolve(attachment).await?);
        }
        Ok(resolved)
    }

    pub async fn resolve(
        &self,
        attachment: &AttachmentRef,
    ) -> Result<ResolvedAttachment, EmailProviderError> {
        let source = attachment.url.trim();
        if source.is_empty() {
            return Err(EmailProviderError::AttachmentFetch(
                "Invalid attachment. 'url' is required and should be a string.".to_string(),
            ));
        }

        let content = if is_remote(source) {
            self.fetch(source).await?
        } else {
            tokio::fs::read(source).await.map_err(|e| {
                EmailProviderError::AttachmentFetch(format!("{}: {}", source, e))
            })?
        };

        tracing::debug!(
            source = %source,
            bytes = content.len(),
            "Resolved attachment"
        );

        Ok(ResolvedAttachment {
            name: attachment.display_name().to_string(),
            content_type: attachment.content_type().to_string(),
            content,
        })
    }

    async fn fetch(&self, url: &str) -> Result<Vec<u8>, EmailProviderError> {
        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| EmailProviderError::AttachmentFetch(format!("{}: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(EmailProviderError::AttachmentFetch(format!(
                "{}: HTTP {}",
                url, status
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| EmailProviderError::AttachmentFetch(format!("{}: {}", url, e)))?;

        Ok(bytes.to_vec())
    }
}

fn is_remote(source: &str) -> bool {
    let lower = source.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}
