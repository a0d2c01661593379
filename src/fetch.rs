//! Remote retrieval of catalog file content.
//!
//! The core never calls this; it is used by the session state and tools when
//! a user asks for a file. Retries are left to the caller.

use crate::config::FetchConfig;
use crate::error::FetchError;
use serde::Deserialize;
use std::time::Duration;

/// Resolves an opaque file id to its bytes.
///
/// Implementations must be idempotent: the same id yields the same bytes or
/// the same error, which is what makes caller-side caching safe.
#[async_trait::async_trait]
pub trait BlobFetcher: Send + Sync {
    async fn fetch_content(&self, id: &str) -> Result<Vec<u8>, FetchError>;
}

/// Envelope returned by every Bot API method.
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
    error_code: Option<u16>,
}

#[derive(Debug, Deserialize)]
struct FileInfo {
    file_path: Option<String>,
}

/// Fetcher backed by the Telegram Bot API (`getFile` then the file endpoint).
#[derive(Clone)]
pub struct TelegramFetcher {
    client: reqwest::Client,
    api_base: String,
    token: Option<String>,
}

impl std::fmt::Debug for TelegramFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramFetcher")
            .field("api_base", &self.api_base)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl TelegramFetcher {
    pub fn new(
        api_base: impl Into<String>,
        token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Network(e.without_url().to_string()))?;

        Ok(Self {
            client,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.trim().is_empty()),
        })
    }

    /// Build from configuration, reading the token from the configured env var.
    ///
    /// A missing token is not an error here; requests fail with
    /// [`FetchError::Auth`] until one is provided.
    pub fn from_config(config: &FetchConfig) -> Result<Self, FetchError> {
        let token = std::env::var(&config.token_env).ok();
        if token.is_none() {
            tracing::warn!(
                "{} is not set, file downloads will be unavailable",
                config.token_env
            );
        }
        Self::new(
            config.api_base.clone(),
            token,
            Duration::from_secs(config.timeout_secs),
        )
    }

    fn token(&self) -> Result<&str, FetchError> {
        self.token
            .as_deref()
            .ok_or_else(|| FetchError::Auth("bot token not configured".to_string()))
    }

    /// Resolve a file id to a direct download URL.
    ///
    /// The URL embeds the bot token and must not be logged.
    pub async fn download_url(&self, id: &str) -> Result<String, FetchError> {
        let id = id.trim();
        if id.is_empty() {
            return Err(FetchError::NotFound {
                id: String::new(),
                reason: "file id is empty".to_string(),
            });
        }
        let token = self.token()?;

        tracing::debug!("Resolving file id {}", id);
        let response = self
            .client
            .get(format!("{}/bot{}/getFile", self.api_base, token))
            .query(&[("file_id", id)])
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        let envelope: ApiResponse<FileInfo> = response.json().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout
            } else {
                FetchError::Network(format!(
                    "unexpected getFile response ({}): {}",
                    status,
                    e.without_url()
                ))
            }
        })?;

        if !envelope.ok {
            let code = envelope.error_code.unwrap_or_else(|| status.as_u16());
            let description = envelope
                .description
                .unwrap_or_else(|| "unknown error".to_string());
            tracing::warn!("getFile failed for {} ({}): {}", id, code, description);
            return Err(api_error(id, code, description));
        }

        let file_path = envelope
            .result
            .and_then(|r| r.file_path)
            .ok_or_else(|| FetchError::NotFound {
                id: id.to_string(),
                reason: "response carries no file path".to_string(),
            })?;

        Ok(format!("{}/file/bot{}/{}", self.api_base, token, file_path))
    }
}

#[async_trait::async_trait]
impl BlobFetcher for TelegramFetcher {
    async fn fetch_content(&self, id: &str) -> Result<Vec<u8>, FetchError> {
        let url = self.download_url(id).await?;

        let response = self.client.get(url).send().await.map_err(transport_error)?;
        let status = response.status();
        if !status.is_success() {
            let reason = status
                .canonical_reason()
                .unwrap_or("download failed")
                .to_string();
            return Err(api_error(id.trim(), status.as_u16(), reason));
        }

        let bytes = response.bytes().await.map_err(transport_error)?;
        tracing::debug!("Fetched {} bytes for {}", bytes.len(), id.trim());
        Ok(bytes.to_vec())
    }
}

/// Map a transport failure, stripping the URL so the token never leaks into messages.
fn transport_error(e: reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::Timeout
    } else {
        FetchError::Network(e.without_url().to_string())
    }
}

fn api_error(id: &str, code: u16, description: String) -> FetchError {
    match code {
        401 | 403 => FetchError::Auth(description),
        400 | 404 => FetchError::NotFound {
            id: id.to_string(),
            reason: description,
        },
        _ => FetchError::Network(format!("API error {code}: {description}")),
    }
}
