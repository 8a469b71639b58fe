//! External collaborators: web search, text embedding and document download.
//!
//! ARCHITECTURAL RULE: the matching and discovery code only ever sees the traits in
//! this module. Concrete HTTP clients are chosen once in `main` and injected through
//! `AppState`, so every pipeline stage can run against fakes in tests.

use std::path::PathBuf;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

pub mod embedding;
pub mod fetcher;
pub mod search;

pub use embedding::{HashingEmbedder, HttpEmbedder};
pub use fetcher::HttpArtifactFetcher;
pub use search::HttpSearchProvider;

/// Retries on 429 and 5xx responses.
const MAX_RETRIES: u32 = 3;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Invalid provider response: {0}")]
    InvalidResponse(String),

    #[error("Provider unavailable after {retries} retries")]
    Exhausted { retries: u32 },
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{url} returned status {status}")]
    Status { url: String, status: u16 },

    #[error("{url} exceeds the {limit} byte artifact limit")]
    TooLarge { url: String, limit: usize },

    #[error("fetching {url} timed out after {secs}s")]
    Timeout { url: String, secs: u64 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A single organic search result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub snippet: String,
    pub url: String,
}

/// A fetched document, kept in memory and (for HTTP fetches) on disk.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub url: String,
    pub path: Option<PathBuf>,
    pub content_type: Option<String>,
    pub bytes: Bytes,
    /// Hex SHA-256 of `bytes`.
    pub checksum: String,
}

impl Artifact {
    pub fn from_bytes(url: impl Into<String>, content_type: Option<String>, bytes: Bytes) -> Self {
        let checksum = fetcher::content_checksum(&bytes);
        Self {
            url: url.into(),
            path: None,
            content_type,
            bytes,
            checksum,
        }
    }

    pub fn with_path(mut self, path: PathBuf) -> Self {
        self.path = Some(path);
        self
    }
}

#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>, ProviderError>;
}

#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, ProviderError>;

    /// Backend label, for logs and `/health`.
    fn name(&self) -> &'static str;
}

#[async_trait]
pub trait ArtifactFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Artifact, FetchError>;
}

/// Sends a request, retrying on 429 and 5xx with exponential backoff (1s, 2s).
/// Other non-success statuses fail immediately.
pub(crate) async fn send_with_retry<F>(label: &str, build: F) -> Result<Response, ProviderError>
where
    F: Fn() -> RequestBuilder,
{
    let mut last_error: Option<ProviderError> = None;

    for attempt in 0..MAX_RETRIES {
        if attempt > 0 {
            let delay = std::time::Duration::from_millis(1000 * (1 << (attempt - 1)));
            warn!(
                provider = label,
                attempt,
                delay_ms = delay.as_millis() as u64,
                "provider call failed, retrying"
            );
            tokio::time::sleep(delay).await;
        }

        let response = match build().send().await {
            Ok(r) => r,
            Err(e) => {
                last_error = Some(ProviderError::Http(e));
                continue;
            }
        };

        let status = response.status();

        if status.as_u16() == 429 || status.is_server_error() {
            let body = response.text().await.unwrap_or_default();
            warn!(provider = label, %status, "provider returned retryable status");
            last_error = Some(ProviderError::Api {
                status: status.as_u16(),
                message: body,
            });
            continue;
        }

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message,
            });
        }

        return Ok(response);
    }

    Err(last_error.unwrap_or(ProviderError::Exhausted {
        retries: MAX_RETRIES,
    }))
}
