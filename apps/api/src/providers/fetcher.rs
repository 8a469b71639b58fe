//! Document download. Bodies are kept in memory for parsing and written to the
//! artifacts directory under their checksum.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use bytes::BytesMut;
use reqwest::{header, Client};
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use super::{Artifact, ArtifactFetcher, FetchError};

pub const DEFAULT_MAX_ARTIFACT_BYTES: usize = 10 * 1024 * 1024;

const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

pub fn content_checksum(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

pub struct HttpArtifactFetcher {
    client: Client,
    artifacts_dir: PathBuf,
    max_bytes: usize,
}

impl HttpArtifactFetcher {
    pub fn new(artifacts_dir: PathBuf, timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            artifacts_dir,
            max_bytes: DEFAULT_MAX_ARTIFACT_BYTES,
        })
    }

    pub fn with_max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    async fn persist(&self, artifact: &Artifact) -> Result<PathBuf, FetchError> {
        tokio::fs::create_dir_all(&self.artifacts_dir).await?;

        let file_name = artifact_file_name(artifact);
        let dir = self.artifacts_dir.clone();
        let bytes = artifact.bytes.clone();

        tokio::task::spawn_blocking(move || write_atomically(&dir, &file_name, &bytes))
            .await
            .map_err(|e| FetchError::Io(std::io::Error::new(std::io::ErrorKind::Other, e)))?
    }
}

#[async_trait]
impl ArtifactFetcher for HttpArtifactFetcher {
    async fn fetch(&self, url: &str) -> Result<Artifact, FetchError> {
        info!(url, "fetching artifact");

        let mut response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        if response
            .content_length()
            .is_some_and(|len| len as usize > self.max_bytes)
        {
            return Err(FetchError::TooLarge {
                url: url.to_string(),
                limit: self.max_bytes,
            });
        }

        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string());

        // Content-Length is absent for chunked bodies; enforce the cap while reading.
        let mut body = BytesMut::new();
        while let Some(chunk) = response.chunk().await? {
            if body.len() + chunk.len() > self.max_bytes {
                return Err(FetchError::TooLarge {
                    url: url.to_string(),
                    limit: self.max_bytes,
                });
            }
            body.extend_from_slice(&chunk);
        }

        let artifact = Artifact::from_bytes(url, content_type, body.freeze());
        let path = self.persist(&artifact).await?;
        debug!(url, path = %path.display(), bytes = artifact.bytes.len(), "artifact stored");

        Ok(artifact.with_path(path))
    }
}

/// `{checksum prefix}.{ext}`; the extension comes from the content type, then the URL.
fn artifact_file_name(artifact: &Artifact) -> String {
    let ext = match artifact.content_type.as_deref() {
        Some(ct) if ct.contains("pdf") => "pdf",
        Some(ct) if ct.contains("html") => "html",
        Some(ct) if ct.starts_with("text/") => "txt",
        _ => artifact
            .url
            .rsplit('/')
            .next()
            .and_then(|segment| segment.split(['?', '#']).next())
            .and_then(|segment| segment.rsplit_once('.').map(|(_, ext)| ext))
            .filter(|ext| !ext.is_empty() && ext.len() <= 5 && ext.chars().all(|c| c.is_ascii_alphanumeric()))
            .unwrap_or("bin"),
    };
    format!("{}.{}", &artifact.checksum[..16], ext.to_lowercase())
}

fn write_atomically(dir: &Path, file_name: &str, bytes: &[u8]) -> Result<PathBuf, FetchError> {
    let target = dir.join(file_name);
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.persist(&target).map_err(|e| FetchError::Io(e.error))?;
    Ok(target)
}
