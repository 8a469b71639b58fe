use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::discovery::orchestrator::{
    DEFAULT_FETCH_TIMEOUT, DEFAULT_FETCH_WORKERS, DEFAULT_MAX_DOWNLOADS, DEFAULT_RUN_TIMEOUT,
};
use crate::discovery::snippets::DEFAULT_MAX_PROFILES;
use crate::discovery::DiscoveryConfig;
use crate::providers::fetcher::DEFAULT_MAX_ARTIFACT_BYTES;
use crate::matching::ScoringWeights;

pub const DEFAULT_SEARCH_API_URL: &str = "https://serpapi.com/search";
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";

/// Application configuration loaded from environment variables.
/// Startup fails if a required variable is missing or any value is malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    pub search_api_url: String,
    pub search_api_key: String,
    pub search_results_per_query: u32,
    /// Unset selects the local hashing embedder.
    pub embedding_api_url: Option<String>,
    pub embedding_api_key: Option<String>,
    pub embedding_model: String,
    pub artifacts_dir: PathBuf,
    /// Unset disables JSON export of discovery runs.
    pub results_dir: Option<PathBuf>,
    pub default_max_downloads: usize,
    pub fetch_workers: usize,
    pub fetch_timeout_secs: u64,
    /// 0 disables the run deadline.
    pub discovery_timeout_secs: u64,
    pub max_profiles: usize,
    pub max_artifact_bytes: usize,
    pub weights: ScoringWeights,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let defaults = ScoringWeights::default();
        let weights = ScoringWeights::new(
            env_or("SCORE_WEIGHT_SKILL", defaults.skill)?,
            env_or("SCORE_WEIGHT_EMBED", defaults.embed)?,
            env_or("SCORE_WEIGHT_RESP", defaults.resp)?,
        )
        .context("invalid SCORE_WEIGHT_* configuration")?;

        let config = Config {
            port: env_or("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            search_api_url: optional_env("SEARCH_API_URL")
                .unwrap_or_else(|| DEFAULT_SEARCH_API_URL.to_string()),
            search_api_key: require_env("SEARCH_API_KEY")?,
            search_results_per_query: env_or("SEARCH_RESULTS_PER_QUERY", 10)?,
            embedding_api_url: optional_env("EMBEDDING_API_URL"),
            embedding_api_key: optional_env("EMBEDDING_API_KEY"),
            embedding_model: optional_env("EMBEDDING_MODEL")
                .unwrap_or_else(|| DEFAULT_EMBEDDING_MODEL.to_string()),
            artifacts_dir: optional_env("ARTIFACTS_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("./artifacts")),
            results_dir: optional_env("RESULTS_DIR").map(PathBuf::from),
            default_max_downloads: env_or("DEFAULT_MAX_DOWNLOADS", DEFAULT_MAX_DOWNLOADS)?,
            fetch_workers: env_or("FETCH_WORKERS", DEFAULT_FETCH_WORKERS)?,
            fetch_timeout_secs: env_or("FETCH_TIMEOUT_SECS", DEFAULT_FETCH_TIMEOUT.as_secs())?,
            discovery_timeout_secs: env_or("DISCOVERY_TIMEOUT_SECS", DEFAULT_RUN_TIMEOUT.as_secs())?,
            max_profiles: env_or("MAX_PROFILES", DEFAULT_MAX_PROFILES)?,
            max_artifact_bytes: env_or("MAX_ARTIFACT_BYTES", DEFAULT_MAX_ARTIFACT_BYTES)?,
            weights,
        };

        config
            .discovery()
            .validate()
            .context("invalid discovery configuration")?;
        Ok(config)
    }

    /// Per-run discovery settings; requests may lower or raise `max_downloads`.
    pub fn discovery(&self) -> DiscoveryConfig {
        DiscoveryConfig {
            max_downloads: self.default_max_downloads,
            workers: self.fetch_workers,
            fetch_timeout: Duration::from_secs(self.fetch_timeout_secs),
            run_timeout: (self.discovery_timeout_secs > 0)
                .then(|| Duration::from_secs(self.discovery_timeout_secs)),
        }
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

/// Set and non-blank.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional_env(key) {
        Some(raw) => parse_value(key, &raw),
        None => Ok(default),
    }
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.trim()
        .parse::<T>()
        .with_context(|| format!("{key} has an invalid value: '{raw}'"))
}

#[cfg(test)]
impl Config {
    pub fn for_tests(results_dir: Option<PathBuf>) -> Self {
        Config {
            port: 0,
            rust_log: "info".to_string(),
            search_api_url: DEFAULT_SEARCH_API_URL.to_string(),
            search_api_key: "test".to_string(),
            search_results_per_query: 10,
            embedding_api_url: None,
            embedding_api_key: None,
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            artifacts_dir: PathBuf::from("./artifacts"),
            results_dir,
            default_max_downloads: 8,
            fetch_workers: 4,
            fetch_timeout_secs: 20,
            discovery_timeout_secs: 120,
            max_profiles: DEFAULT_MAX_PROFILES,
            max_artifact_bytes: DEFAULT_MAX_ARTIFACT_BYTES,
            weights: ScoringWeights::default(),
        }
    }
}
