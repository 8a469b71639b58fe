//! SerpAPI-compatible web search client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::{send_with_retry, ProviderError, SearchHit, SearchProvider};

/// Message the provider returns (with HTTP 200) when a query simply has no results.
const NO_RESULTS_MARKER: &str = "hasn't returned any results";

#[derive(Debug, Deserialize)]
struct SerpResponse {
    #[serde(default)]
    organic_results: Vec<SerpResult>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SerpResult {
    #[serde(default)]
    title: String,
    #[serde(default)]
    snippet: String,
    link: Option<String>,
}

#[derive(Clone)]
pub struct HttpSearchProvider {
    client: Client,
    base_url: String,
    api_key: String,
    results_per_query: u32,
}

impl HttpSearchProvider {
    pub fn new(
        base_url: String,
        api_key: String,
        results_per_query: u32,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url,
            api_key,
            results_per_query,
        })
    }
}

#[async_trait]
impl SearchProvider for HttpSearchProvider {
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>, ProviderError> {
        let num = self.results_per_query.to_string();
        let response = send_with_retry("search", || {
            self.client.get(&self.base_url).query(&[
                ("engine", "google"),
                ("q", query),
                ("num", num.as_str()),
                ("api_key", self.api_key.as_str()),
            ])
        })
        .await?;

        let body = response.text().await?;
        let hits = parse_search_response(&body)?;
        debug!(query, hits = hits.len(), "search completed");
        Ok(hits)
    }
}

/// Parses a provider response body into hits. Results without a link are dropped.
fn parse_search_response(body: &str) -> Result<Vec<SearchHit>, ProviderError> {
    let parsed: SerpResponse = serde_json::from_str(body)
        .map_err(|e| ProviderError::InvalidResponse(format!("search response: {e}")))?;

    if let Some(error) = parsed.error {
        if parsed.organic_results.is_empty() && !error.contains(NO_RESULTS_MARKER) {
            return Err(ProviderError::Api {
                status: 200,
                message: error,
            });
        }
    }

    Ok(parsed
        .organic_results
        .into_iter()
        .filter_map(|r| {
            r.link.map(|url| SearchHit {
                title: r.title,
                snippet: r.snippet,
                url,
            })
        })
        .collect())
}
