//! Sequential query execution shared by resume and profile discovery.

use tracing::{info, warn};

use super::dedup::UrlDeduper;
use crate::errors::AppError;
use crate::providers::{ProviderError, SearchHit, SearchProvider};

/// Unique hits in first-seen order plus per-query bookkeeping.
#[derive(Debug, Default)]
pub struct Harvest {
    pub hits: Vec<SearchHit>,
    pub issued: Vec<String>,
    pub search_results: usize,
    pub failed_queries: usize,
}

impl Harvest {
    /// Some queries failed but at least one answered.
    pub fn degraded(&self) -> bool {
        self.failed_queries > 0 && self.failed_queries < self.issued.len()
    }
}

/// Runs `queries` one at a time until `limit` unique hits accepted by `keep` are held.
///
/// Fails with `ProviderUnavailable` only when every issued query failed.
pub async fn harvest<F>(
    search: &dyn SearchProvider,
    queries: &[String],
    limit: usize,
    keep: F,
) -> Result<Harvest, AppError>
where
    F: Fn(&SearchHit) -> bool,
{
    let mut out = Harvest::default();
    let mut deduper = UrlDeduper::new();
    let mut last_error: Option<ProviderError> = None;

    for query in queries {
        if out.hits.len() >= limit {
            break;
        }
        out.issued.push(query.clone());

        let hits = match search.search(query).await {
            Ok(hits) => hits,
            Err(e) => {
                warn!(query = %query, error = %e, "search query failed");
                out.failed_queries += 1;
                last_error = Some(e);
                continue;
            }
        };

        out.search_results += hits.len();
        let before = out.hits.len();
        for hit in hits {
            if out.hits.len() >= limit {
                break;
            }
            if keep(&hit) && deduper.admit(&hit.url).is_some() {
                out.hits.push(hit);
            }
        }
        info!(query = %query, new_urls = out.hits.len() - before, "search query done");
    }

    if !out.issued.is_empty() && out.failed_queries == out.issued.len() {
        if let Some(e) = last_error {
            return Err(e.into());
        }
    }
    Ok(out)
}
