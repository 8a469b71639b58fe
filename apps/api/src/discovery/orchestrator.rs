//! Discovery Orchestrator — search → dedup → fetch → parse/score → rank.
//!
//! Queries run sequentially. Fetch and scoring run on a `JoinSet`, with at most
//! `workers` tasks holding a semaphore permit at any time. Every fetch first takes a
//! slot from the run's `FetchBudget`, so `max_downloads` bounds fetch attempts no
//! matter how many URLs the search returned.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, warn};
use uuid::Uuid;

use super::budget::FetchBudget;
use super::harvest::{harvest, Harvest};
use super::queries::build_resume_queries;
use crate::errors::AppError;
use crate::matching::{CandidateScorer, ScoreReport};
use crate::models::StructuredJD;
use crate::providers::{ArtifactFetcher, FetchError, SearchProvider};

pub const MAX_DOWNLOADS_LIMIT: usize = 50;
pub const DEFAULT_MAX_DOWNLOADS: usize = 8;
pub const DEFAULT_FETCH_WORKERS: usize = 4;
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(20);
pub const DEFAULT_RUN_TIMEOUT: Duration = Duration::from_secs(120);

/// Accepts `1..=MAX_DOWNLOADS_LIMIT`; anything else is a configuration error.
pub fn validate_max_downloads(requested: i64) -> Result<usize, AppError> {
    if requested < 1 || requested > MAX_DOWNLOADS_LIMIT as i64 {
        return Err(AppError::Config(format!(
            "max_downloads must be between 1 and {MAX_DOWNLOADS_LIMIT}, got {requested}"
        )));
    }
    Ok(requested as usize)
}

#[derive(Debug, Clone)]
pub struct DiscoveryConfig {
    pub max_downloads: usize,
    pub workers: usize,
    pub fetch_timeout: Duration,
    /// `None` disables the run deadline.
    pub run_timeout: Option<Duration>,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            max_downloads: DEFAULT_MAX_DOWNLOADS,
            workers: DEFAULT_FETCH_WORKERS,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            run_timeout: Some(DEFAULT_RUN_TIMEOUT),
        }
    }
}

impl DiscoveryConfig {
    pub fn with_max_downloads(mut self, max_downloads: usize) -> Self {
        self.max_downloads = max_downloads;
        self
    }

    pub fn validate(&self) -> Result<(), AppError> {
        validate_max_downloads(self.max_downloads as i64)?;
        if self.workers == 0 {
            return Err(AppError::Config("fetch workers must be at least 1".to_string()));
        }
        if self.fetch_timeout.is_zero() {
            return Err(AppError::Config("fetch timeout must be positive".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DiscoveryStats {
    pub search_results: usize,
    pub unique_urls: usize,
    pub fetch_attempts: usize,
    pub fetch_failures: usize,
    pub duplicate_documents: usize,
    pub scoring_failures: usize,
    pub failed_queries: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct DiscoveryOutcome {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub queries: Vec<String>,
    /// Ranked by `final_score`, ties in discovery order.
    pub reports: Vec<ScoreReport>,
    pub stats: DiscoveryStats,
    pub degraded: bool,
    pub timed_out: bool,
}

enum TaskResult {
    Scored { report: ScoreReport, checksum: String },
    FetchFailed,
    ScoreFailed,
}

pub struct DiscoveryOrchestrator {
    search: Arc<dyn SearchProvider>,
    fetcher: Arc<dyn ArtifactFetcher>,
}

impl DiscoveryOrchestrator {
    pub fn new(search: Arc<dyn SearchProvider>, fetcher: Arc<dyn ArtifactFetcher>) -> Self {
        Self { search, fetcher }
    }

    pub async fn discover(
        &self,
        jd: &StructuredJD,
        scorer: Arc<dyn CandidateScorer>,
        config: &DiscoveryConfig,
    ) -> Result<DiscoveryOutcome, AppError> {
        config.validate()?;

        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let deadline = config
            .run_timeout
            .map(|timeout| tokio::time::Instant::now() + timeout);

        let queries = build_resume_queries(jd);
        info!(%run_id, queries = queries.len(), max_downloads = config.max_downloads, "discovery started");

        let harvested = match deadline {
            Some(at) => tokio::time::timeout_at(
                at,
                harvest(self.search.as_ref(), &queries, config.max_downloads, |_| true),
            )
            .await
            .ok(),
            None => Some(
                harvest(self.search.as_ref(), &queries, config.max_downloads, |_| true).await,
            ),
        };
        let Some(harvested) = harvested.transpose()? else {
            warn!(%run_id, "discovery timed out while searching");
            return Ok(DiscoveryOutcome {
                run_id,
                started_at,
                finished_at: Utc::now(),
                queries,
                reports: Vec::new(),
                stats: DiscoveryStats::default(),
                degraded: false,
                timed_out: true,
            });
        };

        let degraded = harvested.degraded();
        let Harvest {
            hits,
            issued,
            search_results,
            failed_queries,
        } = harvested;

        let budget = Arc::new(FetchBudget::new(config.max_downloads));
        let semaphore = Arc::new(Semaphore::new(config.workers));
        let jd = Arc::new(jd.clone());
        let mut tasks = JoinSet::new();

        for (index, hit) in hits.iter().enumerate() {
            if !budget.try_acquire() {
                break;
            }
            let url = hit.url.clone();
            let fetcher = Arc::clone(&self.fetcher);
            let scorer = Arc::clone(&scorer);
            let semaphore = Arc::clone(&semaphore);
            let jd = Arc::clone(&jd);
            let fetch_timeout = config.fetch_timeout;

            tasks.spawn(async move {
                let _permit = semaphore.acquire_owned().await.ok();
                let result = fetch_and_score(&*fetcher, &*scorer, &url, &jd, fetch_timeout).await;
                (index, result)
            });
        }

        let mut timed_out = false;
        let mut stats = DiscoveryStats {
            search_results,
            unique_urls: hits.len(),
            failed_queries,
            ..Default::default()
        };
        let mut scored: Vec<(usize, ScoreReport, String)> = Vec::new();

        loop {
            let next = match deadline {
                Some(at) => match tokio::time::timeout_at(at, tasks.join_next()).await {
                    Ok(next) => next,
                    Err(_) => {
                        warn!(%run_id, pending = tasks.len(), "discovery run timed out, keeping partial results");
                        tasks.abort_all();
                        timed_out = true;
                        break;
                    }
                },
                None => tasks.join_next().await,
            };
            let Some(joined) = next else { break };

            match joined {
                Ok((index, TaskResult::Scored { report, checksum })) => {
                    scored.push((index, report, checksum))
                }
                Ok((_, TaskResult::FetchFailed)) => stats.fetch_failures += 1,
                Ok((_, TaskResult::ScoreFailed)) => stats.scoring_failures += 1,
                Err(e) => {
                    warn!(%run_id, error = %e, "discovery task failed");
                    stats.scoring_failures += 1;
                }
            }
        }
        stats.fetch_attempts = budget.used();

        // Same bytes behind several URLs: keep the earliest discovery.
        scored.sort_by_key(|(index, _, _)| *index);
        let mut checksums = HashSet::new();
        let mut reports = Vec::with_capacity(scored.len());
        for (_, report, checksum) in scored {
            if checksums.insert(checksum) {
                reports.push(report);
            } else {
                stats.duplicate_documents += 1;
            }
        }
        reports.sort_by(|a, b| b.final_score().total_cmp(&a.final_score()));

        info!(
            %run_id,
            candidates = reports.len(),
            fetch_attempts = stats.fetch_attempts,
            fetch_failures = stats.fetch_failures,
            budget_remaining = budget.remaining(),
            degraded,
            timed_out,
            "discovery finished"
        );

        Ok(DiscoveryOutcome {
            run_id,
            started_at,
            finished_at: Utc::now(),
            queries: issued,
            reports,
            stats,
            degraded,
            timed_out,
        })
    }
}

async fn fetch_and_score(
    fetcher: &dyn ArtifactFetcher,
    scorer: &dyn CandidateScorer,
    url: &str,
    jd: &StructuredJD,
    fetch_timeout: Duration,
) -> TaskResult {
    let fetched = match tokio::time::timeout(fetch_timeout, fetcher.fetch(url)).await {
        Ok(result) => result,
        Err(_) => Err(FetchError::Timeout {
            url: url.to_string(),
            secs: fetch_timeout.as_secs(),
        }),
    };

    let artifact = match fetched {
        Ok(artifact) => artifact,
        Err(e) => {
            warn!(url, error = %e, "fetch failed, skipping candidate");
            return TaskResult::FetchFailed;
        }
    };

    match scorer.parse_and_score(&artifact, jd).await {
        Ok(report) => TaskResult::Scored {
            report,
            checksum: artifact.checksum,
        },
        Err(e) => {
            warn!(url, error = %e, "parse/score failed, skipping candidate");
            TaskResult::ScoreFailed
        }
    }
}
