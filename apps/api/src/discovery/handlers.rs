//! Axum route handlers for the discovery API.

use axum::{extract::State, Json};
use serde::Deserialize;
use tracing::info;

use crate::discovery::export::maybe_export;
use crate::discovery::orchestrator::validate_max_downloads;
use crate::discovery::{DiscoveryOutcome, SnippetOutcome};
use crate::errors::AppError;
use crate::models::StructuredJD;
use crate::parsing::handlers::resolve_jd;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct DiscoverResumesRequest {
    #[serde(default)]
    pub jd: Option<StructuredJD>,
    #[serde(default)]
    pub jd_text: Option<String>,
    #[serde(default)]
    pub max_downloads: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct DiscoverProfilesRequest {
    #[serde(default)]
    pub jd: Option<StructuredJD>,
    #[serde(default)]
    pub jd_text: Option<String>,
}

/// POST /api/v1/discover/resumes
///
/// Searches for public resumes, downloads up to `max_downloads` of them and returns
/// them scored against the JD, best first.
pub async fn handle_discover_resumes(
    State(state): State<AppState>,
    Json(request): Json<DiscoverResumesRequest>,
) -> Result<Json<DiscoveryOutcome>, AppError> {
    let mut config = state.discovery.clone();
    if let Some(requested) = request.max_downloads {
        config.max_downloads = validate_max_downloads(requested)?;
    }
    let jd = resolve_jd(&state, request.jd, request.jd_text.as_deref())?;

    info!(skills = jd.skills.len(), max_downloads = config.max_downloads, "resume discovery requested");
    let outcome = state
        .orchestrator
        .discover(&jd, state.scorer.clone(), &config)
        .await?;

    maybe_export(state.config.results_dir.as_deref(), "resumes", outcome.run_id, &outcome).await;
    Ok(Json(outcome))
}

/// POST /api/v1/discover/linkedin
///
/// Finds public profile pages and scores them from search snippets only.
pub async fn handle_discover_profiles(
    State(state): State<AppState>,
    Json(request): Json<DiscoverProfilesRequest>,
) -> Result<Json<SnippetOutcome>, AppError> {
    let jd = resolve_jd(&state, request.jd, request.jd_text.as_deref())?;

    let outcome = state.snippets.discover_from_snippets(&jd).await?;

    maybe_export(state.config.results_dir.as_deref(), "linkedin", outcome.run_id, &outcome).await;
    Ok(Json(outcome))
}
