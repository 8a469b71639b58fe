//! Axum route handlers for direct JD/candidate scoring.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::matching::ScoreReport;
use crate::models::{StructuredCandidate, StructuredJD};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ScoreRequest {
    pub jd: StructuredJD,
    pub candidate: StructuredCandidate,
}

#[derive(Debug, Serialize)]
pub struct ScoreResponse {
    pub report: ScoreReport,
}

/// POST /api/v1/match/score
///
/// Scores an already structured candidate against a structured JD. Both sides are
/// re-normalized here; callers may send skills in any case or alias form.
pub async fn handle_score(
    State(state): State<AppState>,
    Json(request): Json<ScoreRequest>,
) -> Result<Json<ScoreResponse>, AppError> {
    if request.candidate.name.trim().is_empty() {
        return Err(AppError::Validation("candidate.name cannot be empty".to_string()));
    }

    let jd = request.jd.normalized(&state.normalizer);
    let candidate = request.candidate.normalized(&state.normalizer);
    let source_url = candidate.source_url.clone();

    let report = state
        .engine
        .score(&jd, &candidate, source_url.as_deref())
        .await;

    Ok(Json(ScoreResponse { report }))
}
