//! Axum route handlers for the JD parsing API.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::AppError;
use crate::models::StructuredJD;
use crate::parsing::parse_job_description;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ParseJdRequest {
    pub jd_text: String,
}

#[derive(Debug, Serialize)]
pub struct ParseJdResponse {
    pub jd: StructuredJD,
}

/// POST /api/v1/jd/parse
///
/// Parses raw job description text into a `StructuredJD`, so callers can review or
/// edit it before running discovery.
pub async fn handle_parse_jd(
    State(state): State<AppState>,
    Json(request): Json<ParseJdRequest>,
) -> Result<Json<ParseJdResponse>, AppError> {
    if request.jd_text.trim().is_empty() {
        return Err(AppError::Validation("jd_text cannot be empty".to_string()));
    }

    let jd = parse_job_description(&request.jd_text, &state.vocabulary, &state.normalizer)?;
    info!(
        skills = jd.skills.len(),
        responsibilities = jd.responsibilities.len(),
        seniority = %jd.seniority_level,
        "JD parsed"
    );

    Ok(Json(ParseJdResponse { jd }))
}

/// A JD given either structured or as raw text. Structured wins when both are present.
pub fn resolve_jd(
    state: &AppState,
    jd: Option<StructuredJD>,
    jd_text: Option<&str>,
) -> Result<StructuredJD, AppError> {
    match (jd, jd_text) {
        (Some(jd), _) => Ok(jd.normalized(&state.normalizer)),
        (None, Some(text)) if !text.trim().is_empty() => {
            parse_job_description(text, &state.vocabulary, &state.normalizer)
        }
        _ => Err(AppError::Validation(
            "either jd or a non-empty jd_text is required".to_string(),
        )),
    }
}
