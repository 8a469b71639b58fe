use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::errors::AppError;
use crate::matching::normalize::SkillVocabulary;
use crate::matching::scoring::{ScoreReport, ScoringEngine};
use crate::models::StructuredJD;
use crate::parsing::ResumeParser;
use crate::providers::Artifact;

/// Turns a fetched document into a score against a JD.
///
/// Discovery depends only on this trait, so the parse/score strategy can change
/// without touching orchestration.
#[async_trait]
pub trait CandidateScorer: Send + Sync {
    async fn parse_and_score(
        &self,
        artifact: &Artifact,
        jd: &StructuredJD,
    ) -> Result<ScoreReport, AppError>;
}

/// Default scorer: `ResumeParser` for extraction, `ScoringEngine` for the report.
///
/// The resume text is also searched for the JD's own skills, so terms outside the
/// built-in vocabulary match the same way they do for search snippets.
pub struct ResumeScorer {
    parser: Arc<dyn ResumeParser>,
    vocabulary: Arc<SkillVocabulary>,
    engine: Arc<ScoringEngine>,
}

impl ResumeScorer {
    pub fn new(
        parser: Arc<dyn ResumeParser>,
        vocabulary: Arc<SkillVocabulary>,
        engine: Arc<ScoringEngine>,
    ) -> Self {
        Self {
            parser,
            vocabulary,
            engine,
        }
    }
}

#[async_trait]
impl CandidateScorer for ResumeScorer {
    async fn parse_and_score(
        &self,
        artifact: &Artifact,
        jd: &StructuredJD,
    ) -> Result<ScoreReport, AppError> {
        // PDF extraction is CPU-bound.
        let parser = Arc::clone(&self.parser);
        let owned = artifact.clone();
        let candidate = tokio::task::spawn_blocking(move || parser.parse(&owned))
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("parser task failed: {e}")))??;

        let mut candidate = candidate.normalized(self.engine.normalizer());
        let requested = self
            .vocabulary
            .extract(&candidate.raw_text, self.engine.normalizer(), &jd.skills);
        candidate.skills.extend(requested);

        let report = self.engine.score(jd, &candidate, Some(&artifact.url)).await;

        debug!(
            url = %artifact.url,
            candidate = %report.candidate_name(),
            final_score = report.final_score(),
            text_chars = report.cleaned_text().chars().count(),
            "candidate scored"
        );
        Ok(report)
    }
}
