//! Scoring Engine — compares a structured JD with a structured candidate.
//!
//! final_score = w.skill * skill_score + w.embed * embed_score + w.resp * resp_score
//!
//! - skill_score: |jd ∩ candidate| / |jd| over normalized skill sets
//! - embed_score: cosine(embed(jd text), embed(candidate text)) rescaled to [0, 1]
//! - resp_score:  mean per-responsibility coverage of key tokens in the candidate text
//!
//! The only I/O is the injected `Embedder`; an embedding failure degrades to
//! embed_score = 0 with an explicit flag rather than failing the report.

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::errors::AppError;
use crate::matching::normalize::{clean_text, is_stopword, tokenize, SkillNormalizer};
use crate::models::{StructuredCandidate, StructuredJD};
use crate::providers::Embedder;

/// Cleaned candidate text shorter than this is scored but flagged `short_text`.
pub const MIN_TEXT_CHARS: usize = 200;

/// Tolerance on `skill + embed + resp == 1`.
pub const WEIGHT_EPSILON: f64 = 1e-6;

/// Shortest token that may fuzzy-match by prefix ("deploy" ~ "deployment").
const MIN_FUZZY_TOKEN_LEN: usize = 4;

/// Weights of the final linear combination.
///
/// Default: skill 0.5, embed 0.3, resp 0.2. Overridable through `SCORE_WEIGHT_*`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringWeights {
    pub skill: f64,
    pub embed: f64,
    pub resp: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            skill: 0.5,
            embed: 0.3,
            resp: 0.2,
        }
    }
}

impl ScoringWeights {
    pub fn new(skill: f64, embed: f64, resp: f64) -> Result<Self, AppError> {
        let weights = Self { skill, embed, resp };
        weights.validate()?;
        Ok(weights)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        let all = [self.skill, self.embed, self.resp];
        if all.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(AppError::Config(format!(
                "score weights must be finite and non-negative, got {self:?}"
            )));
        }
        let sum: f64 = all.iter().sum();
        if (sum - 1.0).abs() > WEIGHT_EPSILON {
            return Err(AppError::Config(format!(
                "score weights must sum to 1, got {sum}"
            )));
        }
        Ok(())
    }

    pub fn combine(&self, skill: f64, embed: f64, resp: f64) -> f64 {
        self.skill * skill + self.embed * embed + self.resp * resp
    }
}

/// Conditions worth surfacing next to a score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreFlag {
    ShortText,
    EmbeddingUnavailable,
    NoJdSkills,
}

/// Result of scoring one candidate. Immutable once built; fields are read through
/// accessors. Serializes to a flat record of string/float/array fields.
#[derive(Debug, Clone, Serialize)]
pub struct ScoreReport {
    candidate_name: String,
    source_url: Option<String>,
    path: Option<String>,
    matched_skills: BTreeSet<String>,
    missing_skills: BTreeSet<String>,
    skill_score: f64,
    embed_score: f64,
    resp_score: f64,
    final_score: f64,
    cleaned_text: String,
    flags: Vec<ScoreFlag>,
}

impl ScoreReport {
    pub fn candidate_name(&self) -> &str {
        &self.candidate_name
    }

    pub fn source_url(&self) -> Option<&str> {
        self.source_url.as_deref()
    }

    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    pub fn matched_skills(&self) -> &BTreeSet<String> {
        &self.matched_skills
    }

    pub fn missing_skills(&self) -> &BTreeSet<String> {
        &self.missing_skills
    }

    pub fn skill_score(&self) -> f64 {
        self.skill_score
    }

    pub fn embed_score(&self) -> f64 {
        self.embed_score
    }

    pub fn resp_score(&self) -> f64 {
        self.resp_score
    }

    pub fn final_score(&self) -> f64 {
        self.final_score
    }

    pub fn cleaned_text(&self) -> &str {
        &self.cleaned_text
    }

    pub fn flags(&self) -> &[ScoreFlag] {
        &self.flags
    }
}

/// Skill attribution: (matched, missing, skill_score).
pub fn skill_overlap(
    jd_skills: &BTreeSet<String>,
    candidate_skills: &BTreeSet<String>,
) -> (BTreeSet<String>, BTreeSet<String>, f64) {
    let (matched, missing): (BTreeSet<String>, BTreeSet<String>) = jd_skills
        .iter()
        .cloned()
        .partition(|skill| candidate_skills.contains(skill));

    let score = if jd_skills.is_empty() {
        0.0
    } else {
        matched.len() as f64 / jd_skills.len() as f64
    };

    (matched, missing, score)
}

/// Plain cosine similarity. Returns 0 for empty, mismatched or zero-norm vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.is_empty() || a.len() != b.len() {
        return 0.0;
    }
    let (mut dot, mut norm_a, mut norm_b) = (0.0_f64, 0.0_f64, 0.0_f64);
    for (x, y) in a.iter().zip(b) {
        let (x, y) = (*x as f64, *y as f64);
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

/// Maps cosine from [-1, 1] onto [0, 1].
pub fn rescale_cosine(cos: f64) -> f64 {
    ((cos + 1.0) / 2.0).clamp(0.0, 1.0)
}

fn key_tokens(line: &str) -> BTreeSet<String> {
    tokenize(line)
        .into_iter()
        .filter(|t| t.chars().count() >= 3 && !is_stopword(t))
        .collect()
}

fn token_present(token: &str, candidate_tokens: &HashSet<String>) -> bool {
    if candidate_tokens.contains(token) {
        return true;
    }
    if token.len() < MIN_FUZZY_TOKEN_LEN {
        return false;
    }
    candidate_tokens.iter().any(|c| {
        c.len() >= MIN_FUZZY_TOKEN_LEN && (c.starts_with(token) || token.starts_with(c.as_str()))
    })
}

/// Mean fraction of each responsibility's key tokens found in the candidate text.
/// Lines without key tokens are ignored; no scorable lines gives 0.
pub fn responsibility_coverage(responsibilities: &[String], candidate_text: &str) -> f64 {
    let candidate_tokens: HashSet<String> = tokenize(candidate_text).into_iter().collect();
    if candidate_tokens.is_empty() {
        return 0.0;
    }

    let coverages: Vec<f64> = responsibilities
        .iter()
        .map(|line| key_tokens(line))
        .filter(|tokens| !tokens.is_empty())
        .map(|tokens| {
            let hits = tokens
                .iter()
                .filter(|t| token_present(t, &candidate_tokens))
                .count();
            hits as f64 / tokens.len() as f64
        })
        .collect();

    if coverages.is_empty() {
        return 0.0;
    }
    coverages.iter().sum::<f64>() / coverages.len() as f64
}

pub struct ScoringEngine {
    weights: ScoringWeights,
    normalizer: Arc<SkillNormalizer>,
    embedder: Arc<dyn Embedder>,
}

impl ScoringEngine {
    pub fn new(
        weights: ScoringWeights,
        normalizer: Arc<SkillNormalizer>,
        embedder: Arc<dyn Embedder>,
    ) -> Result<Self, AppError> {
        weights.validate()?;
        Ok(Self {
            weights,
            normalizer,
            embedder,
        })
    }

    pub fn normalizer(&self) -> &SkillNormalizer {
        &self.normalizer
    }

    pub fn embedder_name(&self) -> &'static str {
        self.embedder.name()
    }

    /// Scores `candidate` against `jd`. Never fails; degraded inputs produce zero
    /// sub-scores and flags.
    pub async fn score(
        &self,
        jd: &StructuredJD,
        candidate: &StructuredCandidate,
        source_url: Option<&str>,
    ) -> ScoreReport {
        let jd_skills = self.normalizer.normalize_set(&jd.skills);
        let candidate_skills = self.normalizer.normalize_set(&candidate.skills);
        let cleaned_text = clean_text(&candidate.raw_text);

        let mut flags = Vec::new();
        if jd_skills.is_empty() {
            flags.push(ScoreFlag::NoJdSkills);
        }
        if cleaned_text.chars().count() < MIN_TEXT_CHARS {
            flags.push(ScoreFlag::ShortText);
        }

        let (matched_skills, missing_skills, skill_score) =
            skill_overlap(&jd_skills, &candidate_skills);

        let embed_score = match self.semantic_score(jd, &cleaned_text).await {
            Ok(score) => score,
            Err(e) => {
                warn!(candidate = %candidate.name, error = %e, "embedding unavailable, embed_score = 0");
                flags.push(ScoreFlag::EmbeddingUnavailable);
                0.0
            }
        };

        let resp_score = responsibility_coverage(&jd.responsibilities, &cleaned_text);
        let final_score = self.weights.combine(skill_score, embed_score, resp_score);

        ScoreReport {
            candidate_name: candidate.name.clone(),
            source_url: source_url
                .map(str::to_string)
                .or_else(|| candidate.source_url.clone()),
            path: candidate.path.clone(),
            matched_skills,
            missing_skills,
            skill_score,
            embed_score,
            resp_score,
            final_score,
            cleaned_text,
            flags,
        }
    }

    async fn semantic_score(
        &self,
        jd: &StructuredJD,
        cleaned_text: &str,
    ) -> Result<f64, crate::providers::ProviderError> {
        let jd_text = jd.embedding_text();
        if jd_text.trim().is_empty() || cleaned_text.is_empty() {
            return Ok(0.0);
        }

        let (jd_vec, candidate_vec) = tokio::join!(
            self.embedder.embed(&jd_text),
            self.embedder.embed(cleaned_text)
        );
        let (jd_vec, candidate_vec) = (jd_vec?, candidate_vec?);

        // Degenerate vectors score 0, not the 0.5 a rescaled zero cosine gives.
        let degenerate = |v: &[f32]| v.is_empty() || v.iter().all(|x| *x == 0.0);
        if degenerate(&jd_vec) || degenerate(&candidate_vec) || jd_vec.len() != candidate_vec.len() {
            return Ok(0.0);
        }
        Ok(rescale_cosine(cosine_similarity(&jd_vec, &candidate_vec)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::HashingEmbedder;
    use crate::test_support::{candidate, jd_with_skills, skills, FailingEmbedder};

    fn engine() -> ScoringEngine {
        ScoringEngine::new(
            ScoringWeights::default(),
            Arc::new(SkillNormalizer::default()),
            Arc::new(HashingEmbedder::default()),
        )
        .unwrap()
    }

    #[test]
    fn test_default_weights_are_valid() {
        assert!(ScoringWeights::default().validate().is_ok());
    }

    #[test]
    fn test_weights_must_sum_to_one() {
        let err = ScoringWeights::new(0.5, 0.5, 0.5).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn test_negative_weight_rejected() {
        assert!(ScoringWeights::new(1.2, -0.2, 0.0).is_err());
    }

    #[test]
    fn test_weights_tolerate_float_rounding() {
        assert!(ScoringWeights::new(0.1 + 0.2, 0.3, 0.4).is_ok());
    }

    #[test]
    fn test_skill_overlap_example() {
        let (matched, missing, score) =
            skill_overlap(&skills(&["python", "sql", "docker"]), &skills(&["python", "sql"]));
        assert_eq!(matched, skills(&["python", "sql"]));
        assert_eq!(missing, skills(&["docker"]));
        assert!((score - 0.667).abs() < 0.001, "score was {score}");
    }

    #[test]
    fn test_skill_overlap_partitions_jd_skills() {
        let jd = skills(&["rust", "go", "kafka", "aws"]);
        let cases = [
            skills(&[]),
            skills(&["rust"]),
            skills(&["rust", "go", "kafka", "aws", "java"]),
            skills(&["java"]),
        ];
        for candidate in cases {
            let (matched, missing, score) = skill_overlap(&jd, &candidate);
            let union: BTreeSet<String> = matched.union(&missing).cloned().collect();
            assert_eq!(union, jd);
            assert!(matched.is_disjoint(&missing));
            assert_eq!(score == 0.0, matched.is_empty());
            assert_eq!(score == 1.0, missing.is_empty());
        }
    }

    #[test]
    fn test_empty_jd_skills_scores_zero() {
        let (matched, missing, score) = skill_overlap(&BTreeSet::new(), &skills(&["python"]));
        assert!(matched.is_empty() && missing.is_empty());
        assert_eq!(score, 0.0);
    }

    #[test]
    fn test_cosine_edge_cases() {
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[1.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
        assert!((cosine_similarity(&[1.0, 2.0], &[2.0, 4.0]) - 1.0).abs() < 1e-9);
        assert!((cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]) + 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_rescale_cosine_bounds() {
        assert_eq!(rescale_cosine(-1.0), 0.0);
        assert_eq!(rescale_cosine(0.0), 0.5);
        assert_eq!(rescale_cosine(1.0), 1.0);
        assert_eq!(rescale_cosine(1.5), 1.0);
    }

    #[test]
    fn test_responsibility_coverage_counts_partial_overlap() {
        let resps = vec![
            "Design scalable data pipelines".to_string(),
            "Mentor junior engineers".to_string(),
        ];
        let text = "I designed and built scalable pipelines for data teams";
        let score = responsibility_coverage(&resps, text);
        // line 1: design~designed, scalable, data, pipelines -> 4/4; line 2: 0/3
        assert!((score - 0.5).abs() < 1e-9, "score was {score}");
    }

    #[test]
    fn test_responsibility_coverage_fuzzy_prefix() {
        let resps = vec!["Deploy services".to_string()];
        let score = responsibility_coverage(&resps, "deployment of microservices");
        // deploy ~ deployment; "services" is not a prefix of "microservices"
        assert!((score - 0.5).abs() < 1e-9, "score was {score}");
    }

    #[test]
    fn test_responsibility_coverage_empty_inputs() {
        assert_eq!(responsibility_coverage(&[], "some text"), 0.0);
        assert_eq!(responsibility_coverage(&["Build APIs".to_string()], ""), 0.0);
        assert_eq!(responsibility_coverage(&["the and of".to_string()], "text"), 0.0);
    }

    #[tokio::test]
    async fn test_score_example_attribution() {
        let jd = jd_with_skills(&["python", "sql", "docker"]);
        let cand = candidate("Ada", "Python and SQL developer", &["python", "sql"]);
        let report = engine().score(&jd, &cand, Some("https://a.com/ada.pdf")).await;

        assert_eq!(report.matched_skills(), &skills(&["python", "sql"]));
        assert_eq!(report.missing_skills(), &skills(&["docker"]));
        assert!((report.skill_score() - 0.667).abs() < 0.001);
        assert_eq!(report.source_url(), Some("https://a.com/ada.pdf"));
        assert!(report.flags().contains(&ScoreFlag::ShortText));
    }

    #[tokio::test]
    async fn test_score_normalizes_candidate_skills() {
        let jd = jd_with_skills(&["javascript", "kubernetes"]);
        let cand = candidate("Lin", "JS on K8s", &["JS", "K8s"]);
        let report = engine().score(&jd, &cand, None).await;
        assert_eq!(report.skill_score(), 1.0);
        assert!(report.missing_skills().is_empty());
    }

    #[tokio::test]
    async fn test_identical_text_scores_near_one() {
        let text = "Design scalable data pipelines in python and sql. ".repeat(10);
        let mut jd = jd_with_skills(&["python", "sql"]);
        jd.responsibilities = vec![text.clone()];
        jd.keywords = BTreeSet::new();
        let cand = candidate("Twin", &text, &["python", "sql"]);

        let report = engine().score(&jd, &cand, None).await;
        assert!(report.skill_score() == 1.0);
        assert!(report.resp_score() == 1.0);
        assert!(report.embed_score() > 0.95, "embed was {}", report.embed_score());
        assert!(report.final_score() > 0.98 && report.final_score() <= 1.0 + 1e-9);
    }

    #[tokio::test]
    async fn test_empty_candidate_text_degrades_to_zero() {
        let jd = jd_with_skills(&["python"]);
        let cand = candidate("Empty", "   ", &[]);
        let report = engine().score(&jd, &cand, None).await;
        assert_eq!(report.embed_score(), 0.0);
        assert_eq!(report.resp_score(), 0.0);
        assert_eq!(report.final_score(), 0.0);
        assert!(report.flags().contains(&ScoreFlag::ShortText));
    }

    #[tokio::test]
    async fn test_empty_jd_skills_flagged() {
        let jd = jd_with_skills(&[]);
        let cand = candidate("Any", "python developer", &["python"]);
        let report = engine().score(&jd, &cand, None).await;
        assert_eq!(report.skill_score(), 0.0);
        assert!(report.flags().contains(&ScoreFlag::NoJdSkills));
    }

    #[tokio::test]
    async fn test_embedding_failure_is_flagged_not_fatal() {
        let engine = ScoringEngine::new(
            ScoringWeights::default(),
            Arc::new(SkillNormalizer::default()),
            Arc::new(FailingEmbedder),
        )
        .unwrap();
        let jd = jd_with_skills(&["python"]);
        let cand = candidate("Ada", "python", &["python"]);

        let report = engine.score(&jd, &cand, None).await;
        assert_eq!(report.embed_score(), 0.0);
        assert!(report.flags().contains(&ScoreFlag::EmbeddingUnavailable));
        assert!((report.final_score() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_engine_rejects_invalid_weights() {
        let weights = ScoringWeights {
            skill: 0.9,
            embed: 0.9,
            resp: 0.0,
        };
        let result = ScoringEngine::new(
            weights,
            Arc::new(SkillNormalizer::default()),
            Arc::new(HashingEmbedder::default()),
        );
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_report_serializes_flat() {
        let jd = jd_with_skills(&["python"]);
        let cand = candidate("Ada", "python", &["python"]);
        let report = engine().score(&jd, &cand, None).await;
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["candidate_name"], "Ada");
        assert_eq!(value["matched_skills"][0], "python");
        assert_eq!(value["flags"][0], "short_text");
        assert!(value["final_score"].is_f64());
    }
}
