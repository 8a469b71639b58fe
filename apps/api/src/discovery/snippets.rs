//! Profile discovery from search result snippets alone. Nothing is downloaded; the
//! score is skill overlap only.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use reqwest::Url;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use super::harvest::harvest;
use super::queries::build_profile_queries;
use crate::errors::AppError;
use crate::matching::normalize::{SkillNormalizer, SkillVocabulary};
use crate::models::StructuredJD;
use crate::providers::{SearchHit, SearchProvider};

pub const DEFAULT_MAX_PROFILES: usize = 20;
const HEADLINE_FALLBACK_CHARS: usize = 120;
const TITLE_SEPARATORS: &[&str] = &[" - ", " – ", " — ", " | "];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SnippetScoreReport {
    pub name: String,
    pub headline: String,
    pub skills: BTreeSet<String>,
    pub matched_skills: BTreeSet<String>,
    pub missing_skills: BTreeSet<String>,
    /// Integer percent of JD skills seen in the title or snippet.
    pub match_score: u32,
    pub url: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SnippetOutcome {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub queries: Vec<String>,
    pub reports: Vec<SnippetScoreReport>,
    pub search_results: usize,
    pub failed_queries: usize,
    pub degraded: bool,
}

/// Public profile pages only: `linkedin.com/in/<slug>` on any subdomain.
pub fn is_linkedin_profile(raw: &str) -> bool {
    let Ok(url) = Url::parse(raw) else {
        return false;
    };
    let host_ok = url
        .host_str()
        .map(|h| h.to_ascii_lowercase())
        .is_some_and(|h| h == "linkedin.com" || h.ends_with(".linkedin.com"));
    let mut segments = url.path_segments().into_iter().flatten();
    let path_ok = segments.next() == Some("in") && segments.next().is_some_and(|s| !s.is_empty());
    matches!(url.scheme(), "http" | "https") && host_ok && path_ok
}

/// `"Jane Doe - Data Engineer - Acme | LinkedIn"` → `("Jane Doe", "Data Engineer - Acme")`.
pub fn split_title(title: &str) -> (String, String) {
    let mut segments = vec![title.to_string()];
    for sep in TITLE_SEPARATORS {
        segments = segments
            .iter()
            .flat_map(|s| s.split(*sep).map(str::to_string).collect::<Vec<_>>())
            .collect();
    }
    let mut segments = segments
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());

    let name = segments.next().unwrap_or_else(|| "Unknown".to_string());
    let headline = segments
        .filter(|s| !s.eq_ignore_ascii_case("linkedin"))
        .collect::<Vec<_>>()
        .join(" - ");
    (name, headline)
}

fn truncate_chars(text: &str, max: usize) -> String {
    let text = text.trim();
    match text.char_indices().nth(max) {
        Some((cut, _)) => format!("{}…", text[..cut].trim_end()),
        None => text.to_string(),
    }
}

pub fn score_snippet(
    hit: &SearchHit,
    jd: &StructuredJD,
    vocabulary: &SkillVocabulary,
    normalizer: &SkillNormalizer,
) -> SnippetScoreReport {
    let (name, headline) = split_title(&hit.title);
    let headline = if headline.is_empty() {
        truncate_chars(&hit.snippet, HEADLINE_FALLBACK_CHARS)
    } else {
        headline
    };

    let text = format!("{}\n{}", hit.title, hit.snippet);
    let skills = vocabulary.extract(&text, normalizer, &jd.skills);
    let (matched_skills, missing_skills): (BTreeSet<String>, BTreeSet<String>) = jd
        .skills
        .iter()
        .cloned()
        .partition(|s| skills.contains(s));

    let match_score = if jd.skills.is_empty() {
        0
    } else {
        (100.0 * matched_skills.len() as f64 / jd.skills.len() as f64).round() as u32
    };

    SnippetScoreReport {
        name,
        headline,
        skills,
        matched_skills,
        missing_skills,
        match_score,
        url: hit.url.clone(),
    }
}

pub struct SnippetExtractor {
    search: Arc<dyn SearchProvider>,
    vocabulary: Arc<SkillVocabulary>,
    normalizer: Arc<SkillNormalizer>,
    max_profiles: usize,
}

impl SnippetExtractor {
    pub fn new(
        search: Arc<dyn SearchProvider>,
        vocabulary: Arc<SkillVocabulary>,
        normalizer: Arc<SkillNormalizer>,
        max_profiles: usize,
    ) -> Self {
        Self {
            search,
            vocabulary,
            normalizer,
            max_profiles: max_profiles.max(1),
        }
    }

    pub async fn discover_from_snippets(&self, jd: &StructuredJD) -> Result<SnippetOutcome, AppError> {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let queries = build_profile_queries(jd);

        let harvested = harvest(self.search.as_ref(), &queries, self.max_profiles, |hit| {
            is_linkedin_profile(&hit.url)
        })
        .await?;

        let mut reports: Vec<SnippetScoreReport> = harvested
            .hits
            .iter()
            .map(|hit| score_snippet(hit, jd, &self.vocabulary, &self.normalizer))
            .collect();
        reports.sort_by(|a, b| b.match_score.cmp(&a.match_score));

        info!(%run_id, profiles = reports.len(), failed_queries = harvested.failed_queries, "snippet discovery finished");

        Ok(SnippetOutcome {
            run_id,
            started_at,
            finished_at: Utc::now(),
            degraded: harvested.degraded(),
            queries: harvested.issued,
            reports,
            search_results: harvested.search_results,
            failed_queries: harvested.failed_queries,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{jd_with_skills, profile_hit, skills, FakeSearch};

    fn score(title: &str, snippet: &str, jd: &StructuredJD) -> SnippetScoreReport {
        score_snippet(
            &profile_hit(title, snippet, "https://www.linkedin.com/in/x"),
            jd,
            &SkillVocabulary::default(),
            &SkillNormalizer::default(),
        )
    }

    fn extractor(search: FakeSearch) -> SnippetExtractor {
        SnippetExtractor::new(
            Arc::new(search),
            Arc::new(SkillVocabulary::default()),
            Arc::new(SkillNormalizer::default()),
            DEFAULT_MAX_PROFILES,
        )
    }

    #[test]
    fn test_java_spring_example() {
        let jd = jd_with_skills(&["java", "spring"]);
        let report = score("Jane Doe - Java backend engineer | LinkedIn", "", &jd);
        assert_eq!(report.name, "Jane Doe");
        assert_eq!(report.headline, "Java backend engineer");
        assert_eq!(report.matched_skills, skills(&["java"]));
        assert_eq!(report.missing_skills, skills(&["spring"]));
        assert_eq!(report.match_score, 50);
    }

    #[test]
    fn test_java_does_not_match_javascript() {
        let jd = jd_with_skills(&["java"]);
        let report = score("Sam Lee - JavaScript developer", "React and JavaScript", &jd);
        assert_eq!(report.match_score, 0);
        assert!(report.skills.contains("javascript"));
        assert!(report.skills.contains("react"));
    }

    #[test]
    fn test_empty_title_and_headline_fallback() {
        let jd = jd_with_skills(&["python"]);
        let snippet = "Python engineer. ".repeat(20);
        let report = score("", &snippet, &jd);
        assert_eq!(report.name, "Unknown");
        assert!(report.headline.chars().count() <= HEADLINE_FALLBACK_CHARS + 1);
        assert_eq!(report.match_score, 100);
    }

    #[test]
    fn test_no_jd_skills_scores_zero() {
        let report = score("A B - Rust dev", "rust", &jd_with_skills(&[]));
        assert_eq!(report.match_score, 0);
        assert!(report.missing_skills.is_empty());
    }

    #[test]
    fn test_split_title_variants() {
        assert_eq!(
            split_title("Ana Ruiz – Staff Engineer – Acme | LinkedIn"),
            ("Ana Ruiz".to_string(), "Staff Engineer - Acme".to_string())
        );
        assert_eq!(split_title("Solo"), ("Solo".to_string(), String::new()));
    }

    #[test]
    fn test_is_linkedin_profile() {
        assert!(is_linkedin_profile("https://www.linkedin.com/in/jane-doe"));
        assert!(is_linkedin_profile("https://de.linkedin.com/in/hans/"));
        assert!(!is_linkedin_profile("https://www.linkedin.com/jobs/view/123"));
        assert!(!is_linkedin_profile("https://www.linkedin.com/in/"));
        assert!(!is_linkedin_profile("https://notlinkedin.com/in/jane"));
        assert!(!is_linkedin_profile("https://example.com/in/jane"));
    }

    #[tokio::test]
    async fn test_discover_filters_sorts_and_dedups() {
        let search = FakeSearch::new(vec![Ok(vec![
            profile_hit("Low Match - Recruiter", "hiring", "https://www.linkedin.com/in/low"),
            profile_hit("Job post", "java spring", "https://www.linkedin.com/jobs/view/1"),
            profile_hit("Top Match - Java Spring developer", "", "https://linkedin.com/in/top"),
            profile_hit("Top Match - dup", "", "https://www.linkedin.com/in/top/"),
            profile_hit("Mid Match - Java dev", "", "https://uk.linkedin.com/in/mid"),
        ])]);
        let outcome = extractor(search)
            .discover_from_snippets(&jd_with_skills(&["java", "spring"]))
            .await
            .unwrap();

        let names: Vec<&str> = outcome.reports.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Top Match", "Mid Match", "Low Match"]);
        assert_eq!(outcome.reports[0].match_score, 100);
        assert_eq!(outcome.search_results, 5);
    }

    #[tokio::test]
    async fn test_equal_scores_keep_discovery_order() {
        let search = FakeSearch::new(vec![Ok(vec![
            profile_hit("Zoe Zimmer - Java dev", "", "https://www.linkedin.com/in/zoe"),
            profile_hit("Amy Adams - Java engineer", "", "https://www.linkedin.com/in/amy"),
            profile_hit("Kim Kole - Spring dev", "", "https://www.linkedin.com/in/kim"),
            profile_hit("Top Match - Java and Spring", "", "https://www.linkedin.com/in/top"),
        ])]);
        let outcome = extractor(search)
            .discover_from_snippets(&jd_with_skills(&["java", "spring"]))
            .await
            .unwrap();

        let names: Vec<&str> = outcome.reports.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Top Match", "Zoe Zimmer", "Amy Adams", "Kim Kole"]);
        assert!(outcome.reports[1..].iter().all(|r| r.match_score == 50));
    }

    #[tokio::test]
    async fn test_outage_is_provider_unavailable() {
        let result = extractor(FakeSearch::failing())
            .discover_from_snippets(&jd_with_skills(&["java"]))
            .await;
        assert!(matches!(result, Err(AppError::ProviderUnavailable(_))));
    }
}
