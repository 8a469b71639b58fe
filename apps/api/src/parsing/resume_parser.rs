//! Resume Parser — turns a fetched artifact into a `StructuredCandidate`.
//!
//! PDF bodies go through `pdf-extract`; everything else is read as (lossy) UTF-8 with
//! HTML markup stripped. Skills come from the shared vocabulary so they are normalized
//! exactly like JD skills.

use std::collections::BTreeSet;
use std::sync::{Arc, OnceLock};

use regex::Regex;
use tracing::debug;

use crate::errors::AppError;
use crate::matching::normalize::{SkillNormalizer, SkillVocabulary};
use crate::models::StructuredCandidate;
use crate::providers::Artifact;

const UNKNOWN_CANDIDATE: &str = "Unknown Candidate";

/// Lines that look like a document title rather than a person's name.
const TITLE_WORDS: &[&str] = &["resume", "résumé", "curriculum", "vitae", "cv", "profile"];

pub trait ResumeParser: Send + Sync {
    fn parse(&self, artifact: &Artifact) -> Result<StructuredCandidate, AppError>;
}

pub struct TextResumeParser {
    vocabulary: Arc<SkillVocabulary>,
    normalizer: Arc<SkillNormalizer>,
}

impl TextResumeParser {
    pub fn new(vocabulary: Arc<SkillVocabulary>, normalizer: Arc<SkillNormalizer>) -> Self {
        Self {
            vocabulary,
            normalizer,
        }
    }
}

impl ResumeParser for TextResumeParser {
    fn parse(&self, artifact: &Artifact) -> Result<StructuredCandidate, AppError> {
        let raw_text = extract_text(artifact)?;
        if raw_text.trim().is_empty() {
            return Err(AppError::Parse(format!(
                "no text could be extracted from {}",
                artifact.url
            )));
        }

        let skills = self
            .vocabulary
            .extract(&raw_text, &self.normalizer, &BTreeSet::new());
        let name = guess_name(&raw_text).unwrap_or_else(|| fallback_name(artifact));

        debug!(url = %artifact.url, name = %name, skills = skills.len(), "resume parsed");

        Ok(StructuredCandidate {
            name,
            raw_text,
            skills,
            source_url: Some(artifact.url.clone()),
            path: artifact.path.as_ref().map(|p| p.display().to_string()),
        })
    }
}

fn is_pdf(artifact: &Artifact) -> bool {
    artifact
        .content_type
        .as_deref()
        .is_some_and(|ct| ct.contains("pdf"))
        || artifact.bytes.starts_with(b"%PDF")
}

fn is_html(artifact: &Artifact, text: &str) -> bool {
    if artifact
        .content_type
        .as_deref()
        .is_some_and(|ct| ct.contains("html"))
    {
        return true;
    }
    let head = text.trim_start().chars().take(15).collect::<String>().to_lowercase();
    head.starts_with("<!doctype") || head.starts_with("<html")
}

fn extract_text(artifact: &Artifact) -> Result<String, AppError> {
    if is_pdf(artifact) {
        // pdf-extract panics on some malformed font tables instead of returning Err.
        let extracted = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            pdf_extract::extract_text_from_mem(&artifact.bytes)
        }));
        return match extracted {
            Ok(Ok(text)) => Ok(text),
            Ok(Err(e)) => Err(AppError::Parse(format!(
                "PDF extraction failed for {}: {e}",
                artifact.url
            ))),
            Err(_) => Err(AppError::Parse(format!(
                "PDF extraction aborted for {}",
                artifact.url
            ))),
        };
    }

    let text = String::from_utf8_lossy(&artifact.bytes).into_owned();
    if is_html(artifact, &text) {
        Ok(strip_html(&text))
    } else {
        Ok(text)
    }
}

fn strip_html(html: &str) -> String {
    static SCRIPT: OnceLock<Regex> = OnceLock::new();
    static STYLE: OnceLock<Regex> = OnceLock::new();
    static BREAK: OnceLock<Regex> = OnceLock::new();
    static TAG: OnceLock<Regex> = OnceLock::new();

    let script = SCRIPT.get_or_init(|| Regex::new(r"(?is)<script.*?</script>").expect("valid regex"));
    let style = STYLE.get_or_init(|| Regex::new(r"(?is)<style.*?</style>").expect("valid regex"));
    let brk = BREAK.get_or_init(|| {
        Regex::new(r"(?i)<\s*(br|/p|/div|/li|/h[1-6]|/tr)\s*/?>").expect("valid regex")
    });
    let tag = TAG.get_or_init(|| Regex::new(r"(?s)<[^>]*>").expect("valid regex"));

    let text = script.replace_all(html, " ");
    let text = style.replace_all(&text, " ");
    let text = brk.replace_all(&text, "\n");
    let text = tag.replace_all(&text, " ");

    text.replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&#39;", "'")
        .replace("&quot;", "\"")
}

/// First short line made only of capitalized words, e.g. "Jane Doe" or "JOHN A. SMITH".
fn guess_name(text: &str) -> Option<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .take(10)
        .find(|line| looks_like_name(line))
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
}

fn looks_like_name(line: &str) -> bool {
    let words: Vec<&str> = line.split_whitespace().collect();
    if !(2..=4).contains(&words.len()) {
        return false;
    }
    words.iter().all(|word| {
        let lower = word.to_lowercase();
        let starts_upper = word.chars().next().is_some_and(|c| c.is_uppercase());
        let letters_only = word
            .chars()
            .all(|c| c.is_alphabetic() || matches!(c, '.' | '-' | '\''));
        starts_upper && letters_only && !TITLE_WORDS.contains(&lower.trim_matches('.'))
    })
}

/// Last URL path segment, else the local file stem.
fn fallback_name(artifact: &Artifact) -> String {
    let from_path = artifact
        .path
        .as_ref()
        .and_then(|p| p.file_stem())
        .map(|s| s.to_string_lossy().into_owned());

    let from_url = || {
        artifact
            .url
            .split(['?', '#'])
            .next()
            .and_then(|u| u.trim_end_matches('/').rsplit('/').next())
            .map(|segment| match segment.rsplit_once('.') {
                Some((stem, _)) => stem.to_string(),
                None => segment.to_string(),
            })
            .map(|stem| stem.replace(['_', '-'], " ").trim().to_string())
            .filter(|stem| !stem.is_empty())
    };

    // Stored artifacts are named by checksum, which is not a useful display name.
    from_url()
        .or(from_path)
        .unwrap_or_else(|| UNKNOWN_CANDIDATE.to_string())
}
