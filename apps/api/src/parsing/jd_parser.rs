//! JD Parser — extracts skills, responsibilities, seniority, domain, location and
//! keywords from plain job description text.
//!
//! Pure text heuristics. Binary formats (PDF/DOCX) are converted upstream.

use std::collections::{BTreeSet, HashMap};
use std::sync::OnceLock;

use regex::Regex;

use crate::errors::AppError;
use crate::matching::normalize::{
    clean_text, contains_phrase, is_stopword, tokenize, SkillNormalizer, SkillVocabulary,
};
use crate::models::StructuredJD;

pub const DEFAULT_SENIORITY: &str = "mid";
pub const DEFAULT_DOMAIN: &str = "general";
const MAX_KEYWORDS: usize = 15;
const MIN_KEYWORD_LEN: usize = 4;

/// Checked in order, most specific title first; the first hit wins.
const SENIORITY_LEVELS: &[(&str, &[&str])] = &[
    ("intern", &["intern", "internship"]),
    ("junior", &["junior", "entry level", "entry-level", "graduate"]),
    ("principal", &["principal", "distinguished"]),
    ("staff", &["staff engineer", "staff software"]),
    ("lead", &["lead", "head of", "manager"]),
    ("senior", &["senior", "sr.", "sr "]),
    ("mid", &["mid-level", "mid level", "intermediate"]),
];

const DOMAINS: &[(&str, &[&str])] = &[
    ("fintech", &["fintech", "banking", "payments", "financial services", "trading"]),
    ("healthcare", &["healthcare", "health care", "clinical", "medical", "hospital"]),
    ("e-commerce", &["e-commerce", "ecommerce", "retail", "marketplace"]),
    ("edtech", &["edtech", "education", "learning platform"]),
    ("gaming", &["gaming", "game studio", "games"]),
    ("cybersecurity", &["cybersecurity", "security operations", "infosec"]),
    ("ai/ml", &["machine learning", "artificial intelligence", "deep learning"]),
    ("data", &["data engineering", "analytics", "data platform", "big data"]),
    ("cloud", &["cloud", "infrastructure", "devops", "platform engineering"]),
    ("web", &["web application", "frontend", "front-end", "full stack", "full-stack"]),
];

const RESPONSIBILITY_HEADINGS: &[&str] = &[
    "responsibilit",
    "what you will do",
    "what you'll do",
    "duties",
    "the role",
    "your impact",
];

const SECTION_HEADINGS: &[&str] = &[
    "requirement",
    "qualification",
    "skills",
    "about",
    "benefits",
    "what we offer",
    "nice to have",
    "preferred",
    "who you are",
];

fn bullet_regex() -> &'static Regex {
    static BULLET: OnceLock<Regex> = OnceLock::new();
    BULLET.get_or_init(|| {
        Regex::new(r"^\s*(?:[-*•▪●◦]|\d{1,2}[.)])\s+(?P<text>.+)$").expect("valid bullet regex")
    })
}

fn location_regex() -> &'static Regex {
    static LOCATION: OnceLock<Regex> = OnceLock::new();
    LOCATION.get_or_init(|| {
        Regex::new(r"(?im)^\s*(?:location|based in|office)\s*[:\-]\s*(?P<loc>[^\n]+)$")
            .expect("valid location regex")
    })
}

/// Parses job description text into a normalized `StructuredJD`.
pub fn parse_job_description(
    text: &str,
    vocabulary: &SkillVocabulary,
    normalizer: &SkillNormalizer,
) -> Result<StructuredJD, AppError> {
    if text.trim().is_empty() {
        return Err(AppError::Parse("job description text is empty".to_string()));
    }

    let skills = vocabulary.extract(text, normalizer, &BTreeSet::new());
    let tech_stack = skills
        .iter()
        .filter(|s| {
            vocabulary
                .category_of(s)
                .is_some_and(|category| category.is_technology())
        })
        .cloned()
        .collect();

    let lower = clean_text(&text.to_lowercase());

    Ok(StructuredJD {
        responsibilities: extract_responsibilities(text),
        seniority_level: detect_seniority(text),
        domain: first_match(&lower, DOMAINS).unwrap_or(DEFAULT_DOMAIN).to_string(),
        location: detect_location(text, &lower),
        keywords: extract_keywords(text, &skills),
        tech_stack,
        skills,
    })
}

fn is_heading(line: &str, headings: &[&str]) -> bool {
    let lower = line.trim().trim_end_matches(':').to_lowercase();
    lower.len() <= 60 && headings.iter().any(|h| lower.contains(h))
}

/// Bullets under a responsibilities heading; every bullet if there is no such section.
fn extract_responsibilities(text: &str) -> Vec<String> {
    let mut in_section = false;
    let mut section_bullets = Vec::new();
    let mut all_bullets = Vec::new();
    let mut saw_section = false;

    for line in text.lines() {
        let bullet = bullet_regex()
            .captures(line)
            .and_then(|c| c.name("text"))
            .map(|m| clean_text(m.as_str()));

        match bullet {
            Some(item) if !item.is_empty() => {
                if in_section {
                    section_bullets.push(item.clone());
                }
                all_bullets.push(item);
            }
            _ => {
                if is_heading(line, RESPONSIBILITY_HEADINGS) {
                    in_section = true;
                    saw_section = true;
                } else if is_heading(line, SECTION_HEADINGS) {
                    in_section = false;
                }
            }
        }
    }

    if saw_section && !section_bullets.is_empty() {
        section_bullets
    } else {
        all_bullets
    }
}

fn first_match(lower: &str, table: &[(&'static str, &[&str])]) -> Option<&'static str> {
    table
        .iter()
        .find(|(_, needles)| needles.iter().any(|n| contains_phrase(lower, n.trim())))
        .map(|(label, _)| *label)
}

/// The title line decides when it names a level; otherwise the whole text.
fn detect_seniority(text: &str) -> String {
    let title = text
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or_default()
        .to_lowercase();

    first_match(&title, SENIORITY_LEVELS)
        .or_else(|| first_match(&clean_text(&text.to_lowercase()), SENIORITY_LEVELS))
        .unwrap_or(DEFAULT_SENIORITY)
        .to_string()
}

fn detect_location(text: &str, lower: &str) -> Option<String> {
    if let Some(loc) = location_regex()
        .captures(text)
        .and_then(|c| c.name("loc"))
        .map(|m| clean_text(m.as_str()))
        .filter(|l| !l.is_empty())
    {
        return Some(loc);
    }
    if contains_phrase(lower, "remote") {
        return Some("remote".to_string());
    }
    None
}

/// Most frequent non-stopword tokens that are not already skills; ties alphabetical.
fn extract_keywords(text: &str, skills: &BTreeSet<String>) -> BTreeSet<String> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for token in tokenize(text) {
        if token.len() < MIN_KEYWORD_LEN
            || is_stopword(&token)
            || skills.contains(&token)
            || token.chars().all(|c| c.is_ascii_digit())
        {
            continue;
        }
        *counts.entry(token).or_insert(0) += 1;
    }

    let mut ranked: Vec<(String, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked
        .into_iter()
        .take(MAX_KEYWORDS)
        .map(|(token, _)| token)
        .collect()
}
