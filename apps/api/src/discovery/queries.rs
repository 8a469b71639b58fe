//! Deterministic search query construction from a `StructuredJD`.

use std::collections::HashSet;

use crate::models::StructuredJD;

/// Most terms any single query is built from.
pub const MAX_QUERY_SKILLS: usize = 4;

const PROFILE_SITE: &str = "site:linkedin.com/in";

/// Search terms for a JD: tech-stack skills first, then the other skills, each group
/// alphabetical. Keywords stand in when the JD lists no skills.
pub fn top_skills(jd: &StructuredJD) -> Vec<String> {
    let (stack, rest): (Vec<&String>, Vec<&String>) =
        jd.skills.iter().partition(|s| jd.tech_stack.contains(*s));

    let mut terms: Vec<String> = stack
        .into_iter()
        .chain(rest)
        .take(MAX_QUERY_SKILLS)
        .cloned()
        .collect();

    if terms.is_empty() {
        terms = jd.keywords.iter().take(MAX_QUERY_SKILLS).cloned().collect();
    }
    terms
}

fn term(skill: &str) -> String {
    if skill.contains(char::is_whitespace) {
        format!("\"{skill}\"")
    } else {
        skill.to_string()
    }
}

fn join(parts: &[&str]) -> String {
    parts
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn dedup(queries: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    queries
        .into_iter()
        .filter(|q| !q.is_empty() && seen.insert(q.clone()))
        .collect()
}

/// Queries for downloadable resumes, most specific first.
pub fn build_resume_queries(jd: &StructuredJD) -> Vec<String> {
    let terms: Vec<String> = top_skills(jd).iter().map(|s| term(s)).collect();
    let t = |i: usize| terms.get(i).map(String::as_str).unwrap_or("");

    if terms.is_empty() {
        return vec![join(&["resume", &jd.domain, "filetype:pdf"])];
    }

    let mut queries = vec![
        join(&["resume", t(0), t(1), t(2), "filetype:pdf"]),
        join(&[
            &jd.seniority_level,
            &jd.domain,
            "resume",
            t(0),
            t(1),
            "filetype:pdf",
        ]),
    ];
    if let Some(location) = jd.location.as_deref().filter(|l| !l.trim().is_empty()) {
        let quoted = format!("\"{}\"", location.trim());
        queries.push(join(&["cv", t(0), t(1), &quoted, "filetype:pdf"]));
    }
    if terms.len() >= MAX_QUERY_SKILLS {
        let mut parts = vec!["intitle:resume", t(0)];
        parts.extend(terms[3..].iter().map(String::as_str));
        parts.push("filetype:pdf");
        queries.push(join(&parts));
    }

    dedup(queries)
}

/// Queries for public profile pages.
pub fn build_profile_queries(jd: &StructuredJD) -> Vec<String> {
    let terms: Vec<String> = top_skills(jd).iter().map(|s| term(s)).collect();
    let t = |i: usize| terms.get(i).map(String::as_str).unwrap_or("");

    let mut queries = vec![
        join(&[PROFILE_SITE, t(0), t(1), t(2)]),
        join(&[PROFILE_SITE, &jd.seniority_level, &jd.domain, t(0)]),
    ];
    if let Some(location) = jd.location.as_deref().filter(|l| !l.trim().is_empty()) {
        let quoted = format!("\"{}\"", location.trim());
        queries.push(join(&[PROFILE_SITE, t(0), t(1), &quoted]));
    }

    // No terms at all: a bare site filter is useless.
    dedup(queries.into_iter().filter(|q| q != PROFILE_SITE).collect())
}
