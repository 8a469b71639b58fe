//! Skill normalization and the known skill vocabulary.
//!
//! Every producer of a skill set (JD parser, resume parser, snippet extractor, HTTP
//! boundary) goes through the same `SkillNormalizer`, otherwise set comparison in the
//! scoring engine is meaningless.
//!
//! Normalization: lowercase → trim → collapse inner whitespace → strip trailing
//! punctuation → synonym table. The synonym table only maps unambiguous aliases onto a
//! canonical name; it never folds two distinct technologies together.

use std::collections::{BTreeSet, HashMap};
use std::sync::OnceLock;

use regex::Regex;

/// Alias → canonical skill name.
pub const DEFAULT_SYNONYMS: &[(&str, &str)] = &[
    ("js", "javascript"),
    ("ts", "typescript"),
    ("golang", "go"),
    ("k8s", "kubernetes"),
    ("postgres", "postgresql"),
    ("node", "node.js"),
    ("nodejs", "node.js"),
    ("reactjs", "react"),
    ("react.js", "react"),
    ("vuejs", "vue"),
    ("vue.js", "vue"),
    ("cpp", "c++"),
    ("c sharp", "c#"),
    ("sklearn", "scikit-learn"),
    ("amazon web services", "aws"),
    ("google cloud platform", "gcp"),
    ("google cloud", "gcp"),
    ("ml", "machine learning"),
    ("nlp", "natural language processing"),
    ("springboot", "spring boot"),
    ("mongo", "mongodb"),
];

/// Coarse grouping of vocabulary entries. Technology categories feed `tech_stack`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkillCategory {
    Language,
    Framework,
    Database,
    CloudDevops,
    Data,
    Practice,
}

impl SkillCategory {
    pub fn is_technology(self) -> bool {
        !matches!(self, SkillCategory::Practice)
    }
}

const VOCABULARY: &[(&str, SkillCategory)] = &[
    // languages
    ("python", SkillCategory::Language),
    ("java", SkillCategory::Language),
    ("javascript", SkillCategory::Language),
    ("typescript", SkillCategory::Language),
    ("go", SkillCategory::Language),
    ("rust", SkillCategory::Language),
    ("c++", SkillCategory::Language),
    ("c#", SkillCategory::Language),
    ("ruby", SkillCategory::Language),
    ("php", SkillCategory::Language),
    ("kotlin", SkillCategory::Language),
    ("swift", SkillCategory::Language),
    ("scala", SkillCategory::Language),
    ("sql", SkillCategory::Language),
    ("bash", SkillCategory::Language),
    ("html", SkillCategory::Language),
    ("css", SkillCategory::Language),
    // frameworks
    ("spring", SkillCategory::Framework),
    ("spring boot", SkillCategory::Framework),
    ("django", SkillCategory::Framework),
    ("flask", SkillCategory::Framework),
    ("fastapi", SkillCategory::Framework),
    ("react", SkillCategory::Framework),
    ("angular", SkillCategory::Framework),
    ("vue", SkillCategory::Framework),
    ("node.js", SkillCategory::Framework),
    ("express", SkillCategory::Framework),
    (".net", SkillCategory::Framework),
    ("rails", SkillCategory::Framework),
    ("graphql", SkillCategory::Framework),
    // databases
    ("postgresql", SkillCategory::Database),
    ("mysql", SkillCategory::Database),
    ("mongodb", SkillCategory::Database),
    ("redis", SkillCategory::Database),
    ("elasticsearch", SkillCategory::Database),
    ("cassandra", SkillCategory::Database),
    ("dynamodb", SkillCategory::Database),
    ("sqlite", SkillCategory::Database),
    // cloud / devops
    ("aws", SkillCategory::CloudDevops),
    ("azure", SkillCategory::CloudDevops),
    ("gcp", SkillCategory::CloudDevops),
    ("docker", SkillCategory::CloudDevops),
    ("kubernetes", SkillCategory::CloudDevops),
    ("terraform", SkillCategory::CloudDevops),
    ("ansible", SkillCategory::CloudDevops),
    ("jenkins", SkillCategory::CloudDevops),
    ("ci/cd", SkillCategory::CloudDevops),
    ("linux", SkillCategory::CloudDevops),
    ("git", SkillCategory::CloudDevops),
    ("kafka", SkillCategory::CloudDevops),
    ("microservices", SkillCategory::CloudDevops),
    // data / ml
    ("pandas", SkillCategory::Data),
    ("numpy", SkillCategory::Data),
    ("spark", SkillCategory::Data),
    ("hadoop", SkillCategory::Data),
    ("airflow", SkillCategory::Data),
    ("tableau", SkillCategory::Data),
    ("power bi", SkillCategory::Data),
    ("tensorflow", SkillCategory::Data),
    ("pytorch", SkillCategory::Data),
    ("scikit-learn", SkillCategory::Data),
    ("machine learning", SkillCategory::Data),
    ("deep learning", SkillCategory::Data),
    ("natural language processing", SkillCategory::Data),
    ("computer vision", SkillCategory::Data),
    ("data analysis", SkillCategory::Data),
    ("etl", SkillCategory::Data),
    // practices
    ("agile", SkillCategory::Practice),
    ("scrum", SkillCategory::Practice),
    ("rest", SkillCategory::Practice),
    ("api design", SkillCategory::Practice),
    ("unit testing", SkillCategory::Practice),
    ("system design", SkillCategory::Practice),
    ("leadership", SkillCategory::Practice),
    ("communication", SkillCategory::Practice),
];

/// Canonical names too common as plain English to be matched in free text.
/// They are still reachable through an alias (e.g. "golang" → "go").
const AMBIGUOUS_IN_TEXT: &[&str] = &["go", "rest", "express", "spring", "swift", "rails"];

const STOPWORDS: &[&str] = &[
    "a", "about", "across", "after", "all", "also", "an", "and", "any", "are", "as", "at",
    "be", "been", "being", "both", "but", "by", "can", "candidate", "could", "do", "each",
    "etc", "for", "from", "has", "have", "help", "how", "in", "including", "into", "is",
    "it", "its", "join", "like", "make", "more", "must", "new", "not", "of", "on", "or",
    "other", "our", "out", "over", "per", "role", "should", "such", "team", "that", "the",
    "their", "them", "then", "there", "these", "they", "this", "through", "to", "under",
    "up", "use", "using", "via", "was", "we", "well", "were", "what", "when", "where",
    "which", "while", "who", "will", "with", "within", "work", "would", "years", "you",
    "your",
];

fn token_regex() -> &'static Regex {
    static TOKEN: OnceLock<Regex> = OnceLock::new();
    TOKEN.get_or_init(|| Regex::new(r"[a-z0-9][a-z0-9+#]*").expect("valid token regex"))
}

/// Lowercase alphanumeric tokens (keeps `+`/`#` so "c++" and "c#" survive).
pub fn tokenize(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    token_regex()
        .find_iter(&lower)
        .map(|m| m.as_str().to_string())
        .collect()
}

pub fn is_stopword(token: &str) -> bool {
    STOPWORDS.contains(&token)
}

/// Collapses all whitespace runs into single spaces.
pub fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// True when `phrase` occurs in `haystack` bounded by non-alphanumeric characters.
/// Both arguments are expected to be lowercase already.
pub fn contains_phrase(haystack: &str, phrase: &str) -> bool {
    if phrase.is_empty() {
        return false;
    }
    haystack.match_indices(phrase).any(|(start, _)| {
        let before_ok = haystack[..start]
            .chars()
            .next_back()
            .map(|c| !c.is_alphanumeric())
            .unwrap_or(true);
        let after_ok = haystack[start + phrase.len()..]
            .chars()
            .next()
            .map(|c| !c.is_alphanumeric())
            .unwrap_or(true);
        before_ok && after_ok
    })
}

/// Case-folding, whitespace and synonym normalization for skill strings.
#[derive(Debug, Clone)]
pub struct SkillNormalizer {
    synonyms: HashMap<String, String>,
}

impl Default for SkillNormalizer {
    fn default() -> Self {
        Self::with_synonyms(DEFAULT_SYNONYMS.iter().copied())
    }
}

impl SkillNormalizer {
    /// A normalizer with no synonym table: exact token match after case folding.
    pub fn exact() -> Self {
        Self {
            synonyms: HashMap::new(),
        }
    }

    pub fn with_synonyms<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let mut normalizer = Self::exact();
        for (alias, canonical) in pairs {
            let alias = fold(alias);
            let canonical = fold(canonical);
            if !alias.is_empty() && !canonical.is_empty() {
                normalizer.synonyms.insert(alias, canonical);
            }
        }
        normalizer
    }

    /// Returns `None` for strings that are empty after folding.
    pub fn normalize(&self, raw: &str) -> Option<String> {
        let folded = fold(raw);
        if folded.is_empty() {
            return None;
        }
        Some(self.synonyms.get(&folded).cloned().unwrap_or(folded))
    }

    pub fn normalize_set<I, S>(&self, items: I) -> BTreeSet<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        items
            .into_iter()
            .filter_map(|s| self.normalize(s.as_ref()))
            .collect()
    }

    /// Aliases that resolve to `canonical`, used when searching free text.
    fn aliases_of<'a>(&'a self, canonical: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.synonyms
            .iter()
            .filter(move |(_, c)| c.as_str() == canonical)
            .map(|(alias, _)| alias.as_str())
    }
}

fn fold(raw: &str) -> String {
    let collapsed = clean_text(&raw.to_lowercase());
    collapsed
        .trim_end_matches(|c: char| matches!(c, '.' | ',' | ';' | ':' | '!' | '?'))
        .to_string()
}

/// The known skill vocabulary used to extract skills from free text.
#[derive(Debug, Clone)]
pub struct SkillVocabulary {
    entries: Vec<(String, SkillCategory)>,
}

impl Default for SkillVocabulary {
    fn default() -> Self {
        Self {
            entries: VOCABULARY
                .iter()
                .map(|(name, category)| (name.to_string(), *category))
                .collect(),
        }
    }
}

impl SkillVocabulary {
    pub fn category_of(&self, skill: &str) -> Option<SkillCategory> {
        self.entries
            .iter()
            .find(|(name, _)| name == skill)
            .map(|(_, category)| *category)
    }

    /// Skills found in `text`: vocabulary entries plus `extra` (normalized skills, e.g.
    /// the JD's own list). Matches are whole phrases, so "java" never hits "javascript".
    pub fn extract(
        &self,
        text: &str,
        normalizer: &SkillNormalizer,
        extra: &BTreeSet<String>,
    ) -> BTreeSet<String> {
        let haystack = clean_text(&text.to_lowercase());
        let mut found = BTreeSet::new();

        // Caller-supplied terms were asked for explicitly, so the ambiguity filter
        // only applies to the built-in vocabulary.
        let canonical = self
            .entries
            .iter()
            .map(|(name, _)| (name.as_str(), AMBIGUOUS_IN_TEXT.contains(&name.as_str())))
            .chain(extra.iter().map(|s| (s.as_str(), false)));

        for (skill, ambiguous) in canonical {
            let direct = !ambiguous && contains_phrase(&haystack, skill);
            let via_alias = || {
                normalizer
                    .aliases_of(skill)
                    .any(|alias| contains_phrase(&haystack, alias))
            };
            if direct || via_alias() {
                if let Some(normalized) = normalizer.normalize(skill) {
                    found.insert(normalized);
                }
            }
        }

        found
    }
}
