use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::matching::normalize::SkillNormalizer;

/// A parsed resume or profile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StructuredCandidate {
    pub name: String,
    pub raw_text: String,
    #[serde(default)]
    pub skills: BTreeSet<String>,
    #[serde(default)]
    pub source_url: Option<String>,
    /// Local artifact reference, when the candidate came from a fetched document.
    #[serde(default)]
    pub path: Option<String>,
}

impl StructuredCandidate {
    pub fn normalized(mut self, normalizer: &SkillNormalizer) -> Self {
        self.skills = normalizer.normalize_set(&self.skills);
        self.name = self.name.trim().to_string();
        self
    }
}
