use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::matching::normalize::{clean_text, SkillNormalizer};

/// Structured job description. Skill-like sets are normalized and ordered; the
/// responsibilities keep document order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StructuredJD {
    #[serde(default)]
    pub skills: BTreeSet<String>,
    #[serde(default)]
    pub responsibilities: Vec<String>,
    #[serde(default)]
    pub tech_stack: BTreeSet<String>,
    #[serde(default)]
    pub keywords: BTreeSet<String>,
    pub seniority_level: String,
    pub domain: String,
    #[serde(default)]
    pub location: Option<String>,
}

impl StructuredJD {
    /// Re-applies the shared skill normalization. Used at every boundary where a JD
    /// enters the service from outside.
    pub fn normalized(self, normalizer: &SkillNormalizer) -> Self {
        Self {
            skills: normalizer.normalize_set(&self.skills),
            tech_stack: normalizer.normalize_set(&self.tech_stack),
            keywords: normalizer.normalize_set(&self.keywords),
            responsibilities: self
                .responsibilities
                .iter()
                .map(|r| clean_text(r))
                .filter(|r| !r.is_empty())
                .collect(),
            seniority_level: clean_text(&self.seniority_level).to_lowercase(),
            domain: clean_text(&self.domain).to_lowercase(),
            location: self
                .location
                .map(|l| clean_text(&l))
                .filter(|l| !l.is_empty()),
        }
    }

    /// Text embedded for semantic comparison: skills, responsibilities, keywords.
    pub fn embedding_text(&self) -> String {
        let skills = self.skills.iter().cloned().collect::<Vec<_>>().join(", ");
        let keywords = self.keywords.iter().cloned().collect::<Vec<_>>().join(", ");

        [skills, self.responsibilities.join("\n"), keywords]
            .into_iter()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }
}
