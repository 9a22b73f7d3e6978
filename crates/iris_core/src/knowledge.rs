//! Curated knowledge base of identifiable objects.
//!
//! Entries are read-only at runtime. The builtin set is embedded at compile
//! time; deployments may load a replacement set from disk instead.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::IrisError;

/// Hazard class of an object. Ordering matters: `High > Medium > Low`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SafetyLevel {
    Low,
    Medium,
    High,
}

impl SafetyLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            SafetyLevel::Low => "low",
            SafetyLevel::Medium => "medium",
            SafetyLevel::High => "high",
        }
    }
}

/// How much prior experience using the object safely takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Beginner => "beginner",
            Difficulty::Intermediate => "intermediate",
            Difficulty::Advanced => "advanced",
        }
    }
}

/// One numbered step in an entry's usage instructions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InstructionStep {
    pub title: String,
    pub content: String,
}

/// Minimum-age guidance for hazardous objects.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct AgeRestriction {
    pub minimum_age: u8,
    pub supervision_required: bool,
    /// Age under which adult supervision is required even past `minimum_age`.
    pub supervision_age: u8,
}

/// A curated object the assistant can explain.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KnowledgeEntry {
    pub name: String,
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub description: String,
    pub difficulty: Difficulty,
    pub time_estimate: String,
    pub safety_level: SafetyLevel,
    #[serde(default)]
    pub common_uses: Vec<String>,
    #[serde(default)]
    pub materials: Vec<String>,
    #[serde(default)]
    pub warnings: Vec<String>,
    #[serde(default)]
    pub instructions: Vec<InstructionStep>,
    pub maintenance: String,
    pub storage: String,
    pub lifespan: String,
    #[serde(default)]
    pub age_restriction: Option<AgeRestriction>,
}

impl KnowledgeEntry {
    /// Case-insensitive check against name, category and tags.
    pub fn mentions(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        self.name.to_lowercase().contains(&needle)
            || self.category.to_lowercase().contains(&needle)
            || self
                .tags
                .iter()
                .any(|t| t.to_lowercase().contains(&needle))
    }
}

/// The read-only entry store. Entry order is the curated order and is
/// preserved by every accessor.
#[derive(Debug, Clone)]
pub struct KnowledgeBase {
    entries: Vec<KnowledgeEntry>,
}

impl KnowledgeBase {
    /// The compiled-in entry set.
    pub fn builtin() -> Self {
        let raw = include_str!("../data/knowledge.json");
        let entries: Vec<KnowledgeEntry> =
            serde_json::from_str(raw).expect("builtin knowledge.json is valid");
        Self { entries }
    }

    /// Load a replacement entry set from a JSON file on disk.
    pub fn from_path(path: &Path) -> Result<Self, IrisError> {
        let raw = std::fs::read_to_string(path)?;
        let entries: Vec<KnowledgeEntry> = serde_json::from_str(&raw)?;
        if entries.is_empty() {
            return Err(IrisError::Knowledge(format!(
                "{} contains no entries",
                path.display()
            )));
        }
        Ok(Self { entries })
    }

    pub fn from_entries(entries: Vec<KnowledgeEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[KnowledgeEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Case-insensitive substring search over names, categories and tags.
    /// Results keep curated order; no relevance ranking.
    pub fn search(&self, query: &str) -> Vec<&KnowledgeEntry> {
        let query = query.trim();
        if query.is_empty() {
            return Vec::new();
        }
        self.entries.iter().filter(|e| e.mentions(query)).collect()
    }

    /// Exact name lookup, case-insensitive.
    pub fn find_by_name(&self, name: &str) -> Option<&KnowledgeEntry> {
        let name = name.trim().to_lowercase();
        self.entries
            .iter()
            .find(|e| e.name.to_lowercase() == name)
    }

    /// First curated entry in a category, case-insensitive.
    pub fn first_in_category(&self, category: &str) -> Option<&KnowledgeEntry> {
        let category = category.to_lowercase();
        self.entries
            .iter()
            .find(|e| e.category.to_lowercase() == category)
    }

    /// Distinct categories in curated order.
    pub fn categories(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for entry in &self.entries {
            if !seen.contains(&entry.category.as_str()) {
                seen.push(&entry.category);
            }
        }
        seen
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_loads_and_is_nonempty() {
        let kb = KnowledgeBase::builtin();
        assert!(kb.len() >= 15, "builtin set has {} entries", kb.len());
    }

    #[test]
    fn test_builtin_entries_have_instructions() {
        let kb = KnowledgeBase::builtin();
        for entry in kb.entries() {
            assert!(
                !entry.instructions.is_empty(),
                "{} has no instructions",
                entry.name
            );
            assert!(!entry.tags.is_empty(), "{} has no tags", entry.name);
        }
    }

    #[test]
    fn test_search_matches_tags_case_insensitively() {
        let kb = KnowledgeBase::builtin();
        let hits = kb.search("MOBILE");
        assert!(hits.iter().any(|e| e.name == "Smartphone"));
    }

    #[test]
    fn test_search_empty_query_returns_nothing() {
        let kb = KnowledgeBase::builtin();
        assert!(kb.search("   ").is_empty());
    }

    #[test]
    fn test_find_by_name_ignores_case() {
        let kb = KnowledgeBase::builtin();
        assert!(kb.find_by_name("smartphone").is_some());
        assert!(kb.find_by_name("SMARTPHONE").is_some());
        assert!(kb.find_by_name("smart phone").is_none());
    }

    #[test]
    fn test_first_in_category_keeps_curated_order() {
        let kb = KnowledgeBase::builtin();
        let first = kb.first_in_category("Appliances").expect("category exists");
        let scan = kb
            .entries()
            .iter()
            .find(|e| e.category == "Appliances")
            .unwrap();
        assert_eq!(first.name, scan.name);
    }

    #[test]
    fn test_safety_levels_are_ordered() {
        assert!(SafetyLevel::High > SafetyLevel::Medium);
        assert!(SafetyLevel::Medium > SafetyLevel::Low);
    }

    #[test]
    fn test_hazardous_entries_carry_age_restrictions() {
        let kb = KnowledgeBase::builtin();
        let knife = kb.find_by_name("Chef's Knife").expect("knife entry");
        assert_eq!(knife.safety_level, SafetyLevel::High);
        assert!(knife.age_restriction.is_some());
    }
}
