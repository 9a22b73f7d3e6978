//! Weighted matching of provider detections against the knowledge base.
//!
//! Every surviving detection is scored against every entry. A signal sum
//! is built from name, tag, category and synonym agreement, multiplied by
//! the provider's own score, and the best pair wins if it clears the
//! acceptance floor. Ties keep the earliest detection and the earliest
//! curated entry, so results are stable across runs.

use serde::{Deserialize, Serialize};

use crate::knowledge::{KnowledgeBase, KnowledgeEntry};
use crate::lexicon::Lexicon;
use crate::types::Detection;

/// Signal weights. The exact variant of a signal suppresses its substring
/// variant for the same field; tags accumulate across the whole tag list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchWeights {
    #[serde(default = "default_name_exact")]
    pub name_exact: f64,
    #[serde(default = "default_name_substring")]
    pub name_substring: f64,
    #[serde(default = "default_tag_exact")]
    pub tag_exact: f64,
    #[serde(default = "default_tag_substring")]
    pub tag_substring: f64,
    #[serde(default = "default_category_substring")]
    pub category_substring: f64,
    #[serde(default = "default_synonym_bonus")]
    pub synonym_bonus: f64,
}

fn default_name_exact() -> f64 {
    1.0
}

fn default_name_substring() -> f64 {
    0.7
}

fn default_tag_exact() -> f64 {
    0.9
}

fn default_tag_substring() -> f64 {
    0.5
}

fn default_category_substring() -> f64 {
    0.3
}

fn default_synonym_bonus() -> f64 {
    0.6
}

impl Default for MatchWeights {
    fn default() -> Self {
        Self {
            name_exact: default_name_exact(),
            name_substring: default_name_substring(),
            tag_exact: default_tag_exact(),
            tag_substring: default_tag_substring(),
            category_substring: default_category_substring(),
            synonym_bonus: default_synonym_bonus(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatcherConfig {
    /// Detections scoring below this provider confidence are ignored.
    #[serde(default = "default_relevance_floor")]
    pub relevance_floor: f64,
    /// The best weighted score must exceed this for a match to stand.
    #[serde(default = "default_acceptance_floor")]
    pub acceptance_floor: f64,
    /// Reported confidence never exceeds this, whatever the raw score says.
    #[serde(default = "default_confidence_ceiling")]
    pub confidence_ceiling: u8,
    /// Substring signals need both sides longer than this many characters.
    #[serde(default = "default_substring_min_len")]
    pub substring_min_len: usize,
    #[serde(default)]
    pub weights: MatchWeights,
}

fn default_relevance_floor() -> f64 {
    0.3
}

fn default_acceptance_floor() -> f64 {
    0.4
}

fn default_confidence_ceiling() -> u8 {
    95
}

fn default_substring_min_len() -> usize {
    3
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            relevance_floor: default_relevance_floor(),
            acceptance_floor: default_acceptance_floor(),
            confidence_ceiling: default_confidence_ceiling(),
            substring_min_len: default_substring_min_len(),
            weights: MatchWeights::default(),
        }
    }
}

/// A successful identification against the curated knowledge base.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchResult {
    pub entry: KnowledgeEntry,
    /// User-facing confidence, 0 to the configured ceiling.
    pub confidence: u8,
    /// The normalized detection label that produced this match.
    pub detected_as: String,
    /// Weighted score before clamping, kept for diagnostics.
    pub raw_score: f64,
}

/// Substring agreement in either direction, gated so trivially short
/// strings cannot match half the knowledge base.
fn substring_match(a: &str, b: &str, min_len: usize) -> bool {
    a.len() > min_len && b.len() > min_len && (a.contains(b) || b.contains(a))
}

/// Signal sum for one normalized label against one entry.
pub fn signal_sum(label: &str, entry: &KnowledgeEntry, lexicon: &Lexicon, config: &MatcherConfig) -> f64 {
    let w = &config.weights;
    let min_len = config.substring_min_len;
    let mut sum = 0.0;

    let name = entry.name.to_lowercase();
    if label == name {
        sum += w.name_exact;
    } else if substring_match(label, &name, min_len) {
        sum += w.name_substring;
    }

    for tag in &entry.tags {
        let tag = tag.to_lowercase();
        if label == tag {
            sum += w.tag_exact;
        } else if substring_match(label, &tag, min_len) {
            sum += w.tag_substring;
        }
    }

    let category = entry.category.to_lowercase();
    if substring_match(label, &category, min_len) {
        sum += w.category_substring;
    }

    // Alias credit: a label the lexicon knows as a synonym earns the bonus
    // when its canonical key shows up in the entry's name or tag list.
    if let Some(key) = lexicon.canonical_key_for_synonym(label) {
        let key_in_name = name.contains(key);
        let key_in_tags = entry.tags.iter().any(|t| t.to_lowercase() == key);
        if key_in_name || key_in_tags {
            sum += w.synonym_bonus;
        }
    }

    sum
}

/// Weighted score for one detection against one entry.
pub fn score_against(
    detection: &Detection,
    entry: &KnowledgeEntry,
    lexicon: &Lexicon,
    config: &MatcherConfig,
) -> f64 {
    detection.score * signal_sum(&detection.normalized_label(), entry, lexicon, config)
}

/// Best curated match across all detections, if any clears the floors.
pub fn best_match(
    detections: &[Detection],
    kb: &KnowledgeBase,
    lexicon: &Lexicon,
    config: &MatcherConfig,
) -> Option<MatchResult> {
    let mut best: Option<(f64, &KnowledgeEntry, String)> = None;

    for detection in detections {
        // Negated form so NaN scores are skipped, not compared.
        if !(detection.score >= config.relevance_floor) {
            continue;
        }
        let label = detection.normalized_label();
        if label.is_empty() {
            continue;
        }
        for entry in kb.entries() {
            let weighted = detection.score * signal_sum(&label, entry, lexicon, config);
            // Strict comparison keeps the earliest detection and entry on ties.
            if best.as_ref().map_or(true, |(b, _, _)| weighted > *b) {
                best = Some((weighted, entry, label.clone()));
            }
        }
    }

    let (raw_score, entry, detected_as) = best?;
    if raw_score <= config.acceptance_floor {
        return None;
    }

    let confidence = (raw_score * 100.0).round() as u32;
    let confidence = confidence.min(config.confidence_ceiling as u32) as u8;

    Some(MatchResult {
        entry: entry.clone(),
        confidence,
        detected_as,
        raw_score,
    })
}
