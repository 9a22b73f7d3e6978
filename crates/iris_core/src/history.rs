//! On-disk history of recent identifications.
//!
//! A small JSON file, newest record first, capped at a configurable
//! retention count. History is best-effort: a missing or corrupt file
//! reads as empty rather than failing an identification.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::config::HistoryConfig;
use crate::orchestrator::RecognitionOutcome;
use crate::synthesizer::SYNTHESIZED_SOURCE;

pub const SOURCE_CURATED: &str = "curated";
pub const SOURCE_DEMO: &str = "demo";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HistoryRecord {
    pub id: Uuid,
    pub identified_at: DateTime<Utc>,
    pub name: String,
    pub category: String,
    pub confidence: u8,
    /// "curated", "synthesized" or "demo".
    pub source: String,
    /// The provider label behind the identification, absent for demo
    /// guesses which never saw one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detected_as: Option<String>,
}

impl HistoryRecord {
    /// Record for a terminal outcome; failures leave no history.
    pub fn from_outcome(outcome: &RecognitionOutcome) -> Option<Self> {
        let (name, category, confidence, source, detected_as) = match outcome {
            RecognitionOutcome::Matched(result) => (
                result.entry.name.clone(),
                result.entry.category.clone(),
                result.confidence,
                SOURCE_CURATED,
                Some(result.detected_as.clone()),
            ),
            RecognitionOutcome::Synthesized(entry) => (
                entry.entry.name.clone(),
                entry.entry.category.clone(),
                entry.confidence,
                SYNTHESIZED_SOURCE,
                Some(entry.detected_as.clone()),
            ),
            RecognitionOutcome::DemoGuess {
                entry, confidence, ..
            } => (
                entry.name.clone(),
                entry.category.clone(),
                *confidence,
                SOURCE_DEMO,
                None,
            ),
            RecognitionOutcome::Failed { .. } => return None,
        };
        Some(Self {
            id: Uuid::new_v4(),
            identified_at: Utc::now(),
            name,
            category,
            confidence,
            source: source.to_string(),
            detected_as,
        })
    }
}

pub struct HistoryStore {
    path: PathBuf,
    retain: usize,
}

fn default_history_path() -> Result<PathBuf> {
    let dir = dirs::cache_dir().context("no cache directory available")?;
    Ok(dir.join("iris").join("history.json"))
}

impl HistoryStore {
    pub fn open(config: &HistoryConfig) -> Result<Self> {
        let path = match &config.path {
            Some(path) => path.clone(),
            None => default_history_path()?,
        };
        Ok(Self {
            path,
            retain: config.retain,
        })
    }

    pub fn at(path: PathBuf, retain: usize) -> Self {
        Self { path, retain }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Newest first. A missing or unreadable file reads as empty.
    pub fn load(&self) -> Vec<HistoryRecord> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(_) => return Vec::new(),
        };
        match serde_json::from_str(&raw) {
            Ok(records) => records,
            Err(e) => {
                warn!(
                    "history file {} unreadable, starting fresh: {e}",
                    self.path.display()
                );
                Vec::new()
            }
        }
    }

    /// Prepend a record, dropping anything past the retention cap.
    pub fn record(&self, record: HistoryRecord) -> Result<()> {
        let mut records = self.load();
        records.insert(0, record);
        records.truncate(self.retain);

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(&records).context("serializing history")?;
        std::fs::write(&self.path, json)
            .with_context(|| format!("writing {}", self.path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knowledge::KnowledgeBase;
    use crate::lexicon::Lexicon;
    use crate::matcher::MatchResult;
    use crate::synthesizer::{synthesize, SynthesisTemplates};
    use crate::types::Detection;

    fn record(name: &str) -> HistoryRecord {
        HistoryRecord {
            id: Uuid::new_v4(),
            identified_at: Utc::now(),
            name: name.to_string(),
            category: "Appliances".to_string(),
            confidence: 80,
            source: SOURCE_CURATED.to_string(),
            detected_as: Some(name.to_lowercase()),
        }
    }

    #[test]
    fn test_record_and_load_newest_first() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = HistoryStore::at(dir.path().join("history.json"), 10);
        store.record(record("Toaster")).expect("record");
        store.record(record("Blender")).expect("record");

        let records = store.load();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name, "Blender");
        assert_eq!(records[1].name, "Toaster");
    }

    #[test]
    fn test_retention_cap_drops_oldest() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = HistoryStore::at(dir.path().join("history.json"), 3);
        for i in 0..5 {
            store.record(record(&format!("Item {i}"))).expect("record");
        }
        let records = store.load();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].name, "Item 4");
        assert_eq!(records[2].name, "Item 2");
    }

    #[test]
    fn test_missing_file_reads_as_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = HistoryStore::at(dir.path().join("absent.json"), 10);
        assert!(store.load().is_empty());
    }

    #[test]
    fn test_corrupt_file_reads_as_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("history.json");
        std::fs::write(&path, "not json at all").expect("write");
        let store = HistoryStore::at(path, 10);
        assert!(store.load().is_empty());
    }

    #[test]
    fn test_record_creates_parent_directories() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = HistoryStore::at(dir.path().join("nested/dir/history.json"), 10);
        store.record(record("Toaster")).expect("record");
        assert_eq!(store.load().len(), 1);
    }

    #[test]
    fn test_from_matched_outcome() {
        let entry = KnowledgeBase::builtin().entries()[0].clone();
        let outcome = RecognitionOutcome::Matched(MatchResult {
            entry: entry.clone(),
            confidence: 81,
            detected_as: "mobile phone".to_string(),
            raw_score: 0.81,
        });
        let record = HistoryRecord::from_outcome(&outcome).expect("record");
        assert_eq!(record.name, entry.name);
        assert_eq!(record.source, SOURCE_CURATED);
        assert_eq!(record.confidence, 81);
        assert_eq!(record.detected_as.as_deref(), Some("mobile phone"));
    }

    #[test]
    fn test_from_synthesized_outcome() {
        let synthesized = synthesize(
            &Detection::new("garden gnome", 0.6),
            &SynthesisTemplates::builtin(),
            &Lexicon::builtin(),
        );
        let outcome = RecognitionOutcome::Synthesized(synthesized);
        let record = HistoryRecord::from_outcome(&outcome).expect("record");
        assert_eq!(record.name, "Garden Gnome");
        assert_eq!(record.source, SYNTHESIZED_SOURCE);
        assert_eq!(record.detected_as.as_deref(), Some("garden gnome"));
    }

    #[test]
    fn test_demo_and_failed_outcomes() {
        let entry = KnowledgeBase::builtin().entries()[0].clone();
        let demo = RecognitionOutcome::DemoGuess {
            entry,
            confidence: 55,
            note: "demo".to_string(),
        };
        let record = HistoryRecord::from_outcome(&demo).expect("record");
        assert_eq!(record.source, SOURCE_DEMO);
        assert!(record.detected_as.is_none());

        let failed = RecognitionOutcome::Failed {
            message: "nope".to_string(),
        };
        assert!(HistoryRecord::from_outcome(&failed).is_none());
    }
}
