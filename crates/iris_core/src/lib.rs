//! Iris core: object identification against a curated knowledge base.
//!
//! A vision provider turns an image into detections, the matcher scores
//! them against curated entries, the synthesizer covers objects the base
//! does not know, and a demo heuristic keeps the flow alive when no
//! provider is reachable. The orchestrator sequences those tiers so a
//! recognition request always ends in a usable answer or explicit
//! guidance, never an exception.

pub mod config;
pub mod error;
pub mod heuristic;
pub mod history;
pub mod knowledge;
pub mod lexicon;
pub mod matcher;
pub mod orchestrator;
pub mod provider;
pub mod synthesizer;
pub mod types;

pub use config::IrisConfig;
pub use error::IrisError;
pub use heuristic::{DemoConfig, DemoGuess, DemoHeuristic};
pub use history::{HistoryRecord, HistoryStore};
pub use knowledge::{KnowledgeBase, KnowledgeEntry, SafetyLevel};
pub use lexicon::Lexicon;
pub use matcher::{best_match, MatchResult, MatcherConfig};
pub use orchestrator::{RecognitionEngine, RecognitionOutcome, RecognitionReport, RecognitionState};
pub use provider::{
    HttpVisionProvider, OfflineProvider, ProviderResponse, StaticProvider, VisionProvider,
};
pub use synthesizer::{synthesize, SynthesisTemplates, SynthesizedEntry};
pub use types::Detection;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
