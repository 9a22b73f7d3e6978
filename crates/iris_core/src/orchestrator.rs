//! Tiered recognition pipeline.
//!
//! One request walks a fixed ladder: ask the vision provider, try the
//! curated matcher, synthesize from the strongest raw detection, and
//! finally let the demo heuristic guess. Provider failures never surface
//! to the caller; each tier degrades into the next, ending at a guidance
//! message when everything declines.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::IrisConfig;
use crate::heuristic::DemoHeuristic;
use crate::knowledge::{KnowledgeBase, KnowledgeEntry};
use crate::lexicon::Lexicon;
use crate::matcher::{best_match, MatchResult, MatcherConfig};
use crate::provider::VisionProvider;
use crate::synthesizer::{synthesize, SynthesisTemplates, SynthesizedEntry};
use crate::types::Detection;

/// Guidance shown when every tier declines.
pub const NOT_RECOGNIZED: &str = "Object not recognized. Try a clearer, well-lit photo from a different angle, or search the knowledge base directly.";

const DEMO_NOTE: &str = "Demo-mode guess from payload size, not a provider result.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecognitionState {
    Idle,
    Requesting,
    Succeeded,
    FellBackToSynthesis,
    FellBackToDemo,
    Failed,
}

impl RecognitionState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RecognitionState::Idle | RecognitionState::Requesting)
    }
}

impl fmt::Display for RecognitionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RecognitionState::Idle => "idle",
            RecognitionState::Requesting => "requesting",
            RecognitionState::Succeeded => "succeeded",
            RecognitionState::FellBackToSynthesis => "fell_back_to_synthesis",
            RecognitionState::FellBackToDemo => "fell_back_to_demo",
            RecognitionState::Failed => "failed",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Curated matches at or below this confidence are not trusted.
    #[serde(default = "default_high_confidence_threshold")]
    pub high_confidence_threshold: u8,
    /// The top raw detection must exceed this score to be worth
    /// synthesizing from.
    #[serde(default = "default_synthesis_floor")]
    pub synthesis_floor: f64,
}

fn default_high_confidence_threshold() -> u8 {
    70
}

fn default_synthesis_floor() -> f64 {
    0.5
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            high_confidence_threshold: default_high_confidence_threshold(),
            synthesis_floor: default_synthesis_floor(),
        }
    }
}

/// What one recognition request produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RecognitionOutcome {
    Matched(MatchResult),
    Synthesized(SynthesizedEntry),
    DemoGuess {
        entry: KnowledgeEntry,
        confidence: u8,
        note: String,
    },
    Failed {
        message: String,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecognitionReport {
    pub outcome: RecognitionOutcome,
    pub state: RecognitionState,
    pub elapsed_ms: u64,
}

/// Highest-scored detection; the earliest wins a tie.
fn top_detection(detections: &[Detection]) -> Option<&Detection> {
    let mut top: Option<&Detection> = None;
    for detection in detections {
        if top.map_or(true, |t| detection.score > t.score) {
            top = Some(detection);
        }
    }
    top
}

/// The recognition pipeline, generic over the provider seam.
///
/// Holds only read-only tables besides the demo heuristic's random source,
/// so one engine can serve concurrent requests.
pub struct RecognitionEngine<P: VisionProvider> {
    provider: P,
    knowledge: Arc<KnowledgeBase>,
    lexicon: Lexicon,
    templates: SynthesisTemplates,
    matcher: MatcherConfig,
    orchestrator: OrchestratorConfig,
    demo: DemoHeuristic,
}

impl<P: VisionProvider> RecognitionEngine<P> {
    pub fn new(provider: P, knowledge: Arc<KnowledgeBase>, config: &IrisConfig) -> Self {
        Self {
            provider,
            knowledge,
            lexicon: Lexicon::builtin(),
            templates: SynthesisTemplates::builtin(),
            matcher: config.matcher.clone(),
            orchestrator: config.orchestrator.clone(),
            demo: DemoHeuristic::new(config.demo.clone()),
        }
    }

    /// Swap in a seeded heuristic for reproducible demo behavior.
    pub fn with_heuristic(mut self, heuristic: DemoHeuristic) -> Self {
        self.demo = heuristic;
        self
    }

    pub fn with_lexicon(mut self, lexicon: Lexicon) -> Self {
        self.lexicon = lexicon;
        self
    }

    pub fn with_templates(mut self, templates: SynthesisTemplates) -> Self {
        self.templates = templates;
        self
    }

    pub fn knowledge(&self) -> &KnowledgeBase {
        &self.knowledge
    }

    /// Run one recognition request to its terminal state.
    ///
    /// Never returns an error: provider trouble degrades through synthesis
    /// and demo tiers down to a guidance message.
    pub async fn identify(&self, image: &[u8]) -> RecognitionReport {
        let started = Instant::now();
        debug!(
            "state {} -> {}: {} bytes via {} provider",
            RecognitionState::Idle,
            RecognitionState::Requesting,
            image.len(),
            self.provider.name()
        );

        let detections = match self.provider.classify(image).await {
            Ok(response) => response.into_detections(),
            Err(e) => {
                warn!("provider call failed: {e}");
                Vec::new()
            }
        };

        if !detections.is_empty() {
            if let Some(result) =
                best_match(&detections, &self.knowledge, &self.lexicon, &self.matcher)
            {
                if result.confidence > self.orchestrator.high_confidence_threshold {
                    info!(
                        "matched '{}' at confidence {}",
                        result.entry.name, result.confidence
                    );
                    return report(RecognitionState::Succeeded, RecognitionOutcome::Matched(result), started);
                }
                debug!(
                    "match '{}' at confidence {} below trust threshold, discarded",
                    result.entry.name, result.confidence
                );
            }

            if let Some(top) = top_detection(&detections) {
                if top.score > self.orchestrator.synthesis_floor {
                    let entry = synthesize(top, &self.templates, &self.lexicon);
                    info!(
                        "synthesized '{}' in category {}",
                        entry.entry.name, entry.entry.category
                    );
                    return report(
                        RecognitionState::FellBackToSynthesis,
                        RecognitionOutcome::Synthesized(entry),
                        started,
                    );
                }
                debug!(
                    "top detection '{}' at {:.2} too weak to synthesize",
                    top.label, top.score
                );
            }
        }

        // Demo tier: simulated latency, then a size-based guess.
        tokio::time::sleep(self.demo.delay()).await;
        if let Some(guess) = self.demo.guess(image.len(), &self.knowledge) {
            info!(
                "demo fallback guessed '{}' at confidence {}",
                guess.entry.name, guess.confidence
            );
            return report(
                RecognitionState::FellBackToDemo,
                RecognitionOutcome::DemoGuess {
                    entry: guess.entry,
                    confidence: guess.confidence,
                    note: DEMO_NOTE.to_string(),
                },
                started,
            );
        }

        info!("all tiers declined, returning guidance");
        report(
            RecognitionState::Failed,
            RecognitionOutcome::Failed {
                message: NOT_RECOGNIZED.to_string(),
            },
            started,
        )
    }
}

fn report(
    state: RecognitionState,
    outcome: RecognitionOutcome,
    started: Instant,
) -> RecognitionReport {
    let elapsed_ms = started.elapsed().as_millis() as u64;
    debug!(
        "state {} -> {} after {}ms",
        RecognitionState::Requesting,
        state,
        elapsed_ms
    );
    RecognitionReport {
        outcome,
        state,
        elapsed_ms,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heuristic::DemoConfig;
    use crate::provider::StaticProvider;

    fn quiet_config() -> IrisConfig {
        let mut config = IrisConfig::default();
        config.demo.delay_ms = 0;
        config
    }

    #[test]
    fn test_top_detection_prefers_score_then_order() {
        let detections = vec![
            Detection::new("first", 0.6),
            Detection::new("second", 0.9),
            Detection::new("third", 0.9),
        ];
        assert_eq!(top_detection(&detections).unwrap().label, "second");
        assert!(top_detection(&[]).is_none());
    }

    #[test]
    fn test_terminal_states() {
        assert!(!RecognitionState::Idle.is_terminal());
        assert!(!RecognitionState::Requesting.is_terminal());
        assert!(RecognitionState::Succeeded.is_terminal());
        assert!(RecognitionState::Failed.is_terminal());
        assert_eq!(
            RecognitionState::FellBackToSynthesis.to_string(),
            "fell_back_to_synthesis"
        );
    }

    #[tokio::test]
    async fn test_confident_match_succeeds() {
        let provider = StaticProvider::with_labels(&[("power drill", 0.95)]);
        let engine = RecognitionEngine::new(
            provider,
            Arc::new(KnowledgeBase::builtin()),
            &quiet_config(),
        );
        let report = engine.identify(b"image").await;
        assert_eq!(report.state, RecognitionState::Succeeded);
        match report.outcome {
            RecognitionOutcome::Matched(result) => {
                assert_eq!(result.entry.name, "Power Drill");
                assert!(result.confidence > 70);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_weak_match_falls_back_to_synthesis() {
        // Only a single tag-substring signal: 0.9 * 0.5 = 0.45, accepted by
        // the matcher but under the trust threshold, so the top detection
        // is synthesized instead.
        let kb = KnowledgeBase::from_entries(vec![KnowledgeEntry {
            name: "Walkie Talkie".to_string(),
            category: "Radios".to_string(),
            tags: vec!["telephone".to_string()],
            description: "test".to_string(),
            difficulty: crate::knowledge::Difficulty::Beginner,
            time_estimate: "n/a".to_string(),
            safety_level: crate::knowledge::SafetyLevel::Low,
            common_uses: vec![],
            materials: vec![],
            warnings: vec![],
            instructions: vec![],
            maintenance: "n/a".to_string(),
            storage: "n/a".to_string(),
            lifespan: "n/a".to_string(),
            age_restriction: None,
        }]);
        let provider = StaticProvider::with_labels(&[("phone", 0.9)]);
        let engine = RecognitionEngine::new(provider, Arc::new(kb), &quiet_config());
        let report = engine.identify(b"image").await;
        assert_eq!(report.state, RecognitionState::FellBackToSynthesis);
        match report.outcome {
            RecognitionOutcome::Synthesized(entry) => {
                assert_eq!(entry.entry.name, "Phone");
                assert_eq!(entry.entry.category, "Electronics");
                assert_eq!(entry.confidence, 90);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_everything_declining_fails_with_guidance() {
        let provider = StaticProvider::empty();
        let engine = RecognitionEngine::new(
            provider,
            Arc::new(KnowledgeBase::from_entries(vec![])),
            &quiet_config(),
        )
        .with_heuristic(DemoHeuristic::seeded(
            DemoConfig {
                delay_ms: 0,
                ..DemoConfig::default()
            },
            1,
        ));
        let report = engine.identify(b"image").await;
        assert_eq!(report.state, RecognitionState::Failed);
        match report.outcome {
            RecognitionOutcome::Failed { message } => assert_eq!(message, NOT_RECOGNIZED),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }
}
