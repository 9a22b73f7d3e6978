//! Size-based demo guessing for when no provider verdict is available.
//!
//! The heuristic knows nothing about image content. It reads the payload
//! size, and for mid-sized payloads rolls a die: a deliberate reminder that
//! demo mode is a stand-in, not recognition. Larger payloads map to the
//! first curated appliance or hand tool so demos stay repeatable.

use std::sync::Mutex;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::knowledge::{KnowledgeBase, KnowledgeEntry};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DemoConfig {
    /// Payloads strictly above this many bytes guess an appliance.
    #[serde(default = "default_appliance_size_threshold")]
    pub appliance_size_threshold: usize,
    /// Payloads strictly above this many bytes guess a hand tool.
    #[serde(default = "default_hand_tool_size_threshold")]
    pub hand_tool_size_threshold: usize,
    /// Uniform draws above this produce a random guess; the rest decline.
    #[serde(default = "default_random_hit_threshold")]
    pub random_hit_threshold: f64,
    #[serde(default = "default_min_confidence")]
    pub min_confidence: u8,
    #[serde(default = "default_max_confidence")]
    pub max_confidence: u8,
    #[serde(default = "default_appliance_confidence")]
    pub appliance_confidence: u8,
    #[serde(default = "default_hand_tool_confidence")]
    pub hand_tool_confidence: u8,
    /// Simulated provider latency before a demo verdict is produced.
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,
}

fn default_appliance_size_threshold() -> usize {
    50_000
}

fn default_hand_tool_size_threshold() -> usize {
    30_000
}

fn default_random_hit_threshold() -> f64 {
    0.7
}

fn default_min_confidence() -> u8 {
    40
}

fn default_max_confidence() -> u8 {
    70
}

fn default_appliance_confidence() -> u8 {
    65
}

fn default_hand_tool_confidence() -> u8 {
    60
}

fn default_delay_ms() -> u64 {
    1500
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            appliance_size_threshold: default_appliance_size_threshold(),
            hand_tool_size_threshold: default_hand_tool_size_threshold(),
            random_hit_threshold: default_random_hit_threshold(),
            min_confidence: default_min_confidence(),
            max_confidence: default_max_confidence(),
            appliance_confidence: default_appliance_confidence(),
            hand_tool_confidence: default_hand_tool_confidence(),
            delay_ms: default_delay_ms(),
        }
    }
}

impl DemoConfig {
    /// Serde fills missing fields one at a time, so a partial override in
    /// config.toml can leave the confidence pair inverted. An inverted pair
    /// would panic the range draw; raise the ceiling to the floor instead.
    fn normalized(mut self) -> Self {
        self.max_confidence = self.max_confidence.max(self.min_confidence);
        self
    }
}

/// A demo-mode verdict. Confidence here is a scripted number, not a score.
#[derive(Debug, Clone)]
pub struct DemoGuess {
    pub entry: KnowledgeEntry,
    pub confidence: u8,
}

/// Payload-size guesser with an injectable random source.
pub struct DemoHeuristic {
    config: DemoConfig,
    rng: Mutex<StdRng>,
}

impl DemoHeuristic {
    pub fn new(config: DemoConfig) -> Self {
        Self {
            config: config.normalized(),
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Fixed-seed variant for tests and reproducible demos.
    pub fn seeded(config: DemoConfig, seed: u64) -> Self {
        Self {
            config: config.normalized(),
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.config.delay_ms)
    }

    /// Guess an entry from nothing but the payload size.
    ///
    /// Size branches are deterministic and never touch the random source;
    /// only mid-sized payloads draw from it. A size branch whose category
    /// is absent from the knowledge base falls through to the next branch.
    pub fn guess(&self, payload_len: usize, kb: &KnowledgeBase) -> Option<DemoGuess> {
        if kb.is_empty() {
            return None;
        }

        if payload_len > self.config.appliance_size_threshold {
            if let Some(entry) = kb.first_in_category("Appliances") {
                return Some(DemoGuess {
                    entry: entry.clone(),
                    confidence: self.config.appliance_confidence,
                });
            }
        }

        if payload_len > self.config.hand_tool_size_threshold {
            if let Some(entry) = kb.first_in_category("Hand Tools") {
                return Some(DemoGuess {
                    entry: entry.clone(),
                    confidence: self.config.hand_tool_confidence,
                });
            }
        }

        let mut rng = self.rng.lock().expect("demo rng lock poisoned");
        if rng.gen::<f64>() > self.config.random_hit_threshold {
            let index = rng.gen_range(0..kb.len());
            let confidence =
                rng.gen_range(self.config.min_confidence..=self.config.max_confidence);
            return Some(DemoGuess {
                entry: kb.entries()[index].clone(),
                confidence,
            });
        }

        None
    }
}
