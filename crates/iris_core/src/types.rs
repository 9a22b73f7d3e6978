//! Shared types for the recognition pipeline.

use serde::{Deserialize, Serialize};

/// One candidate produced by a vision provider.
///
/// `score` is the provider's own confidence in [0.0, 1.0]; it is an input
/// to matching, not the confidence Iris reports to the user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Detection {
    pub label: String,
    pub score: f64,
}

impl Detection {
    pub fn new(label: impl Into<String>, score: f64) -> Self {
        Self {
            label: label.into(),
            score,
        }
    }

    /// Lowercased, whitespace-trimmed label used everywhere downstream.
    pub fn normalized_label(&self) -> String {
        self.label.trim().to_lowercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalized_label_trims_and_lowercases() {
        let d = Detection::new("  Mobile Phone ", 0.9);
        assert_eq!(d.normalized_label(), "mobile phone");
    }
}
