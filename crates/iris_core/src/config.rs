//! Runtime configuration, loaded from TOML with per-field defaults.
//!
//! Every field has a default, so a missing file, a missing section and a
//! partial section all work. Lookup order: the user config dir first, then
//! the system-wide file. An unreadable file logs a warning and falls
//! through rather than aborting.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::IrisError;
use crate::heuristic::DemoConfig;
use crate::matcher::MatcherConfig;
use crate::orchestrator::OrchestratorConfig;

/// Environment variable consulted when no API key is configured.
pub const API_KEY_ENV: &str = "IRIS_VISION_API_KEY";

pub const SYSTEM_CONFIG_PATH: &str = "/etc/iris/config.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IrisConfig {
    pub knowledge: KnowledgeConfig,
    pub provider: ProviderConfig,
    pub matcher: MatcherConfig,
    pub orchestrator: OrchestratorConfig,
    pub demo: DemoConfig,
    pub history: HistoryConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KnowledgeConfig {
    /// Replacement entry set; the builtin set loads when unset.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Explicit key; `IRIS_VISION_API_KEY` is consulted when unset.
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_results")]
    pub max_results: u32,
}

fn default_endpoint() -> String {
    "https://vision.googleapis.com/v1/images:annotate".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_max_results() -> u32 {
    10
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            api_key: None,
            timeout_secs: default_timeout_secs(),
            max_results: default_max_results(),
        }
    }
}

impl ProviderConfig {
    pub fn resolved_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var(API_KEY_ENV).ok())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Override for the history file; the XDG cache dir is used when unset.
    #[serde(default)]
    pub path: Option<PathBuf>,
    /// How many identifications the history keeps.
    #[serde(default = "default_retain")]
    pub retain: usize,
}

fn default_retain() -> usize {
    10
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            path: None,
            retain: default_retain(),
        }
    }
}

impl IrisConfig {
    /// Load from the first readable candidate path, or fall back to
    /// defaults.
    pub fn load() -> Self {
        for path in Self::candidate_paths() {
            if !path.exists() {
                continue;
            }
            match Self::load_from(&path) {
                Ok(config) => {
                    debug!("loaded config from {}", path.display());
                    return config;
                }
                Err(e) => {
                    warn!("config {} unreadable, trying next: {e}", path.display());
                }
            }
        }
        debug!("no config file found, using defaults");
        Self::default()
    }

    pub fn load_from(path: &Path) -> Result<Self, IrisError> {
        let raw = std::fs::read_to_string(path)?;
        toml::from_str(&raw).map_err(|e| IrisError::Config(e.to_string()))
    }

    fn candidate_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("iris").join("config.toml"));
        }
        paths.push(PathBuf::from(SYSTEM_CONFIG_PATH));
        paths
    }
}
