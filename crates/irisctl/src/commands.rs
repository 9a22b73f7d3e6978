//! Command handlers for irisctl.

use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use iris_core::config::IrisConfig;
use iris_core::history::{HistoryRecord, HistoryStore};
use iris_core::knowledge::KnowledgeBase;
use iris_core::orchestrator::RecognitionEngine;
use iris_core::provider::{HttpVisionProvider, OfflineProvider};
use tracing::warn;

use crate::render;

fn load_knowledge(config: &IrisConfig) -> Result<KnowledgeBase> {
    match &config.knowledge.path {
        Some(path) => KnowledgeBase::from_path(path)
            .with_context(|| format!("loading knowledge base from {}", path.display())),
        None => Ok(KnowledgeBase::builtin()),
    }
}

pub async fn identify(config: &IrisConfig, image: &Path, offline: bool, json: bool) -> Result<()> {
    let bytes = std::fs::read(image).with_context(|| format!("reading {}", image.display()))?;
    let knowledge = Arc::new(load_knowledge(config)?);

    let report = if offline {
        RecognitionEngine::new(OfflineProvider, knowledge, config)
            .identify(&bytes)
            .await
    } else {
        let provider = HttpVisionProvider::new(&config.provider)?;
        RecognitionEngine::new(provider, knowledge, config)
            .identify(&bytes)
            .await
    };

    // History is best-effort; identification output never depends on it.
    if let Some(record) = HistoryRecord::from_outcome(&report.outcome) {
        match HistoryStore::open(&config.history) {
            Ok(store) => {
                if let Err(e) = store.record(record) {
                    warn!("could not update history: {e:#}");
                }
            }
            Err(e) => warn!("history store unavailable: {e:#}"),
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        render::report(&report);
    }
    Ok(())
}

pub fn search(config: &IrisConfig, query: &str) -> Result<()> {
    let kb = load_knowledge(config)?;
    let hits = kb.search(query);
    render::search_results(query, &hits);
    Ok(())
}

pub fn history(config: &IrisConfig) -> Result<()> {
    let store = HistoryStore::open(&config.history)?;
    render::history(&store.load());
    Ok(())
}

pub fn kb_list(config: &IrisConfig) -> Result<()> {
    let kb = load_knowledge(config)?;
    render::kb_overview(&kb);
    Ok(())
}

pub fn kb_show(config: &IrisConfig, name: &str) -> Result<()> {
    let kb = load_knowledge(config)?;
    match kb.find_by_name(name) {
        Some(entry) => {
            render::entry_card(entry);
            Ok(())
        }
        None => {
            let close = kb.search(name);
            if !close.is_empty() {
                render::suggestions(&close);
            }
            bail!("no entry named '{name}'")
        }
    }
}
