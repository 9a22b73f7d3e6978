//! Match Simulator - Deterministic matcher scenarios against the builtin
//! knowledge base.
//!
//! Usage:
//!   match_sim --scenario exact
//!   match_sim --scenario synonym
//!   match_sim --scenario gate
//!   match_sim --scenario floors
//!   match_sim --scenario ranking
//!
//! Outputs machine-readable JSON reports to ./artifacts/simulations/

use serde::Serialize;
use std::fs;
use std::path::PathBuf;

use iris_core::knowledge::KnowledgeBase;
use iris_core::lexicon::Lexicon;
use iris_core::matcher::{best_match, score_against, MatcherConfig};
use iris_core::types::Detection;

// ============================================================================
// TYPES
// ============================================================================

#[derive(Debug, Clone, Serialize)]
struct CandidateScore {
    entry: String,
    weighted: f64,
}

#[derive(Debug, Clone, Serialize)]
struct MatchSummary {
    entry: String,
    category: String,
    confidence: u8,
    detected_as: String,
    raw_score: f64,
}

#[derive(Debug, Clone, Serialize)]
struct SimulationReport {
    scenario: String,
    detections: Vec<Detection>,
    candidates: Vec<CandidateScore>,
    matched: Option<MatchSummary>,
    expected_match: bool,
    success: bool,
    notes: String,
}

// ============================================================================
// SIMULATOR LOGIC
// ============================================================================

/// Best weighted score per entry across all detections, top five only.
fn rank_candidates(
    detections: &[Detection],
    kb: &KnowledgeBase,
    lexicon: &Lexicon,
    config: &MatcherConfig,
) -> Vec<CandidateScore> {
    let mut scores: Vec<CandidateScore> = Vec::new();
    for entry in kb.entries() {
        let mut best = 0.0f64;
        for detection in detections {
            let weighted = score_against(detection, entry, lexicon, config);
            if weighted > best {
                best = weighted;
            }
        }
        if best > 0.0 {
            scores.push(CandidateScore {
                entry: entry.name.clone(),
                weighted: best,
            });
        }
    }
    scores.sort_by(|a, b| b.weighted.partial_cmp(&a.weighted).unwrap());
    scores.truncate(5);
    scores
}

fn run_scenario(
    scenario: &str,
    detections: Vec<Detection>,
    expected_match: bool,
    notes: &str,
) -> SimulationReport {
    let kb = KnowledgeBase::builtin();
    let lexicon = Lexicon::builtin();
    let config = MatcherConfig::default();

    let candidates = rank_candidates(&detections, &kb, &lexicon, &config);
    let matched = best_match(&detections, &kb, &lexicon, &config).map(|result| MatchSummary {
        entry: result.entry.name.clone(),
        category: result.entry.category.clone(),
        confidence: result.confidence,
        detected_as: result.detected_as,
        raw_score: result.raw_score,
    });

    let success = matched.is_some() == expected_match;

    SimulationReport {
        scenario: scenario.to_string(),
        detections,
        candidates,
        matched,
        expected_match,
        success,
        notes: notes.to_string(),
    }
}

fn simulate_exact() -> SimulationReport {
    run_scenario(
        "exact",
        vec![Detection::new("toaster", 0.85)],
        true,
        "Exact name agreement plus a tag substring push the score well past the acceptance floor.",
    )
}

fn simulate_synonym() -> SimulationReport {
    run_scenario(
        "synonym",
        vec![Detection::new("drill", 0.8)],
        true,
        "The label is a known alias of 'power drill', so the synonym bonus stacks on the name and tag signals.",
    )
}

fn simulate_gate() -> SimulationReport {
    run_scenario(
        "gate",
        vec![Detection::new("kit", 0.9)],
        false,
        "Three-character labels never substring-match, so 'kit' cannot ride along inside 'kitchen' tags.",
    )
}

fn simulate_floors() -> SimulationReport {
    run_scenario(
        "floors",
        vec![
            Detection::new("toaster", 0.25),
            Detection::new("bread", 0.44),
        ],
        false,
        "0.25 sits under the relevance floor and is ignored outright; the 0.44 tag hit lands at 0.396, under the acceptance floor.",
    )
}

fn simulate_ranking() -> SimulationReport {
    run_scenario(
        "ranking",
        vec![
            Detection::new("blender", 0.8),
            Detection::new("toaster", 0.8),
        ],
        true,
        "Equal provider scores: the entry with the stronger signal sum wins regardless of detection order.",
    )
}

// ============================================================================
// MAIN
// ============================================================================

fn main() {
    let args: Vec<String> = std::env::args().collect();

    let mut scenario = "exact".to_string();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--scenario" => {
                if i + 1 < args.len() {
                    scenario = args[i + 1].clone();
                    i += 2;
                } else {
                    eprintln!("Error: --scenario requires a value");
                    std::process::exit(1);
                }
            }
            "--help" | "-h" => {
                println!("Match Simulator");
                println!();
                println!("Usage:");
                println!("  match_sim --scenario <scenario>");
                println!();
                println!("Options:");
                println!("  --scenario <scenario> Scenario: exact, synonym, gate, floors, ranking");
                println!();
                println!("Examples:");
                println!("  match_sim --scenario exact");
                println!("  match_sim --scenario floors");
                std::process::exit(0);
            }
            _ => {
                eprintln!("Error: Unknown argument: {}", args[i]);
                eprintln!("Run with --help for usage");
                std::process::exit(1);
            }
        }
    }

    let report = match scenario.as_str() {
        "exact" => simulate_exact(),
        "synonym" => simulate_synonym(),
        "gate" => simulate_gate(),
        "floors" => simulate_floors(),
        "ranking" => simulate_ranking(),
        _ => {
            eprintln!("Error: Unknown scenario: {}", scenario);
            eprintln!("Valid scenarios: exact, synonym, gate, floors, ranking");
            std::process::exit(1);
        }
    };

    let output_dir = PathBuf::from("./artifacts/simulations");
    fs::create_dir_all(&output_dir).unwrap();

    let output_file = output_dir.join(format!("match_{}.json", scenario));
    let json = serde_json::to_string_pretty(&report).unwrap();
    fs::write(&output_file, json).unwrap();

    println!("\n=== Match Simulation: {} ===\n", scenario);
    for detection in &report.detections {
        println!("Detection:            '{}' @ {:.2}", detection.label, detection.score);
    }
    println!("Candidates ranked:    {}", report.candidates.len());
    for candidate in &report.candidates {
        println!("  {:<22} {:.3}", candidate.entry, candidate.weighted);
    }
    match &report.matched {
        Some(summary) => {
            println!("Winner:               {} ({})", summary.entry, summary.category);
            println!("Confidence:           {}", summary.confidence);
            println!("Raw score:            {:.3}", summary.raw_score);
        }
        None => println!("Winner:               none (floors held)"),
    }
    println!("Expected a match:     {}", report.expected_match);
    println!("Success:              {}", report.success);

    println!("\nNotes: {}", report.notes);
    println!("\nReport saved to: {}\n", output_file.display());

    if report.success {
        std::process::exit(0);
    } else {
        std::process::exit(1);
    }
}
