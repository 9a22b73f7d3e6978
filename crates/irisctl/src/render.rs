//! Terminal rendering for irisctl output.

use iris_core::history::HistoryRecord;
use iris_core::knowledge::{KnowledgeBase, KnowledgeEntry, SafetyLevel};
use iris_core::orchestrator::{RecognitionOutcome, RecognitionReport};
use owo_colors::OwoColorize;

const THIN_SEP: &str = "------------------------------------------------------------";

pub fn report(report: &RecognitionReport) {
    println!();
    match &report.outcome {
        RecognitionOutcome::Matched(result) => {
            println!(
                "  {} {}",
                "Identified:".green().bold(),
                result.entry.name.bold()
            );
            println!(
                "  {}",
                format!("curated entry, detected as '{}'", result.detected_as).dimmed()
            );
            println!("  {:<13} {}", "Confidence:", confidence_display(result.confidence));
            entry_body(&result.entry);
        }
        RecognitionOutcome::Synthesized(entry) => {
            println!(
                "  {} {}",
                "Best guess:".yellow().bold(),
                entry.entry.name.bold()
            );
            println!(
                "  {}",
                format!(
                    "no curated entry for '{}', guidance generated",
                    entry.detected_as
                )
                .dimmed()
            );
            println!("  {:<13} {}", "Confidence:", confidence_display(entry.confidence));
            entry_body(&entry.entry);
        }
        RecognitionOutcome::DemoGuess {
            entry,
            confidence,
            note,
        } => {
            println!("  {} {}", "Demo guess:".cyan().bold(), entry.name.bold());
            println!("  {}", note.dimmed());
            println!("  {:<13} {}", "Confidence:", confidence_display(*confidence));
            entry_body(entry);
        }
        RecognitionOutcome::Failed { message } => {
            println!("  {}", message.red());
        }
    }
    println!();
    println!(
        "  {}",
        format!("{} in {}ms", report.state, report.elapsed_ms).dimmed()
    );
    println!();
}

pub fn entry_card(entry: &KnowledgeEntry) {
    println!();
    println!("  {}", entry.name.bold());
    entry_body(entry);
    println!();
}

fn entry_body(entry: &KnowledgeEntry) {
    println!("{}", THIN_SEP);
    println!("  {:<13} {}", "Category:", entry.category);
    println!("  {:<13} {}", "Safety:", safety_display(entry.safety_level));
    println!("  {:<13} {}", "Difficulty:", entry.difficulty.as_str());
    println!("  {:<13} {}", "Time:", entry.time_estimate);
    println!();
    println!("  {}", entry.description);

    if let Some(age) = &entry.age_restriction {
        let supervision = if age.supervision_required {
            format!(", supervision under {}", age.supervision_age)
        } else {
            String::new()
        };
        println!();
        println!(
            "  {}",
            format!("Ages {}+{supervision}", age.minimum_age).red()
        );
    }

    if !entry.warnings.is_empty() {
        println!();
        println!("  {}", "[WARNINGS]".red());
        for warning in &entry.warnings {
            println!("  ! {warning}");
        }
    }

    if !entry.instructions.is_empty() {
        println!();
        println!("  {}", "[HOW TO USE]".cyan());
        for (i, step) in entry.instructions.iter().enumerate() {
            println!("  {}. {}", i + 1, step.title.bold());
            println!("     {}", step.content);
        }
    }

    if !entry.common_uses.is_empty() {
        println!();
        println!("  {:<13} {}", "Common uses:", entry.common_uses.join(", "));
    }
    if !entry.materials.is_empty() {
        println!("  {:<13} {}", "Materials:", entry.materials.join(", "));
    }

    println!();
    println!("  {}", "[CARE]".cyan());
    println!("  {:<13} {}", "Maintenance:", entry.maintenance);
    println!("  {:<13} {}", "Storage:", entry.storage);
    println!("  {:<13} {}", "Lifespan:", entry.lifespan);
}

pub fn search_results(query: &str, hits: &[&KnowledgeEntry]) {
    println!();
    if hits.is_empty() {
        println!("  No entries match '{query}'.");
        println!();
        return;
    }
    println!(
        "  {} {} for '{query}'",
        hits.len().to_string().bold(),
        if hits.len() == 1 { "match" } else { "matches" }
    );
    println!("{}", THIN_SEP);
    for entry in hits {
        let name = format!("{:<22}", entry.name);
        let category = format!("{:<18}", entry.category);
        println!(
            "  {} {} {}",
            name.bold(),
            category.dimmed(),
            safety_display(entry.safety_level)
        );
    }
    println!();
}

pub fn kb_overview(kb: &KnowledgeBase) {
    println!();
    println!("  {}", "Iris Knowledge Base".bold());
    println!("{}", THIN_SEP);
    println!();
    println!("  {:<13} {}", "Entries:", kb.len());
    println!("  {:<13} {}", "Categories:", kb.categories().len());
    println!();
    for category in kb.categories() {
        println!("  {}", format!("[{}]", category.to_uppercase()).cyan());
        for entry in kb.entries().iter().filter(|e| e.category == category) {
            let name = format!("{:<22}", entry.name);
            println!("  {} {}", name, snippet(&entry.description, 46).dimmed());
        }
        println!();
    }
    println!("{}", THIN_SEP);
    println!();
}

pub fn history(records: &[HistoryRecord]) {
    println!();
    if records.is_empty() {
        println!("  No identifications recorded yet.");
        println!();
        return;
    }
    println!("  {}", "Recent identifications".bold());
    println!("{}", THIN_SEP);
    for record in records {
        let when = record.identified_at.format("%Y-%m-%d %H:%M").to_string();
        let name = format!("{:<22}", record.name);
        let source = format!("{:<12}", record.source);
        println!(
            "  {}  {} {} {}",
            when.dimmed(),
            name.bold(),
            source.dimmed(),
            confidence_display(record.confidence)
        );
    }
    println!("{}", THIN_SEP);
    println!();
}

pub fn suggestions(close: &[&KnowledgeEntry]) {
    println!();
    println!("  Close matches:");
    for entry in close {
        println!("    {}", entry.name);
    }
    println!();
}

fn safety_display(level: SafetyLevel) -> String {
    match level {
        SafetyLevel::High => "high".red().bold().to_string(),
        SafetyLevel::Medium => "medium".yellow().to_string(),
        SafetyLevel::Low => "low".green().to_string(),
    }
}

fn confidence_display(confidence: u8) -> String {
    let text = format!("{confidence}%");
    if confidence >= 80 {
        text.green().to_string()
    } else if confidence >= 60 {
        text.yellow().to_string()
    } else {
        text.red().to_string()
    }
}

fn snippet(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max).collect();
        format!("{}...", cut.trim_end())
    }
}
