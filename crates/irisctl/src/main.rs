//! Iris Control - CLI client for the Iris assistant core.
//!
//! Identify objects from photos, browse the knowledge base, and review
//! recent identifications.

mod commands;
mod render;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use iris_core::IrisConfig;

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "irisctl")]
#[command(about = "Iris Assistant - identify objects and learn how to use them", long_about = None)]
#[command(version = VERSION)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Identify the object in an image file
    Identify {
        /// Path to the image
        image: PathBuf,

        /// Skip the vision provider and run the offline demo path
        #[arg(long)]
        offline: bool,

        /// Print the full recognition report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Search knowledge base entries by name, category or tag
    Search {
        query: String,
    },

    /// Show recent identifications, newest first
    History,

    /// Inspect the knowledge base
    #[command(subcommand)]
    Kb(KbCommands),
}

#[derive(Subcommand)]
enum KbCommands {
    /// List entries grouped by category
    List,

    /// Show one entry in full
    Show {
        /// Entry name, case-insensitive
        name: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = IrisConfig::load();

    match cli.command {
        Commands::Identify {
            image,
            offline,
            json,
        } => commands::identify(&config, &image, offline, json).await,
        Commands::Search { query } => commands::search(&config, &query),
        Commands::History => commands::history(&config),
        Commands::Kb(KbCommands::List) => commands::kb_list(&config),
        Commands::Kb(KbCommands::Show { name }) => commands::kb_show(&config, &name),
    }
}
