//! gochat - terminal front end for the gochat engine.
//!
//! Runs a chat screen on stdin/stdout and exposes the maintenance flows
//! (cache inspection, configuration) as subcommands.

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

mod commands;

/// gochat - chat with an offline snapshot fallback
#[derive(Parser)]
#[command(name = "gochat")]
#[command(about = "Chat client with offline snapshot cache", long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the chat screen
    Chat {
        /// Display name shown next to your messages
        #[arg(short, long)]
        name: Option<String>,

        /// Skip the connectivity probe and show the cached snapshot
        #[arg(long)]
        offline: bool,
    },

    /// Inspect or clear the cached snapshot
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },

    /// Show or modify configuration
    Config {
        /// Key to get or set
        key: Option<String>,
        /// Value to set
        value: Option<String>,
    },
}

#[derive(Subcommand)]
enum CacheAction {
    /// Print the cached timeline
    Show,
    /// Remove the cached timeline
    Clear,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::WARN
    };

    FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Chat { name, offline } => commands::chat::execute(name, offline).await,
        Commands::Cache { action } => match action {
            CacheAction::Show => commands::cache::show().await,
            CacheAction::Clear => commands::cache::clear().await,
        },
        Commands::Config { key, value } => commands::config::execute(key, value).await,
    }
}
