//! FoodieVent CLI - Database migrations and maintenance.
//!
//! # Usage
//!
//! ```bash
//! # Apply pending migrations
//! fv-cli migrate
//!
//! # Run one status pass now
//! fv-cli refresh-status
//!
//! # Preview what a pass at a given time would change, without storing it
//! fv-cli refresh-status --at 2025-06-14T09:00:00Z --dry-run
//! ```
//!
//! Both commands read `FOODIEVENT_DATABASE_URL`, falling back to
//! `DATABASE_URL`.

#![cfg_attr(not(test), forbid(unsafe_code))]

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "fv-cli")]
#[command(author, version, about = "FoodieVent CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Bring event and ticket statuses up to date
    RefreshStatus {
        /// Evaluate statuses at this instant instead of now (RFC 3339)
        #[arg(long)]
        at: Option<DateTime<Utc>>,

        /// Report what would change without storing it
        #[arg(long)]
        dry_run: bool,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CommandError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await,
        Commands::RefreshStatus { at, dry_run } => {
            commands::status::refresh(at.unwrap_or_else(Utc::now), dry_run).await
        }
    }
}
