//! Shopsight CLI - AI business analysis for a small online store
//!
//! Usage:
//!   shopsight init                    Initialize database
//!   shopsight load --file bundle.json Load store records from a JSON bundle
//!   shopsight analyze                 Run an AI analysis of the latest snapshot
//!   shopsight serve --port 3000       Start web server

mod cli;
mod commands;


use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    match cli.command {
        Commands::Init => commands::cmd_init(&cli.db, cli.no_encrypt),
        Commands::Load { file } => commands::cmd_load(&cli.db, &file, cli.no_encrypt),
        Commands::Analyze { prompt_only, at } => {
            commands::cmd_analyze(&cli.db, prompt_only, at.as_deref(), cli.no_encrypt).await
        }
        Commands::Status => commands::cmd_status(&cli.db, cli.no_encrypt),
        Commands::Serve {
            port,
            host,
            no_auth,
        } => commands::cmd_serve(&cli.db, &host, port, no_auth, cli.no_encrypt).await,
    }
}
