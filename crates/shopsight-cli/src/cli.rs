//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Shopsight - AI business analysis for your store
#[derive(Parser)]
#[command(name = "shopsight")]
#[command(about = "Store analytics backend with AI business analysis", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Database path
    #[arg(long, default_value = "shopsight.db", global = true)]
    pub db: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable database encryption (not recommended for production)
    ///
    /// By default, the database is encrypted using SQLCipher.
    /// Set SHOPSIGHT_DB_KEY environment variable with your passphrase.
    /// Use --no-encrypt only for development or testing.
    #[arg(long, global = true)]
    pub no_encrypt: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database
    Init,

    /// Load store records from a JSON bundle
    Load {
        /// Bundle file to load
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Run an AI analysis of the latest business snapshot
    Analyze {
        /// Print the prompt instead of sending it to the AI backend
        #[arg(long)]
        prompt_only: bool,

        /// Analyze as of this RFC 3339 timestamp instead of now
        #[arg(long)]
        at: Option<String>,
    },

    /// Show record counts
    Status,

    /// Start the web server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Disable authentication (for local development only)
        ///
        /// WARNING: Do not use this flag when exposing the server to a network.
        /// By default, the server requires an API key from SHOPSIGHT_API_KEYS.
        #[arg(long)]
        no_auth: bool,
    },
}
