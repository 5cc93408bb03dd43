//! Shopsight Core Library
//!
//! Shared functionality for the shopsight store analytics backend:
//! - Encrypted SQLite storage for store records synced from the commerce platform
//! - Bundle import for loading records from JSON exports
//! - Pluggable AI text backends (Gemini, Ollama, mock)
//! - The business snapshot analyzer: aggregation, prompt building and reply parsing

pub mod ai;
pub mod analysis;
pub mod db;
pub mod error;
pub mod import;
pub mod models;
pub mod source;

/// Test utilities including a mock AI server
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use ai::{AIBackend, AIClient, GeminiBackend, MockBackend, OllamaBackend};
pub use analysis::{
    ActionItem, AnalysisAlert, AnalysisResult, BusinessSnapshotAnalyzer, PromptBuilder, Snapshot,
    SnapshotSummary,
};
pub use db::Database;
pub use error::{Error, ErrorKind, Result};
pub use import::{ImportBundle, ImportStats};
pub use models::*;
pub use source::SnapshotSource;
