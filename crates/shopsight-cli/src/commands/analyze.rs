//! Business analysis command

use std::path::Path;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use shopsight_core::ai::{AIBackend, AIClient, MockBackend};
use shopsight_core::BusinessSnapshotAnalyzer;

use super::open_db;

pub async fn cmd_analyze(
    db_path: &Path,
    prompt_only: bool,
    at: Option<&str>,
    no_encrypt: bool,
) -> Result<()> {
    let now = parse_at(at)?;
    let db = open_db(db_path, no_encrypt)?;

    if prompt_only {
        // The prompt never reaches the backend, so any client will do
        let ai = AIClient::from_env().unwrap_or_else(|| AIClient::Mock(MockBackend::new()));
        let analyzer = BusinessSnapshotAnalyzer::new(db, ai);
        let prompt = analyzer
            .build_prompt_at(now)
            .await
            .context("Failed to build analysis prompt")?;
        println!("{}", prompt);
        return Ok(());
    }

    let Some(ai) = AIClient::from_env() else {
        bail!("No AI backend configured. Set GEMINI_API_KEY, or AI_BACKEND=ollama with OLLAMA_HOST");
    };

    println!("🤖 Analyzing with {} ({})...", ai.model(), ai.host());
    let analyzer = BusinessSnapshotAnalyzer::new(db, ai);
    let result = analyzer.analyze_at(now).await.context("Analysis failed")?;

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

/// `--at` as an RFC 3339 timestamp, or the current time
pub fn parse_at(at: Option<&str>) -> Result<DateTime<Utc>> {
    match at {
        Some(s) => Ok(DateTime::parse_from_rfc3339(s)
            .with_context(|| format!("Invalid --at timestamp '{}' (expected RFC 3339)", s))?
            .with_timezone(&Utc)),
        None => Ok(Utc::now()),
    }
}
