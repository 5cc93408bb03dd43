//! Status and AI health handlers

use std::sync::Arc;

use axum::{extract::State, Json};
use serde::Serialize;

use crate::{AppError, AppState};
use shopsight_core::ai::AIBackend;
use shopsight_core::TableCounts;

/// AI backend health as reported to the dashboard
#[derive(Debug, Serialize)]
pub struct AiHealthStatus {
    pub configured: bool,
    pub available: bool,
    pub model: Option<String>,
    pub host: Option<String>,
}

/// GET /api/status - Record counts per table
pub async fn get_status(State(state): State<Arc<AppState>>) -> Result<Json<TableCounts>, AppError> {
    let db = state.db.clone();
    let counts = tokio::task::spawn_blocking(move || db.counts()).await??;
    Ok(Json(counts))
}

/// GET /api/ai/health - Live health check of the configured AI backend
pub async fn get_ai_health(State(state): State<Arc<AppState>>) -> Json<AiHealthStatus> {
    let status = match &state.ai {
        Some(client) => AiHealthStatus {
            configured: true,
            available: client.health_check().await,
            model: Some(client.model().to_string()),
            host: Some(client.host().to_string()),
        },
        None => AiHealthStatus {
            configured: false,
            available: false,
            model: None,
            host: None,
        },
    };

    Json(status)
}
