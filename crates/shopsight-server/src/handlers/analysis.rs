//! Business analysis handler

use std::sync::Arc;

use axum::{extract::State, Json};
use tracing::info;

use crate::{AppError, AppState};
use shopsight_core::{AnalysisResult, BusinessSnapshotAnalyzer, Error};

/// GET /api/analysis - Run an AI analysis of the latest business snapshot
///
/// 404 when no daily report exists yet; 500 when storage or the AI service
/// fails, or the AI reply cannot be parsed.
pub async fn get_analysis(
    State(state): State<Arc<AppState>>,
) -> Result<Json<AnalysisResult>, AppError> {
    let ai = state.ai.clone().ok_or_else(|| {
        AppError::internal(
            "AI service is not configured",
            Error::Upstream("no AI backend configured".into()),
        )
    })?;

    let analyzer = BusinessSnapshotAnalyzer::new(state.db.clone(), ai);
    let result = analyzer.analyze().await?;

    info!(
        alerts = result.alerts.len(),
        insights = result.insights.len(),
        "Served business analysis"
    );

    Ok(Json(result))
}
