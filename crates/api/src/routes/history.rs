//! History and Statistics Routes

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use storage::{DiagnosisRecord, DiagnosisStats};

use crate::error::ApiError;
use crate::AppState;

/// Upper bound on a single history page
const MAX_LIMIT: u32 = 100;

fn default_limit() -> u32 {
    20
}

/// Query parameters for `GET /api/v1/history`
#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    #[serde(default = "default_limit")]
    pub limit: u32,
}

/// History page, newest first
#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub data: Vec<DiagnosisRecord>,
    pub count: usize,
}

/// Most recent diagnosis records
pub async fn get_history(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let limit = query.limit.min(MAX_LIMIT);
    let data = state.orchestrator.history(limit).await?;
    Ok(Json(HistoryResponse {
        count: data.len(),
        data,
    }))
}

/// Aggregates over every recorded diagnosis
pub async fn get_stats(State(state): State<AppState>) -> Result<Json<DiagnosisStats>, ApiError> {
    Ok(Json(state.orchestrator.stats().await?))
}
