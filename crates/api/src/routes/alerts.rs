//! Alert Routes

use alerting::FaultAlert;
use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::ApiError;
use crate::AppState;

/// Pending (unacknowledged) alerts, newest first
#[derive(Debug, Serialize)]
pub struct AlertsResponse {
    pub data: Vec<FaultAlert>,
    pub count: usize,
}

/// Alerts awaiting acknowledgement
pub async fn get_alerts(State(state): State<AppState>) -> Json<AlertsResponse> {
    let data = state.orchestrator.pending_alerts();
    Json(AlertsResponse {
        count: data.len(),
        data,
    })
}

/// Acknowledge one alert by id
pub async fn acknowledge(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    if state.orchestrator.acknowledge_alert(id) {
        Ok(Json(json!({ "id": id, "acknowledged": true })))
    } else {
        Err(ApiError::AlertNotFound(id))
    }
}
