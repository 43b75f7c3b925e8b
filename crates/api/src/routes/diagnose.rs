//! Diagnose Routes
//!
//! One route per strategy. Each accepts a device tag plus its strategy's
//! sensor fields and returns that strategy's result shape verbatim; the
//! two fault taxonomies stay on their own routes and are never merged.

use axum::extract::State;
use axum::Json;
use readings::{ElectricalReading, FeatureFrame};
use rule_engine::RuleDiagnosis;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::AppState;

fn default_device_id() -> String {
    "Unknown".to_string()
}

/// Body for `POST /api/v1/diagnose/rules`; every sensor field is required
#[derive(Debug, Deserialize)]
pub struct RuleDiagnoseRequest {
    #[serde(default = "default_device_id")]
    pub device_id: String,
    pub voltage: f64,
    pub current: f64,
    pub frequency: f64,
    pub power_factor: f64,
    pub phase_a: f64,
    pub phase_b: f64,
    pub phase_c: f64,
    pub temperature: f64,
}

/// Rule diagnosis with the device tag echoed back
#[derive(Debug, Serialize)]
pub struct RuleDiagnoseResponse {
    pub device_id: String,
    #[serde(flatten)]
    pub diagnosis: RuleDiagnosis,
}

/// Threshold rule diagnosis over a full panel reading
pub async fn rules(
    State(state): State<AppState>,
    Json(request): Json<RuleDiagnoseRequest>,
) -> Result<Json<RuleDiagnoseResponse>, ApiError> {
    let reading = ElectricalReading {
        voltage: request.voltage,
        current: request.current,
        frequency: request.frequency,
        power_factor: request.power_factor,
        phase_a: request.phase_a,
        phase_b: request.phase_b,
        phase_c: request.phase_c,
        temperature: request.temperature,
    };

    let diagnosis = state
        .orchestrator
        .diagnose_rules(&request.device_id, &reading)
        .await?;

    Ok(Json(RuleDiagnoseResponse {
        device_id: request.device_id,
        diagnosis,
    }))
}

/// Body for `POST /api/v1/diagnose/model`
#[derive(Debug, Deserialize)]
pub struct ModelDiagnoseRequest {
    #[serde(default = "default_device_id")]
    pub device_id: String,
    pub voltage: f64,
    pub current: f64,
    pub temperature: f64,
    pub vibration: f64,
    pub power_factor: f64,
}

/// Model diagnosis with the classified condition and input echo
#[derive(Debug, Serialize)]
pub struct ModelDiagnoseResponse {
    pub device_id: String,
    pub fault_type: String,
    /// Predicted class probability, percent
    pub confidence: f64,
    pub recommendation: String,
    pub readings: FeatureFrame,
}

/// Statistical diagnosis over a five-feature frame.
///
/// Non-finite feature values are rejected with 400 before the model runs.
pub async fn model(
    State(state): State<AppState>,
    Json(request): Json<ModelDiagnoseRequest>,
) -> Result<Json<ModelDiagnoseResponse>, ApiError> {
    let frame = FeatureFrame::new(
        request.voltage,
        request.current,
        request.temperature,
        request.vibration,
        request.power_factor,
    )?;

    let diagnosis = state
        .orchestrator
        .diagnose_model(&request.device_id, &frame)
        .await?;

    Ok(Json(ModelDiagnoseResponse {
        device_id: request.device_id,
        fault_type: diagnosis.fault.label().to_string(),
        confidence: diagnosis.confidence,
        recommendation: diagnosis.recommendation,
        readings: frame,
    }))
}
