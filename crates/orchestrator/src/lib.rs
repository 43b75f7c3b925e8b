//! Diagnosis Orchestration
//!
//! Holds the two diagnoser strategies plus the storage and alerting
//! collaborators, all injected at construction. Each request runs exactly
//! one strategy; the result is forwarded unchanged to storage and offered
//! to the alert manager, never combined with the other strategy's output.

use std::sync::Mutex;
use std::time::Instant;

use alerting::{AlertManager, FaultAlert};
use fault_model::{ModelDiagnoser, ModelDiagnosis, ModelFault};
use metrics::{counter, histogram};
use readings::{ElectricalReading, FeatureFrame};
use rule_engine::{FaultType, RuleDiagnosis, RuleEngine, Severity};
use serde::{Deserialize, Serialize};
use storage::{DiagnosisRecord, DiagnosisStats, NewDiagnosis, Repository, StorageError};
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Orchestration errors surfaced to the caller
#[derive(Debug, Error)]
pub enum OrchestrateError {
    /// Persisting the diagnosis failed; the diagnosis itself succeeded
    /// but the pipeline contract requires the record, so this propagates.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Input for a single diagnosis request, one variant per strategy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DiagnosisInput {
    Rules(ElectricalReading),
    Model(FeatureFrame),
}

/// Outcome of a diagnosis, keeping each strategy's own result shape.
///
/// The two fault taxonomies are never merged; callers pick the variant
/// matching the strategy they requested.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "strategy", content = "diagnosis")]
pub enum DiagnosisOutcome {
    #[serde(rename = "rules")]
    Rules(RuleDiagnosis),
    #[serde(rename = "model")]
    Model(ModelDiagnosis),
}

impl DiagnosisOutcome {
    /// Fault label from whichever taxonomy produced the outcome
    pub fn fault_label(&self) -> &str {
        match self {
            DiagnosisOutcome::Rules(d) => d.primary_fault.as_str(),
            DiagnosisOutcome::Model(d) => d.fault.label(),
        }
    }

    /// Confidence percent (0-100)
    pub fn confidence(&self) -> f64 {
        match self {
            DiagnosisOutcome::Rules(d) => d.confidence,
            DiagnosisOutcome::Model(d) => d.confidence,
        }
    }
}

/// Strategy selection, invocation, and result forwarding.
///
/// Immutable after construction apart from the alert manager, whose short
/// synchronous critical sections sit behind a mutex.
pub struct Orchestrator {
    rules: RuleEngine,
    model: ModelDiagnoser,
    repository: Repository,
    alerts: Mutex<AlertManager>,
}

impl Orchestrator {
    /// Wire up the diagnosers and collaborators
    pub fn new(
        rules: RuleEngine,
        model: ModelDiagnoser,
        repository: Repository,
        alerts: AlertManager,
    ) -> Self {
        info!("Orchestrator ready ({} model trees)", model.tree_count());
        Self {
            rules,
            model,
            repository,
            alerts: Mutex::new(alerts),
        }
    }

    /// Dispatch one request to exactly one strategy
    pub async fn diagnose(
        &self,
        device_id: &str,
        input: DiagnosisInput,
    ) -> Result<DiagnosisOutcome, OrchestrateError> {
        match input {
            DiagnosisInput::Rules(reading) => Ok(DiagnosisOutcome::Rules(
                self.diagnose_rules(device_id, &reading).await?,
            )),
            DiagnosisInput::Model(frame) => Ok(DiagnosisOutcome::Model(
                self.diagnose_model(device_id, &frame).await?,
            )),
        }
    }

    /// Run the threshold rule engine over a full panel reading, record the
    /// result, and offer any fault to the alert manager.
    pub async fn diagnose_rules(
        &self,
        device_id: &str,
        reading: &ElectricalReading,
    ) -> Result<RuleDiagnosis, OrchestrateError> {
        let started = Instant::now();
        let diagnosis = self.rules.diagnose(reading);
        histogram!("diagnosis_duration_seconds", "strategy" => "rules")
            .record(started.elapsed().as_secs_f64());
        counter!(
            "diagnoses_total",
            "strategy" => "rules",
            "fault" => diagnosis.primary_fault.as_str()
        )
        .increment(1);

        let record = NewDiagnosis {
            device_id: device_id.to_string(),
            strategy: "rules".to_string(),
            fault_type: diagnosis.primary_fault.as_str().to_string(),
            severity: Some(diagnosis.severity.as_str().to_string()),
            confidence: diagnosis.confidence,
            recommendation: diagnosis.action.clone(),
            readings_json: to_json(reading),
        };
        self.repository.insert_diagnosis(&record).await?;

        if diagnosis.primary_fault != FaultType::None {
            let message = if diagnosis.details.is_empty() {
                diagnosis.action.clone()
            } else {
                diagnosis.details.join("; ")
            };
            self.offer_alert(
                diagnosis.primary_fault.as_str(),
                diagnosis.severity,
                &message,
                diagnosis.confidence,
            );
        }

        debug!(
            "Rules diagnosis for {}: {} ({})",
            device_id, diagnosis.primary_fault, diagnosis.severity
        );
        Ok(diagnosis)
    }

    /// Run the statistical classifier over a feature frame, record the
    /// result, and offer non-normal conditions to the alert manager.
    pub async fn diagnose_model(
        &self,
        device_id: &str,
        frame: &FeatureFrame,
    ) -> Result<ModelDiagnosis, OrchestrateError> {
        let started = Instant::now();
        let diagnosis = self.model.diagnose(frame);
        histogram!("diagnosis_duration_seconds", "strategy" => "model")
            .record(started.elapsed().as_secs_f64());
        counter!(
            "diagnoses_total",
            "strategy" => "model",
            "fault" => diagnosis.fault.label()
        )
        .increment(1);

        let record = NewDiagnosis {
            device_id: device_id.to_string(),
            strategy: "model".to_string(),
            fault_type: diagnosis.fault.label().to_string(),
            // The coarse taxonomy carries no severity of its own
            severity: None,
            confidence: diagnosis.confidence,
            recommendation: diagnosis.recommendation.clone(),
            readings_json: to_json(frame),
        };
        self.repository.insert_diagnosis(&record).await?;

        if diagnosis.fault != ModelFault::Normal {
            let severity = match self.alerts.lock() {
                Ok(manager) => manager.severity_for_confidence(diagnosis.confidence),
                Err(_) => Severity::Medium,
            };
            self.offer_alert(
                diagnosis.fault.label(),
                severity,
                &diagnosis.recommendation,
                diagnosis.confidence,
            );
        }

        debug!(
            "Model diagnosis for {}: {} ({:.1}%)",
            device_id, diagnosis.fault, diagnosis.confidence
        );
        Ok(diagnosis)
    }

    /// Notification failures never fail the diagnosis
    fn offer_alert(&self, fault: &str, severity: Severity, message: &str, confidence: f64) {
        match self.alerts.lock() {
            Ok(mut manager) => {
                manager.raise(fault, severity, message, confidence);
            }
            Err(_) => warn!("Alert manager lock poisoned: alert for {} dropped", fault),
        }
    }

    /// Most recent diagnosis records, newest first
    pub async fn history(&self, limit: u32) -> Result<Vec<DiagnosisRecord>, OrchestrateError> {
        Ok(self.repository.recent(limit).await?)
    }

    /// Aggregate statistics over all recorded diagnoses
    pub async fn stats(&self) -> Result<DiagnosisStats, OrchestrateError> {
        Ok(self.repository.stats().await?)
    }

    /// Unacknowledged alerts, newest first
    pub fn pending_alerts(&self) -> Vec<FaultAlert> {
        match self.alerts.lock() {
            Ok(manager) => manager.pending(),
            Err(_) => {
                warn!("Alert manager lock poisoned: reporting no pending alerts");
                Vec::new()
            }
        }
    }

    /// Acknowledge an alert; false when the id is unknown
    pub fn acknowledge_alert(&self, id: Uuid) -> bool {
        match self.alerts.lock() {
            Ok(mut manager) => manager.acknowledge(id),
            Err(_) => false,
        }
    }

    /// Storage connectivity probe for health reporting
    pub async fn ping_storage(&self) -> Result<(), OrchestrateError> {
        Ok(self.repository.ping().await?)
    }

    /// Trees in the loaded model, for health reporting
    pub fn model_tree_count(&self) -> usize {
        self.model.tree_count()
    }
}

fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
}
