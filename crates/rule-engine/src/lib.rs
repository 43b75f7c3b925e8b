//! Rule-Based Fault Diagnosis
//!
//! Deterministic threshold checks over full panel readings. Each check maps a
//! measurement to a named electrical fault; the engine aggregates them into a
//! single diagnosis with severity, confidence, and a recommended action.

mod engine;
mod fault;

pub use engine::{RuleDiagnosis, RuleEngine, Thresholds};
pub use fault::{FaultType, Severity};
