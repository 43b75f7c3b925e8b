//! Alerting System
//!
//! Provides alert deduplication, hourly throttling, and severity mapping.

mod manager;

pub use manager::{AlertConfig, AlertManager, AlertState, FaultAlert};
