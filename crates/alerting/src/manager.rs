//! Alert Manager Implementation

use chrono::{DateTime, Utc};
use rule_engine::Severity;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Retained alert log size; older entries are dropped
const MAX_RETAINED: usize = 100;

/// Alert configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertConfig {
    /// Confidence threshold for alerts, percent (default: 75)
    pub confidence_threshold: f64,
    /// Confidence threshold for critical alerts, percent (default: 90)
    pub critical_threshold: f64,
    /// Cooldown period between duplicate alerts (seconds)
    pub cooldown_seconds: u64,
    /// Maximum alerts per hour before throttling
    pub max_alerts_per_hour: usize,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: 75.0,
            critical_threshold: 90.0,
            cooldown_seconds: 1800, // 30 minutes
            max_alerts_per_hour: 10,
        }
    }
}

/// Per-fault firing state
#[derive(Debug, Clone)]
pub struct AlertState {
    /// Last time this fault fired
    pub last_fired: Instant,
    /// Number of times fired
    pub fire_count: usize,
}

/// A raised alert
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaultAlert {
    pub id: Uuid,
    /// Fault label from whichever taxonomy raised it
    pub fault: String,
    pub severity: Severity,
    pub message: String,
    /// Confidence percent at raise time
    pub confidence: f64,
    pub raised_at: DateTime<Utc>,
    pub acknowledged: bool,
}

/// Alert manager for deduplication and throttling
pub struct AlertManager {
    config: AlertConfig,
    /// Firing state by fault label
    states: HashMap<String, AlertState>,
    /// Retained alerts, oldest first
    alerts: VecDeque<FaultAlert>,
    /// Alerts fired in the current hour
    hourly_count: usize,
    hour_start: Instant,
}

impl AlertManager {
    /// Create a new alert manager
    pub fn new(config: AlertConfig) -> Self {
        info!("Creating alert manager with config: {:?}", config);
        Self {
            config,
            states: HashMap::new(),
            alerts: VecDeque::new(),
            hourly_count: 0,
            hour_start: Instant::now(),
        }
    }

    /// Check confidence, hourly throttle, and per-fault cooldown
    pub fn should_fire(&mut self, fault: &str, confidence: f64) -> bool {
        if confidence < self.config.confidence_threshold {
            debug!(
                "Alert suppressed: confidence {} < threshold {}",
                confidence, self.config.confidence_threshold
            );
            return false;
        }

        if self.hour_start.elapsed() > Duration::from_secs(3600) {
            self.hourly_count = 0;
            self.hour_start = Instant::now();
        }

        if self.hourly_count >= self.config.max_alerts_per_hour {
            warn!("Alert throttled: max alerts per hour reached");
            return false;
        }

        if let Some(state) = self.states.get(fault) {
            let cooldown = Duration::from_secs(self.config.cooldown_seconds);
            if state.last_fired.elapsed() < cooldown {
                debug!("Alert suppressed: in cooldown period");
                return false;
            }
        }

        true
    }

    /// Raise an alert if the gates allow it; returns the new entry when fired
    pub fn raise(
        &mut self,
        fault: &str,
        severity: Severity,
        message: &str,
        confidence: f64,
    ) -> Option<FaultAlert> {
        if !self.should_fire(fault, confidence) {
            return None;
        }

        self.hourly_count += 1;
        let state = self
            .states
            .entry(fault.to_string())
            .or_insert_with(|| AlertState {
                last_fired: Instant::now(),
                fire_count: 0,
            });
        state.last_fired = Instant::now();
        state.fire_count += 1;
        let fire_count = state.fire_count;

        let alert = FaultAlert {
            id: Uuid::new_v4(),
            fault: fault.to_string(),
            severity,
            message: message.to_string(),
            confidence,
            raised_at: Utc::now(),
            acknowledged: false,
        };

        if self.alerts.len() >= MAX_RETAINED {
            self.alerts.pop_front();
        }
        self.alerts.push_back(alert.clone());

        info!("Alert raised: {} {} (count: {})", severity, fault, fire_count);
        Some(alert)
    }

    /// Acknowledge an alert by id; false when the id is unknown
    pub fn acknowledge(&mut self, id: Uuid) -> bool {
        match self.alerts.iter_mut().find(|alert| alert.id == id) {
            Some(alert) => {
                alert.acknowledged = true;
                info!("Alert acknowledged: {} ({})", alert.fault, id);
                true
            }
            None => false,
        }
    }

    /// Map a confidence percent onto a severity level
    pub fn severity_for_confidence(&self, confidence: f64) -> Severity {
        if confidence >= self.config.critical_threshold {
            Severity::Critical
        } else if confidence >= 85.0 {
            Severity::High
        } else if confidence >= self.config.confidence_threshold {
            Severity::Medium
        } else {
            Severity::Low
        }
    }

    /// Unacknowledged alerts, newest first
    pub fn pending(&self) -> Vec<FaultAlert> {
        self.alerts
            .iter()
            .rev()
            .filter(|alert| !alert.acknowledged)
            .cloned()
            .collect()
    }

    /// Retained alerts, newest first
    pub fn recent(&self, limit: usize) -> Vec<FaultAlert> {
        self.alerts.iter().rev().take(limit).cloned().collect()
    }

    /// Alerts fired in the current hour
    pub fn hourly_count(&self) -> usize {
        self.hourly_count
    }

    /// Drop all alert state
    pub fn clear(&mut self) {
        self.states.clear();
        self.alerts.clear();
        self.hourly_count = 0;
    }
}

impl Default for AlertManager {
    fn default() -> Self {
        Self::new(AlertConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confidence_threshold() {
        let mut manager = AlertManager::default();
        assert!(manager
            .raise("Overvoltage", Severity::High, "check regulator", 50.0)
            .is_none());
        assert!(manager
            .raise("Overvoltage", Severity::High, "check regulator", 85.0)
            .is_some());
    }

    #[test]
    fn test_cooldown_deduplicates() {
        let config = AlertConfig {
            cooldown_seconds: 60,
            ..Default::default()
        };
        let mut manager = AlertManager::new(config);

        assert!(manager
            .raise("Overvoltage", Severity::High, "check regulator", 85.0)
            .is_some());
        // Immediate duplicate is suppressed
        assert!(manager
            .raise("Overvoltage", Severity::High, "check regulator", 85.0)
            .is_none());
        // A different fault is unaffected by that cooldown
        assert!(manager
            .raise("Overcurrent", Severity::High, "reduce load", 85.0)
            .is_some());
    }

    #[test]
    fn test_hourly_throttle() {
        let config = AlertConfig {
            max_alerts_per_hour: 2,
            cooldown_seconds: 0,
            ..Default::default()
        };
        let mut manager = AlertManager::new(config);

        assert!(manager.raise("A", Severity::High, "m", 90.0).is_some());
        assert!(manager.raise("B", Severity::High, "m", 90.0).is_some());
        assert!(manager.raise("C", Severity::High, "m", 90.0).is_none());
        assert_eq!(manager.hourly_count(), 2);
    }

    #[test]
    fn test_severity_for_confidence() {
        let manager = AlertManager::default();
        assert_eq!(manager.severity_for_confidence(95.0), Severity::Critical);
        assert_eq!(manager.severity_for_confidence(87.0), Severity::High);
        assert_eq!(manager.severity_for_confidence(78.0), Severity::Medium);
        assert_eq!(manager.severity_for_confidence(50.0), Severity::Low);
    }

    #[test]
    fn test_acknowledge_by_id() {
        let mut manager = AlertManager::default();
        let alert = manager
            .raise("Overvoltage", Severity::High, "check regulator", 95.0)
            .unwrap();

        assert_eq!(manager.pending().len(), 1);
        assert!(manager.acknowledge(alert.id));
        assert!(manager.pending().is_empty());
        // Acked alerts stay in the retained log
        assert_eq!(manager.recent(10).len(), 1);
        assert!(manager.recent(10)[0].acknowledged);

        assert!(!manager.acknowledge(Uuid::new_v4()));
    }

    #[test]
    fn test_retention_cap() {
        let config = AlertConfig {
            cooldown_seconds: 0,
            max_alerts_per_hour: usize::MAX,
            ..Default::default()
        };
        let mut manager = AlertManager::new(config);
        for i in 0..(MAX_RETAINED + 20) {
            manager.raise(&format!("fault-{i}"), Severity::High, "m", 90.0);
        }
        assert_eq!(manager.recent(usize::MAX).len(), MAX_RETAINED);
    }

    #[test]
    fn test_pending_newest_first() {
        let config = AlertConfig {
            cooldown_seconds: 0,
            ..Default::default()
        };
        let mut manager = AlertManager::new(config);
        manager.raise("First", Severity::High, "m", 90.0);
        manager.raise("Second", Severity::Critical, "m", 95.0);

        let pending = manager.pending();
        assert_eq!(pending[0].fault, "Second");
        assert_eq!(pending[1].fault, "First");
    }
}
