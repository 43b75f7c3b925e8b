//! Electrical Fault Taxonomy and Severity Levels

use serde::{Deserialize, Serialize};
use std::fmt;

/// Fault classes the rule engine can report.
///
/// This is the fine-grained electrical taxonomy. It is distinct from the
/// coarse condition classes of the statistical model and the two are never
/// merged; "Short Circuit" here and there name different label sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FaultType {
    #[serde(rename = "Short Circuit")]
    ShortCircuit,
    #[serde(rename = "Open Circuit")]
    OpenCircuit,
    #[serde(rename = "Ground Fault")]
    GroundFault,
    #[serde(rename = "Phase Imbalance")]
    PhaseImbalance,
    Overvoltage,
    Undervoltage,
    Overcurrent,
    #[serde(rename = "Harmonic Distortion")]
    HarmonicDistortion,
    #[serde(rename = "Low Power Factor")]
    LowPowerFactor,
    #[serde(rename = "No Fault")]
    None,
}

impl FaultType {
    /// Human-readable label
    pub fn as_str(&self) -> &'static str {
        match self {
            FaultType::ShortCircuit => "Short Circuit",
            FaultType::OpenCircuit => "Open Circuit",
            FaultType::GroundFault => "Ground Fault",
            FaultType::PhaseImbalance => "Phase Imbalance",
            FaultType::Overvoltage => "Overvoltage",
            FaultType::Undervoltage => "Undervoltage",
            FaultType::Overcurrent => "Overcurrent",
            FaultType::HarmonicDistortion => "Harmonic Distortion",
            FaultType::LowPowerFactor => "Low Power Factor",
            FaultType::None => "No Fault",
        }
    }

    /// Recommended corrective action
    pub fn recommended_action(&self) -> &'static str {
        match self {
            FaultType::ShortCircuit => {
                "IMMEDIATE ACTION: Isolate circuit and check for damaged wiring or components."
            }
            FaultType::OpenCircuit => "Check continuity and repair broken connections.",
            FaultType::GroundFault => {
                "Isolate system and test insulation resistance. Repair grounding issues."
            }
            FaultType::PhaseImbalance => {
                "Check load distribution across phases and rebalance if necessary."
            }
            FaultType::Overvoltage => "Check voltage regulator and power supply settings.",
            FaultType::Undervoltage => "Verify power supply and transformer settings.",
            FaultType::Overcurrent => {
                "Reduce load or check for short circuits. Verify circuit breaker rating."
            }
            FaultType::HarmonicDistortion => {
                "Install harmonic filters or upgrade power quality equipment."
            }
            FaultType::LowPowerFactor => "Install power factor correction capacitors.",
            FaultType::None => "System operating normally.",
        }
    }
}

impl fmt::Display for FaultType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Diagnosis severity, ordered from benign to critical
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    None,
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Human-readable label
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::None => "None",
            Severity::Low => "Low",
            Severity::Medium => "Medium",
            Severity::High => "High",
            Severity::Critical => "Critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::None < Severity::Low);
        assert!(Severity::Low < Severity::Medium);
        assert!(Severity::Medium < Severity::High);
        assert!(Severity::High < Severity::Critical);
    }

    #[test]
    fn test_fault_labels_serialize_with_spaces() {
        let json = serde_json::to_string(&FaultType::ShortCircuit).unwrap();
        assert_eq!(json, "\"Short Circuit\"");
        let json = serde_json::to_string(&FaultType::None).unwrap();
        assert_eq!(json, "\"No Fault\"");
        let json = serde_json::to_string(&FaultType::LowPowerFactor).unwrap();
        assert_eq!(json, "\"Low Power Factor\"");
    }

    #[test]
    fn test_every_fault_has_an_action() {
        let all = [
            FaultType::ShortCircuit,
            FaultType::OpenCircuit,
            FaultType::GroundFault,
            FaultType::PhaseImbalance,
            FaultType::Overvoltage,
            FaultType::Undervoltage,
            FaultType::Overcurrent,
            FaultType::HarmonicDistortion,
            FaultType::LowPowerFactor,
            FaultType::None,
        ];
        for fault in all {
            assert!(!fault.recommended_action().is_empty());
            assert!(!fault.as_str().is_empty());
        }
    }
}
