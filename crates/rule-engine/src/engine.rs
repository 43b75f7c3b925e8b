//! Threshold Check Engine

use crate::fault::{FaultType, Severity};
use readings::ElectricalReading;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Readings below this power factor are treated as implausible and
/// lower diagnosis confidence.
const IMPLAUSIBLE_POWER_FACTOR: f64 = 0.7;

/// Severity assigned to a single fault class. Faults absent from this
/// table fall back to Medium.
///
/// Short Circuit and Ground Fault have no emitting check yet; their
/// entries rank them for the day a dedicated detector lands.
const SEVERITY_RANKING: &[(FaultType, Severity)] = &[
    (FaultType::ShortCircuit, Severity::Critical),
    (FaultType::GroundFault, Severity::Critical),
    (FaultType::Overcurrent, Severity::High),
    (FaultType::Overvoltage, Severity::High),
    (FaultType::PhaseImbalance, Severity::Medium),
    (FaultType::LowPowerFactor, Severity::Low),
];

/// Detection thresholds for the rule checks
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Thresholds {
    /// Line voltage valid range (V)
    pub voltage_range: (f64, f64),
    /// Maximum line current (A)
    pub current_max: f64,
    /// Line frequency valid range (Hz)
    pub frequency_range: (f64, f64),
    /// Minimum acceptable power factor
    pub power_factor_min: f64,
    /// Maximum phase deviation from the three-phase average (%)
    pub phase_imbalance_max: f64,
    /// Maximum equipment temperature (Celsius)
    pub temperature_max: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            voltage_range: (200.0, 250.0),
            current_max: 30.0,
            frequency_range: (48.0, 52.0),
            power_factor_min: 0.85,
            phase_imbalance_max: 5.0,
            temperature_max: 80.0,
        }
    }
}

/// Result of a rule-based diagnosis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleDiagnosis {
    /// First fault found in check order, or `No Fault`
    pub primary_fault: FaultType,
    /// Every fault found, in check order
    pub all_faults: Vec<FaultType>,
    /// Aggregate severity across detected faults
    pub severity: Severity,
    /// Diagnosis confidence (0-100%)
    pub confidence: f64,
    /// Human-readable line per triggered check; not machine-parsed
    pub details: Vec<String>,
    /// Recommended action for the primary fault
    pub action: String,
}

/// Deterministic threshold diagnoser for electrical panel readings
pub struct RuleEngine {
    thresholds: Thresholds,
}

impl RuleEngine {
    /// Create an engine with the given thresholds
    pub fn new(thresholds: Thresholds) -> Self {
        Self { thresholds }
    }

    /// Run every check against a reading, in fixed order: voltage, current,
    /// frequency, power factor, phase imbalance, temperature.
    ///
    /// Never fails; any finite reading produces a diagnosis.
    pub fn diagnose(&self, reading: &ElectricalReading) -> RuleDiagnosis {
        let t = &self.thresholds;
        let mut faults = Vec::new();
        let mut details = Vec::new();

        if let Some(fault) = self.check_voltage(reading.voltage) {
            faults.push(fault);
            details.push(format!(
                "Voltage: {}V (Normal: {}-{}V)",
                reading.voltage, t.voltage_range.0, t.voltage_range.1
            ));
        }

        if let Some(fault) = self.check_current(reading.current) {
            faults.push(fault);
            details.push(format!(
                "Current: {}A (Max: {}A)",
                reading.current, t.current_max
            ));
        }

        if let Some(fault) = self.check_frequency(reading.frequency) {
            faults.push(fault);
            details.push(format!(
                "Frequency: {}Hz (Normal: {}-{}Hz)",
                reading.frequency, t.frequency_range.0, t.frequency_range.1
            ));
        }

        if let Some(fault) = self.check_power_factor(reading.power_factor) {
            faults.push(fault);
            details.push(format!(
                "Power Factor: {:.2} (Min: {})",
                reading.power_factor, t.power_factor_min
            ));
        }

        if let Some(fault) = self.check_phase_imbalance(reading.phases()) {
            faults.push(fault);
            details.push(format!(
                "Phase Imbalance detected: A={:.1}V, B={:.1}V, C={:.1}V",
                reading.phase_a, reading.phase_b, reading.phase_c
            ));
        }

        if let Some(fault) = self.check_temperature(reading.temperature) {
            faults.push(fault);
            details.push(format!(
                "Temperature: {}°C (Max: {}°C)",
                reading.temperature, t.temperature_max
            ));
        }

        let primary_fault = faults.first().copied().unwrap_or(FaultType::None);
        let severity = severity_of(&faults);
        let confidence = self.confidence(reading);

        debug!(
            "Rule diagnosis: {} fault(s), primary {}",
            faults.len(),
            primary_fault
        );

        RuleDiagnosis {
            primary_fault,
            all_faults: faults,
            severity,
            confidence,
            details,
            action: primary_fault.recommended_action().to_string(),
        }
    }

    fn check_voltage(&self, voltage: f64) -> Option<FaultType> {
        let (min, max) = self.thresholds.voltage_range;
        if voltage > max {
            Some(FaultType::Overvoltage)
        } else if voltage < min {
            Some(FaultType::Undervoltage)
        } else {
            None
        }
    }

    fn check_current(&self, current: f64) -> Option<FaultType> {
        if current > self.thresholds.current_max {
            Some(FaultType::Overcurrent)
        } else {
            None
        }
    }

    fn check_frequency(&self, frequency: f64) -> Option<FaultType> {
        let (min, max) = self.thresholds.frequency_range;
        if frequency < min || frequency > max {
            Some(FaultType::HarmonicDistortion)
        } else {
            None
        }
    }

    fn check_power_factor(&self, power_factor: f64) -> Option<FaultType> {
        if power_factor < self.thresholds.power_factor_min {
            Some(FaultType::LowPowerFactor)
        } else {
            None
        }
    }

    /// Flags when any phase deviates from the three-phase average by more
    /// than the configured percentage. A zero average would make relative
    /// deviation undefined, so the check is skipped for it.
    fn check_phase_imbalance(&self, phases: [f64; 3]) -> Option<FaultType> {
        let avg = (phases[0] + phases[1] + phases[2]) / 3.0;
        if avg == 0.0 {
            return None;
        }

        let max_deviation = phases
            .iter()
            .map(|v| ((v - avg) / avg).abs() * 100.0)
            .fold(0.0, f64::max);

        if max_deviation > self.thresholds.phase_imbalance_max {
            Some(FaultType::PhaseImbalance)
        } else {
            None
        }
    }

    fn check_temperature(&self, temperature: f64) -> Option<FaultType> {
        // Sustained overtemperature is reported as an overcurrent symptom
        if temperature > self.thresholds.temperature_max {
            Some(FaultType::Overcurrent)
        } else {
            None
        }
    }

    /// Confidence starts at 100% and drops when readings sit so far outside
    /// the normal bands that sensor error becomes plausible.
    fn confidence(&self, reading: &ElectricalReading) -> f64 {
        let t = &self.thresholds;
        let mut confidence: f64 = 100.0;

        if reading.voltage > t.voltage_range.1 * 1.5 || reading.voltage < t.voltage_range.0 * 0.5 {
            confidence -= 10.0;
        }
        if reading.current > t.current_max * 1.5 {
            confidence -= 10.0;
        }
        if reading.power_factor < IMPLAUSIBLE_POWER_FACTOR {
            confidence -= 15.0;
        }

        confidence.clamp(0.0, 100.0)
    }
}

impl Default for RuleEngine {
    fn default() -> Self {
        Self::new(Thresholds::default())
    }
}

/// Aggregate severity: `None` without faults, Critical at three or more
/// simultaneous faults, otherwise the ranking of the first ranked fault.
fn severity_of(faults: &[FaultType]) -> Severity {
    if faults.is_empty() {
        return Severity::None;
    }
    if faults.len() >= 3 {
        return Severity::Critical;
    }
    for fault in faults {
        if let Some((_, severity)) = SEVERITY_RANKING.iter().find(|(f, _)| f == fault) {
            return *severity;
        }
    }
    Severity::Medium
}
