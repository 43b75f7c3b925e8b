//! Full Electrical Panel Reading

use serde::{Deserialize, Serialize};

/// One sampled reading from a monitored electrical panel.
///
/// All values are instantaneous measurements taken at the same moment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElectricalReading {
    /// Line voltage (V)
    pub voltage: f64,
    /// Line current (A)
    pub current: f64,
    /// Line frequency (Hz)
    pub frequency: f64,
    /// Power factor (dimensionless, nominally 0..=1)
    pub power_factor: f64,
    /// Phase A voltage (V)
    pub phase_a: f64,
    /// Phase B voltage (V)
    pub phase_b: f64,
    /// Phase C voltage (V)
    pub phase_c: f64,
    /// Equipment temperature (Celsius)
    pub temperature: f64,
}

impl ElectricalReading {
    /// Phase voltages as an array, in A/B/C order
    pub fn phases(&self) -> [f64; 3] {
        [self.phase_a, self.phase_b, self.phase_c]
    }
}
