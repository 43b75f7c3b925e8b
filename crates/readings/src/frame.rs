//! Compact Feature Frame for the Statistical Model

use crate::error::ReadingError;
use serde::{Deserialize, Serialize};

/// Number of features the statistical model consumes
pub const N_FEATURES: usize = 5;

/// The five-feature input frame the trained model was fit on.
///
/// Field order is fixed and must match the training layout:
/// voltage, current, temperature, vibration, power factor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureFrame {
    /// Line voltage (V)
    pub voltage: f64,
    /// Line current (A)
    pub current: f64,
    /// Equipment temperature (Celsius)
    pub temperature: f64,
    /// Vibration level (mm/s)
    pub vibration: f64,
    /// Power factor (dimensionless)
    pub power_factor: f64,
}

impl FeatureFrame {
    /// Build a frame, rejecting NaN and infinite inputs.
    pub fn new(
        voltage: f64,
        current: f64,
        temperature: f64,
        vibration: f64,
        power_factor: f64,
    ) -> Result<Self, ReadingError> {
        ensure_finite("voltage", voltage)?;
        ensure_finite("current", current)?;
        ensure_finite("temperature", temperature)?;
        ensure_finite("vibration", vibration)?;
        ensure_finite("power_factor", power_factor)?;
        Ok(Self {
            voltage,
            current,
            temperature,
            vibration,
            power_factor,
        })
    }

    /// Features as a fixed array in training order
    pub fn as_array(&self) -> [f64; N_FEATURES] {
        [
            self.voltage,
            self.current,
            self.temperature,
            self.vibration,
            self.power_factor,
        ]
    }
}

fn ensure_finite(field: &'static str, value: f64) -> Result<(), ReadingError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ReadingError::NotFinite { field, value })
    }
}
