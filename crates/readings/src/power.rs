//! Derived Power Quantities

use crate::error::ReadingError;

/// Real power in watts: V * I * pf
pub fn real_power(voltage: f64, current: f64, power_factor: f64) -> f64 {
    voltage * current * power_factor
}

/// Apparent power in volt-amperes: V * I
pub fn apparent_power(voltage: f64, current: f64) -> f64 {
    voltage * current
}

/// Reactive power in volt-amperes reactive: V * I * sqrt(1 - pf^2).
///
/// Fails when |pf| > 1, which would put the square root outside
/// its real domain.
pub fn reactive_power(voltage: f64, current: f64, power_factor: f64) -> Result<f64, ReadingError> {
    let pf_squared = power_factor * power_factor;
    if pf_squared > 1.0 {
        return Err(ReadingError::PowerFactorOutOfDomain(power_factor));
    }
    Ok(voltage * current * (1.0 - pf_squared).sqrt())
}
