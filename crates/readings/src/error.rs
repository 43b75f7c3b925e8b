//! Reading Error Types

use thiserror::Error;

/// Errors when constructing or deriving values from readings
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ReadingError {
    /// Value is NaN or infinite
    #[error("{field} value {value} is not a finite number")]
    NotFinite { field: &'static str, value: f64 },

    /// Power factor outside the physical domain [-1, 1]
    #[error("power factor {0} is outside [-1, 1]")]
    PowerFactorOutOfDomain(f64),
}
