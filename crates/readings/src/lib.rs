//! Electrical Reading Types
//!
//! Shared input types for the diagnosis pipeline: full panel readings for the
//! rule path, compact feature frames for the model path, and derived power
//! quantities.

mod error;
mod frame;
mod power;
mod reading;

pub use error::ReadingError;
pub use frame::{FeatureFrame, N_FEATURES};
pub use power::{apparent_power, reactive_power, real_power};
pub use reading::ElectricalReading;
