//! Statistical Fault Classifier
//!
//! A standard-scaled random forest over five sensor features, persisted as
//! postcard blobs and loaded at startup.
//!
//! WARNING: the bundled training procedure fits the forest on synthetic
//! feature noise with uniformly random labels. The resulting classifier is a
//! deterministic placeholder with no predictive signal; it exists so the
//! serving path, persistence format, and taxonomy are real. Swap in a model
//! trained on labeled field data before trusting its output.

mod engine;
mod forest;
mod scaler;
mod synthetic;

pub use engine::{ModelDiagnoser, ModelDiagnosis, ModelFault, FOREST_FILE, SCALER_FILE};
pub use forest::{DecisionTree, RandomForest, N_CLASSES};
pub use scaler::StandardScaler;
pub use synthetic::{FEATURE_CENTERS, FEATURE_STD_DEV, TRAINING_SAMPLES, TRAINING_SEED};

use std::path::PathBuf;
use thiserror::Error;

/// Errors while initializing or persisting the model
#[derive(Debug, Error)]
pub enum ModelError {
    /// Filesystem failure while reading or writing model state
    #[error("model state I/O failed at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Persisted blob exists but cannot be decoded
    #[error(
        "model state at {} is corrupt; remove both model files to retrain from scratch",
        .path.display()
    )]
    Corrupt {
        path: PathBuf,
        #[source]
        source: postcard::Error,
    },

    /// Exactly one of the two model files exists
    #[error(
        "partial model state: {} exists but {} is missing; remove both model files to retrain from scratch",
        .present.display(),
        .missing.display()
    )]
    PartialState { present: PathBuf, missing: PathBuf },

    /// Encoding a trained model for persistence failed
    #[error("failed to encode model state: {0}")]
    Encode(#[from] postcard::Error),
}
