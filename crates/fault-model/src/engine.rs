//! Model Initialization and Inference

use crate::forest::{RandomForest, N_CLASSES};
use crate::scaler::StandardScaler;
use crate::synthetic::{synthesize, TRAINING_SEED};
use crate::ModelError;
use rand::rngs::StdRng;
use rand::SeedableRng;
use readings::FeatureFrame;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Persisted scaler blob filename
pub const SCALER_FILE: &str = "scaler.bin";

/// Persisted forest blob filename
pub const FOREST_FILE: &str = "fault_model.bin";

/// Trees in a freshly trained forest
const N_TREES: usize = 100;

/// Condition classes of the statistical model.
///
/// Coarser than the rule engine's electrical taxonomy and deliberately kept
/// apart from it; the two label sets are never merged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelFault {
    #[serde(rename = "Normal Operation")]
    Normal,
    Overheat,
    Overload,
    #[serde(rename = "Short Circuit")]
    ShortCircuit,
}

impl ModelFault {
    /// Classes in model output order; index with a predicted class id
    pub const CLASSES: [ModelFault; N_CLASSES] = [
        ModelFault::Normal,
        ModelFault::Overheat,
        ModelFault::Overload,
        ModelFault::ShortCircuit,
    ];

    /// Human-readable label
    pub fn label(&self) -> &'static str {
        match self {
            ModelFault::Normal => "Normal Operation",
            ModelFault::Overheat => "Overheat",
            ModelFault::Overload => "Overload",
            ModelFault::ShortCircuit => "Short Circuit",
        }
    }

    /// Recommended response for this condition
    pub fn recommendation(&self) -> &'static str {
        match self {
            ModelFault::Normal => "System operating normally. Continue monitoring.",
            ModelFault::Overheat => "Reduce load or improve cooling. Check ventilation.",
            ModelFault::Overload => "Reduce load immediately. Inspect circuit breaker.",
            ModelFault::ShortCircuit => "EMERGENCY: Shut down immediately. Check for faults.",
        }
    }
}

impl std::fmt::Display for ModelFault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Result of a statistical diagnosis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelDiagnosis {
    /// Predicted condition class
    pub fault: ModelFault,
    /// Probability estimate of the predicted class (0-100%)
    pub confidence: f64,
    /// Recommended response
    pub recommendation: String,
}

/// Scaler plus forest, immutable once initialized.
///
/// Safe to share across threads behind a plain reference; inference never
/// mutates.
#[derive(Debug)]
pub struct ModelDiagnoser {
    scaler: StandardScaler,
    forest: RandomForest,
}

impl ModelDiagnoser {
    /// Load persisted model state from `model_dir`, or train from scratch
    /// and persist when neither file exists.
    ///
    /// A half-present or undecodable state is an error, never a silent
    /// retrain: retraining would swap the taxonomy model underneath the
    /// operator.
    pub fn init(model_dir: &Path) -> Result<Self, ModelError> {
        let scaler_path = model_dir.join(SCALER_FILE);
        let forest_path = model_dir.join(FOREST_FILE);

        match (scaler_path.exists(), forest_path.exists()) {
            (true, true) => {
                let diagnoser = Self::load(&scaler_path, &forest_path)?;
                info!(
                    "Loaded fault model from {} ({} trees)",
                    model_dir.display(),
                    diagnoser.forest.len()
                );
                Ok(diagnoser)
            }
            (false, false) => {
                info!("No persisted fault model, training from scratch");
                let diagnoser = Self::train(TRAINING_SEED);
                diagnoser.persist(model_dir, &scaler_path, &forest_path)?;
                info!("Trained and persisted fault model to {}", model_dir.display());
                Ok(diagnoser)
            }
            (true, false) => {
                warn!("Fault model state is partial");
                Err(ModelError::PartialState {
                    present: scaler_path,
                    missing: forest_path,
                })
            }
            (false, true) => {
                warn!("Fault model state is partial");
                Err(ModelError::PartialState {
                    present: forest_path,
                    missing: scaler_path,
                })
            }
        }
    }

    /// Train scaler and forest on the synthetic set, without touching disk.
    pub fn train(seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let (samples, labels) = synthesize(&mut rng);

        let scaler = StandardScaler::fit(&samples);
        let scaled: Vec<_> = samples.iter().map(|row| scaler.transform(row)).collect();
        let forest = RandomForest::fit(&scaled, &labels, N_TREES, &mut rng);

        Self { scaler, forest }
    }

    fn load(scaler_path: &Path, forest_path: &Path) -> Result<Self, ModelError> {
        let scaler = decode(scaler_path)?;
        let forest = decode(forest_path)?;
        Ok(Self { scaler, forest })
    }

    fn persist(
        &self,
        model_dir: &Path,
        scaler_path: &Path,
        forest_path: &Path,
    ) -> Result<(), ModelError> {
        fs::create_dir_all(model_dir).map_err(|source| ModelError::Io {
            path: model_dir.to_path_buf(),
            source,
        })?;
        write_blob(scaler_path, &postcard::to_allocvec(&self.scaler)?)?;
        write_blob(forest_path, &postcard::to_allocvec(&self.forest)?)?;
        Ok(())
    }

    /// Classify one feature frame.
    ///
    /// Total over finite input; frames are validated at construction.
    pub fn diagnose(&self, frame: &FeatureFrame) -> ModelDiagnosis {
        let scaled = self.scaler.transform(&frame.as_array());
        let (class, probability) = self.forest.predict(&scaled);
        let fault = ModelFault::CLASSES[class];
        ModelDiagnosis {
            fault,
            confidence: probability * 100.0,
            recommendation: fault.recommendation().to_string(),
        }
    }

    /// Trees in the loaded forest
    pub fn tree_count(&self) -> usize {
        self.forest.len()
    }
}

fn decode<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ModelError> {
    let bytes = fs::read(path).map_err(|source| ModelError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    postcard::from_bytes(&bytes).map_err(|source| ModelError::Corrupt {
        path: path.to_path_buf(),
        source,
    })
}

fn write_blob(path: &Path, bytes: &[u8]) -> Result<(), ModelError> {
    fs::write(path, bytes).map_err(|source| ModelError::Io {
        path: PathBuf::from(path),
        source,
    })
}
