//! Per-Feature Standardization

use readings::N_FEATURES;
use serde::{Deserialize, Serialize};

/// Zero-mean, unit-variance scaling fitted on the training set.
///
/// Uses population variance, matching the convention of the scaler the
/// persisted blobs were originally produced with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    means: [f64; N_FEATURES],
    scales: [f64; N_FEATURES],
}

impl StandardScaler {
    /// Fit means and standard deviations per feature column.
    ///
    /// Constant columns get a scale of 1.0 so transforming them is a no-op
    /// shift instead of a division by zero.
    pub fn fit(samples: &[[f64; N_FEATURES]]) -> Self {
        let n = samples.len().max(1) as f64;
        let mut means = [0.0; N_FEATURES];
        let mut scales = [0.0; N_FEATURES];

        for sample in samples {
            for (mean, value) in means.iter_mut().zip(sample.iter()) {
                *mean += *value;
            }
        }
        for mean in means.iter_mut() {
            *mean /= n;
        }

        for sample in samples {
            for ((scale, value), mean) in scales.iter_mut().zip(sample.iter()).zip(means.iter()) {
                let centered = value - mean;
                *scale += centered * centered;
            }
        }
        for scale in scales.iter_mut() {
            *scale = (*scale / n).sqrt();
            if *scale == 0.0 {
                *scale = 1.0;
            }
        }

        Self { means, scales }
    }

    /// Standardize one feature vector
    pub fn transform(&self, features: &[f64; N_FEATURES]) -> [f64; N_FEATURES] {
        let mut scaled = [0.0; N_FEATURES];
        for i in 0..N_FEATURES {
            scaled[i] = (features[i] - self.means[i]) / self.scales[i];
        }
        scaled
    }
}
