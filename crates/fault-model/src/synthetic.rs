//! Synthetic Training Set Generation
//!
//! Reproduces the original demo training distribution: gaussian feature
//! noise around nominal operating values, labels drawn uniformly at random.
//! The labels carry no signal; see the crate docs for why this stays.

use crate::forest::N_CLASSES;
use rand::rngs::StdRng;
use rand::Rng;
use rand_distr::{Distribution, Normal};
use readings::N_FEATURES;

/// Seed for the training RNG
pub const TRAINING_SEED: u64 = 42;

/// Number of synthetic samples
pub const TRAINING_SAMPLES: usize = 500;

/// Distribution centers per feature: voltage, current, temperature,
/// vibration, power factor
pub const FEATURE_CENTERS: [f64; N_FEATURES] = [230.0, 50.0, 60.0, 5.0, 0.9];

/// Shared standard deviation across features
pub const FEATURE_STD_DEV: f64 = 10.0;

/// Draw the full synthetic training set from the given RNG.
pub fn synthesize(rng: &mut StdRng) -> (Vec<[f64; N_FEATURES]>, Vec<usize>) {
    let normals: [Normal<f64>; N_FEATURES] = FEATURE_CENTERS.map(|center| {
        Normal::new(center, FEATURE_STD_DEV).expect("standard deviation is a positive constant")
    });

    let mut samples = Vec::with_capacity(TRAINING_SAMPLES);
    let mut labels = Vec::with_capacity(TRAINING_SAMPLES);
    for _ in 0..TRAINING_SAMPLES {
        let mut row = [0.0; N_FEATURES];
        for (value, normal) in row.iter_mut().zip(normals.iter()) {
            *value = normal.sample(rng);
        }
        samples.push(row);
        labels.push(rng.gen_range(0..N_CLASSES));
    }
    (samples, labels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_synthesize_shape() {
        let mut rng = StdRng::seed_from_u64(TRAINING_SEED);
        let (samples, labels) = synthesize(&mut rng);
        assert_eq!(samples.len(), TRAINING_SAMPLES);
        assert_eq!(labels.len(), TRAINING_SAMPLES);
        assert!(labels.iter().all(|&label| label < N_CLASSES));
    }

    #[test]
    fn test_synthesize_is_seed_deterministic() {
        let mut a = StdRng::seed_from_u64(TRAINING_SEED);
        let mut b = StdRng::seed_from_u64(TRAINING_SEED);
        assert_eq!(synthesize(&mut a), synthesize(&mut b));
    }

    #[test]
    fn test_feature_columns_center_near_nominals() {
        let mut rng = StdRng::seed_from_u64(TRAINING_SEED);
        let (samples, _) = synthesize(&mut rng);
        for (feature, center) in FEATURE_CENTERS.iter().enumerate() {
            let mean: f64 =
                samples.iter().map(|row| row[feature]).sum::<f64>() / TRAINING_SAMPLES as f64;
            // 500 draws at sigma 10 put the sample mean within ~2 of center
            assert!(
                (mean - center).abs() < 2.0,
                "feature {feature} mean {mean} too far from {center}"
            );
        }
    }

    #[test]
    fn test_all_classes_appear() {
        let mut rng = StdRng::seed_from_u64(TRAINING_SEED);
        let (_, labels) = synthesize(&mut rng);
        for class in 0..N_CLASSES {
            assert!(labels.contains(&class));
        }
    }
}
