//! Compact CART Random Forest
//!
//! Bootstrap-aggregated gini decision trees with square-root feature
//! subsampling, small enough to serialize whole.

use rand::rngs::StdRng;
use rand::Rng;
use readings::N_FEATURES;
use serde::{Deserialize, Serialize};

/// Number of condition classes the forest votes over
pub const N_CLASSES: usize = 4;

/// Nodes below this many samples become leaves
const MIN_SAMPLES_SPLIT: usize = 2;

#[derive(Debug, Clone, Serialize, Deserialize)]
enum Node {
    Leaf {
        distribution: [f64; N_CLASSES],
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

/// One gini-trained decision tree
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    root: Node,
}

impl DecisionTree {
    /// Grow a tree over the given sample indices until leaves are pure or
    /// no split improves them.
    pub fn fit(
        samples: &[[f64; N_FEATURES]],
        labels: &[usize],
        indices: &[usize],
        rng: &mut StdRng,
    ) -> Self {
        Self {
            root: grow(samples, labels, indices, rng),
        }
    }

    /// Class distribution of the leaf this feature vector falls into
    pub fn predict_proba(&self, features: &[f64; N_FEATURES]) -> [f64; N_CLASSES] {
        let mut node = &self.root;
        loop {
            match node {
                Node::Leaf { distribution } => return *distribution,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if features[*feature] <= *threshold {
                        left
                    } else {
                        right
                    };
                }
            }
        }
    }
}

fn grow(
    samples: &[[f64; N_FEATURES]],
    labels: &[usize],
    indices: &[usize],
    rng: &mut StdRng,
) -> Node {
    let counts = class_counts(labels, indices);

    if indices.len() < MIN_SAMPLES_SPLIT || is_pure(&counts) {
        return leaf(&counts);
    }

    let Some((feature, threshold)) = best_split(samples, labels, indices, rng) else {
        return leaf(&counts);
    };

    let (left_indices, right_indices): (Vec<usize>, Vec<usize>) = indices
        .iter()
        .copied()
        .partition(|&i| samples[i][feature] <= threshold);

    // A midpoint between adjacent floats can round onto one of them and
    // leave a side empty; a leaf is the only sound result then.
    if left_indices.is_empty() || right_indices.is_empty() {
        return leaf(&counts);
    }

    Node::Split {
        feature,
        threshold,
        left: Box::new(grow(samples, labels, &left_indices, rng)),
        right: Box::new(grow(samples, labels, &right_indices, rng)),
    }
}

/// Best (feature, threshold) by weighted gini impurity over a random
/// sqrt-sized feature subset. Returns None when every candidate feature is
/// constant across the node.
fn best_split(
    samples: &[[f64; N_FEATURES]],
    labels: &[usize],
    indices: &[usize],
    rng: &mut StdRng,
) -> Option<(usize, f64)> {
    let max_features = (N_FEATURES as f64).sqrt().floor() as usize;

    // Partial Fisher-Yates draw of max_features distinct features
    let mut features: [usize; N_FEATURES] = std::array::from_fn(|i| i);
    for i in 0..max_features {
        let j = rng.gen_range(i..N_FEATURES);
        features.swap(i, j);
    }

    let mut best: Option<(usize, f64, f64)> = None;
    let total = indices.len() as f64;

    for &feature in &features[..max_features] {
        let mut order = indices.to_vec();
        order.sort_by(|&a, &b| samples[a][feature].total_cmp(&samples[b][feature]));

        let mut left_counts = [0u32; N_CLASSES];
        let mut right_counts = class_counts(labels, &order);

        for split_at in 1..order.len() {
            let moved = order[split_at - 1];
            left_counts[labels[moved]] += 1;
            right_counts[labels[moved]] -= 1;

            let value = samples[moved][feature];
            let next = samples[order[split_at]][feature];
            if value == next {
                continue;
            }

            let n_left = split_at as f64;
            let n_right = total - n_left;
            let weighted =
                (n_left * gini(&left_counts) + n_right * gini(&right_counts)) / total;

            if best.map_or(true, |(_, _, g)| weighted < g) {
                best = Some((feature, (value + next) / 2.0, weighted));
            }
        }
    }

    best.map(|(feature, threshold, _)| (feature, threshold))
}

fn class_counts(labels: &[usize], indices: &[usize]) -> [u32; N_CLASSES] {
    let mut counts = [0u32; N_CLASSES];
    for &i in indices {
        counts[labels[i]] += 1;
    }
    counts
}

fn is_pure(counts: &[u32; N_CLASSES]) -> bool {
    counts.iter().filter(|&&c| c > 0).count() <= 1
}

fn leaf(counts: &[u32; N_CLASSES]) -> Node {
    let total: u32 = counts.iter().sum();
    let mut distribution = [0.0; N_CLASSES];
    if total > 0 {
        for (slot, &count) in distribution.iter_mut().zip(counts.iter()) {
            *slot = f64::from(count) / f64::from(total);
        }
    }
    Node::Leaf { distribution }
}

fn gini(counts: &[u32; N_CLASSES]) -> f64 {
    let total: u32 = counts.iter().sum();
    if total == 0 {
        return 0.0;
    }
    let total = f64::from(total);
    1.0 - counts
        .iter()
        .map(|&c| {
            let p = f64::from(c) / total;
            p * p
        })
        .sum::<f64>()
}

/// Bootstrap ensemble of decision trees
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForest {
    trees: Vec<DecisionTree>,
}

impl RandomForest {
    /// Fit `n_trees` trees, each on a bootstrap resample of the data.
    pub fn fit(
        samples: &[[f64; N_FEATURES]],
        labels: &[usize],
        n_trees: usize,
        rng: &mut StdRng,
    ) -> Self {
        assert!(n_trees > 0, "forest needs at least one tree");
        let n = samples.len();
        let mut trees = Vec::with_capacity(n_trees);
        for _ in 0..n_trees {
            let bootstrap: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
            trees.push(DecisionTree::fit(samples, labels, &bootstrap, rng));
        }
        Self { trees }
    }

    /// Average of per-tree leaf distributions
    pub fn predict_proba(&self, features: &[f64; N_FEATURES]) -> [f64; N_CLASSES] {
        let mut acc = [0.0; N_CLASSES];
        for tree in &self.trees {
            let dist = tree.predict_proba(features);
            for (slot, p) in acc.iter_mut().zip(dist.iter()) {
                *slot += *p;
            }
        }
        let n = self.trees.len() as f64;
        for slot in acc.iter_mut() {
            *slot /= n;
        }
        acc
    }

    /// Predicted class index and its probability estimate
    pub fn predict(&self, features: &[f64; N_FEATURES]) -> (usize, f64) {
        let proba = self.predict_proba(features);
        let mut best = 0;
        for class in 1..N_CLASSES {
            if proba[class] > proba[best] {
                best = class;
            }
        }
        (best, proba[best])
    }

    /// Number of trees in the ensemble
    pub fn len(&self) -> usize {
        self.trees.len()
    }

    /// True when the ensemble holds no trees
    pub fn is_empty(&self) -> bool {
        self.trees.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    /// Two clusters labeled 0 and 1, separable on every feature so any
    /// sqrt-subsampled feature set can split them
    fn separable_data() -> (Vec<[f64; N_FEATURES]>, Vec<usize>) {
        let mut samples = Vec::new();
        let mut labels = Vec::new();
        for i in 0..30 {
            let jitter = f64::from(i % 5) * 0.01;
            samples.push([
                -10.0 + jitter,
                -8.0 + jitter,
                -12.0 - jitter,
                -9.0,
                -10.0 - jitter,
            ]);
            labels.push(0);
            samples.push([
                10.0 + jitter,
                8.0 + jitter,
                12.0 - jitter,
                9.0,
                10.0 + jitter,
            ]);
            labels.push(1);
        }
        (samples, labels)
    }

    #[test]
    fn test_forest_learns_separable_classes() {
        let (samples, labels) = separable_data();
        let mut rng = StdRng::seed_from_u64(7);
        let forest = RandomForest::fit(&samples, &labels, 25, &mut rng);

        let (class, confidence) = forest.predict(&[-10.0, -8.0, -12.0, -9.0, -10.0]);
        assert_eq!(class, 0);
        assert!(confidence > 0.9);

        let (class, confidence) = forest.predict(&[10.0, 8.0, 12.0, 9.0, 10.0]);
        assert_eq!(class, 1);
        assert!(confidence > 0.9);
    }

    #[test]
    fn test_proba_sums_to_one() {
        let (samples, labels) = separable_data();
        let mut rng = StdRng::seed_from_u64(7);
        let forest = RandomForest::fit(&samples, &labels, 10, &mut rng);

        for point in [[0.0; N_FEATURES], [3.0, 1.0, -2.0, 0.5, 0.0]] {
            let proba = forest.predict_proba(&point);
            let sum: f64 = proba.iter().sum();
            assert!((sum - 1.0).abs() < 1e-9, "probabilities sum to {sum}");
            assert!(proba.iter().all(|&p| (0.0..=1.0).contains(&p)));
        }
    }

    #[test]
    fn test_fit_is_deterministic_per_seed() {
        let (samples, labels) = separable_data();
        let point = [2.5, 0.0, 0.0, 0.0, 0.0];

        let mut rng = StdRng::seed_from_u64(99);
        let first = RandomForest::fit(&samples, &labels, 10, &mut rng).predict_proba(&point);
        let mut rng = StdRng::seed_from_u64(99);
        let second = RandomForest::fit(&samples, &labels, 10, &mut rng).predict_proba(&point);

        assert_eq!(first, second);
    }

    #[test]
    fn test_single_class_data_yields_pure_leaf() {
        let samples = vec![[1.0, 2.0, 3.0, 4.0, 5.0]; 8];
        let labels = vec![2usize; 8];
        let mut rng = StdRng::seed_from_u64(1);
        let forest = RandomForest::fit(&samples, &labels, 5, &mut rng);

        let (class, confidence) = forest.predict(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(class, 2);
        assert_eq!(confidence, 1.0);
    }

    #[test]
    fn test_tree_round_trips_through_postcard() {
        let (samples, labels) = separable_data();
        let mut rng = StdRng::seed_from_u64(5);
        let forest = RandomForest::fit(&samples, &labels, 8, &mut rng);

        let bytes = postcard::to_allocvec(&forest).unwrap();
        let restored: RandomForest = postcard::from_bytes(&bytes).unwrap();

        let point = [-4.0, 0.2, 0.0, 0.0, 0.1];
        assert_eq!(forest.predict_proba(&point), restored.predict_proba(&point));
        assert_eq!(forest.len(), restored.len());
    }
}
