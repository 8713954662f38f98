//! Isolation Forest outlier model.
//!
//! Anomalies are isolated by fewer random axis-aligned splits than normal
//! points, so their average path length across an ensemble of random trees is
//! shorter.
//!
//! Reference: Liu, Ting & Zhou (2008). "Isolation Forest", ICDM.
//!
//! 1. Build `n_estimators` trees, each on a subsample of `min(256, n)` rows
//! 2. Raw score per point: `-2^(-E[h(x)] / c(max_samples))` (lower = more anomalous)
//! 3. Offset: the `contamination` percentile of the training raw scores
//! 4. Decision function: raw score minus offset; negative means anomaly

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use tracing::debug;

use crate::config::{DEFAULT_CONTAMINATION, DEFAULT_N_ESTIMATORS, DEFAULT_RANDOM_SEED};
use crate::error::{AnalyzerError, Result};
use crate::pipeline::anomaly::OutlierModel;

/// Upper bound on the per-tree subsample size
pub const MAX_SUBSAMPLE: usize = 256;

const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;

/// Configuration for [`IsolationForest`].
#[derive(Debug, Clone, PartialEq)]
pub struct IsolationForestConfig {
    /// Number of isolation trees
    pub n_estimators: usize,
    /// Subsample size per tree, 0 for `min(256, n)`
    pub max_samples: usize,
    /// Expected proportion of anomalies, in (0, 0.5]
    pub contamination: f64,
    pub seed: u64,
}

impl Default for IsolationForestConfig {
    fn default() -> Self {
        Self {
            n_estimators: DEFAULT_N_ESTIMATORS,
            max_samples: 0,
            contamination: DEFAULT_CONTAMINATION,
            seed: DEFAULT_RANDOM_SEED,
        }
    }
}

impl IsolationForestConfig {
    pub fn n_estimators(mut self, n: usize) -> Self {
        self.n_estimators = n;
        self
    }

    pub fn contamination(mut self, c: f64) -> Self {
        self.contamination = c;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn max_samples(mut self, m: usize) -> Self {
        self.max_samples = m;
        self
    }
}

/// Node in an isolation tree.
#[derive(Debug, Clone)]
enum ITreeNode {
    Internal {
        feature: usize,
        split_value: f64,
        left: Box<ITreeNode>,
        right: Box<ITreeNode>,
    },
    External {
        size: usize,
    },
}

/// State learned by [`IsolationForest::fit`]
#[derive(Debug, Clone)]
struct FittedForest {
    trees: Vec<ITreeNode>,
    max_samples: usize,
    n_features: usize,
    offset: f64,
}

/// Seeded isolation forest implementing [`OutlierModel`].
#[derive(Debug, Clone, Default)]
pub struct IsolationForest {
    config: IsolationForestConfig,
    fitted: Option<FittedForest>,
}

impl IsolationForest {
    pub fn new(config: IsolationForestConfig) -> Self {
        Self {
            config,
            fitted: None,
        }
    }

    pub fn config(&self) -> &IsolationForestConfig {
        &self.config
    }

    /// Threshold subtracted from raw scores, available after fitting
    pub fn offset(&self) -> Option<f64> {
        self.fitted.as_ref().map(|f| f.offset)
    }

    /// Raw anomaly score per row: `-2^(-E[h(x)] / c(max_samples))`, in [-1, 0).
    pub fn score_samples(&self, data: &[Vec<f64>]) -> Result<Vec<f64>> {
        let fitted = self.fitted.as_ref().ok_or(AnalyzerError::NotFitted)?;
        validate_matrix(data, Some(fitted.n_features))?;
        Ok(raw_scores(fitted, data))
    }

    fn validate_config(&self) -> Result<()> {
        if self.config.n_estimators == 0 {
            return Err(AnalyzerError::Validation(
                "n_estimators must be at least 1".to_string(),
            ));
        }
        let c = self.config.contamination;
        if !(c > 0.0 && c <= 0.5) {
            return Err(AnalyzerError::Validation(format!(
                "contamination must be in (0, 0.5], got {}",
                c
            )));
        }
        Ok(())
    }
}

impl OutlierModel for IsolationForest {
    fn fit(&mut self, data: &[Vec<f64>]) -> Result<()> {
        self.validate_config()?;

        let n = data.len();
        if n < 2 {
            return Err(AnalyzerError::Computation(format!(
                "Outlier model needs at least 2 rows, got {}",
                n
            )));
        }
        let n_features = validate_matrix(data, None)?;

        let max_samples = if self.config.max_samples == 0 {
            n.min(MAX_SUBSAMPLE)
        } else {
            self.config.max_samples.min(n)
        };
        let max_depth = (max_samples as f64).log2().ceil().max(1.0) as usize;

        // One seed per tree drawn from the master generator keeps the parallel
        // build deterministic
        let mut master = StdRng::seed_from_u64(self.config.seed);
        let tree_seeds: Vec<u64> = (0..self.config.n_estimators)
            .map(|_| master.gen())
            .collect();

        let trees: Vec<ITreeNode> = tree_seeds
            .par_iter()
            .map(|&seed| {
                let mut rng = StdRng::seed_from_u64(seed);
                let subsample: Vec<&[f64]> = rand::seq::index::sample(&mut rng, n, max_samples)
                    .into_iter()
                    .map(|i| data[i].as_slice())
                    .collect();
                build_itree(&subsample, n_features, max_depth, &mut rng)
            })
            .collect();

        let mut fitted = FittedForest {
            trees,
            max_samples,
            n_features,
            offset: 0.0,
        };
        let training_scores = raw_scores(&fitted, data);
        fitted.offset = percentile(&training_scores, self.config.contamination);

        debug!(
            rows = n,
            features = n_features,
            trees = fitted.trees.len(),
            offset = fitted.offset,
            "isolation forest fitted"
        );

        self.fitted = Some(fitted);
        Ok(())
    }

    fn score(&self, data: &[Vec<f64>]) -> Result<Vec<f64>> {
        let fitted = self.fitted.as_ref().ok_or(AnalyzerError::NotFitted)?;
        validate_matrix(data, Some(fitted.n_features))?;
        Ok(raw_scores(fitted, data)
            .into_iter()
            .map(|s| s - fitted.offset)
            .collect())
    }
}

/// Check the matrix is rectangular and finite; returns the feature count.
fn validate_matrix(data: &[Vec<f64>], expected_width: Option<usize>) -> Result<usize> {
    let width = match (expected_width, data.first()) {
        (Some(w), _) => w,
        (None, Some(first)) => first.len(),
        (None, None) => 0,
    };
    if width == 0 {
        return Err(AnalyzerError::Computation(
            "Outlier model needs at least one feature".to_string(),
        ));
    }

    for (row_idx, row) in data.iter().enumerate() {
        if row.len() != width {
            return Err(AnalyzerError::Computation(format!(
                "Row {} has {} features, expected {}",
                row_idx,
                row.len(),
                width
            )));
        }
        if row.iter().any(|v| !v.is_finite()) {
            return Err(AnalyzerError::Computation(format!(
                "Row {} contains a non-finite value",
                row_idx
            )));
        }
    }

    Ok(width)
}

fn raw_scores(fitted: &FittedForest, data: &[Vec<f64>]) -> Vec<f64> {
    let cn = c_factor(fitted.max_samples);
    let n_trees = fitted.trees.len() as f64;

    data.par_iter()
        .map(|point| {
            let avg_path: f64 = fitted
                .trees
                .iter()
                .map(|tree| path_length(point, tree, 0))
                .sum::<f64>()
                / n_trees;
            if cn > 0.0 {
                -(2.0f64.powf(-avg_path / cn))
            } else {
                -0.5
            }
        })
        .collect()
}

/// Builds a single isolation tree from a subsample.
fn build_itree(data: &[&[f64]], d: usize, max_depth: usize, rng: &mut StdRng) -> ITreeNode {
    let n = data.len();
    if n <= 1 || max_depth == 0 {
        return ITreeNode::External { size: n };
    }

    // Only features that still vary within this node can split it
    let ranges: Vec<(usize, f64, f64)> = (0..d)
        .filter_map(|feature| {
            let (min_val, max_val) = data.iter().fold(
                (f64::INFINITY, f64::NEG_INFINITY),
                |(lo, hi), point| (lo.min(point[feature]), hi.max(point[feature])),
            );
            (max_val > min_val).then_some((feature, min_val, max_val))
        })
        .collect();

    if ranges.is_empty() {
        return ITreeNode::External { size: n };
    }

    let (feature, min_val, max_val) = ranges[rng.gen_range(0..ranges.len())];
    let split_value = rng.gen_range(min_val..max_val);

    let (left_data, right_data): (Vec<&[f64]>, Vec<&[f64]>) =
        data.iter().partition(|point| point[feature] < split_value);

    if left_data.is_empty() || right_data.is_empty() {
        return ITreeNode::External { size: n };
    }

    ITreeNode::Internal {
        feature,
        split_value,
        left: Box::new(build_itree(&left_data, d, max_depth - 1, rng)),
        right: Box::new(build_itree(&right_data, d, max_depth - 1, rng)),
    }
}

/// Computes the path length for a point traversing the tree.
fn path_length(point: &[f64], node: &ITreeNode, current_depth: usize) -> f64 {
    match node {
        ITreeNode::External { size } => current_depth as f64 + c_factor(*size),
        ITreeNode::Internal {
            feature,
            split_value,
            left,
            right,
        } => {
            if point[*feature] < *split_value {
                path_length(point, left, current_depth + 1)
            } else {
                path_length(point, right, current_depth + 1)
            }
        }
    }
}

/// Average path length of unsuccessful search in BST of size n.
///
/// c(n) = 2*H(n-1) - 2*(n-1)/n, with H(i) ≈ ln(i) + γ.
fn c_factor(n: usize) -> f64 {
    if n <= 1 {
        return 0.0;
    }
    if n == 2 {
        return 1.0;
    }
    let n_f = n as f64;
    let harmonic = (n_f - 1.0).ln() + EULER_GAMMA;
    2.0 * harmonic - 2.0 * (n_f - 1.0) / n_f
}

/// Linear-interpolated percentile, `q` in [0, 1].
fn percentile(values: &[f64], q: f64) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let rank = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (rank - lo as f64)
}
