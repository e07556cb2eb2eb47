//! Bagged ensemble of regression trees.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{ForecastError, Result};
use crate::models::traits::Regressor;
use crate::models::tree::{RegressionTree, TreeConfig};

/// Random forest regressor: each tree is grown on a bootstrap resample of the
/// training rows and predictions are averaged across the ensemble.
///
/// The bootstrap draw is seeded, so fitting the same data with the same
/// parameters always reproduces the same ensemble.
#[derive(Debug, Clone)]
pub struct RandomForest {
    n_trees: usize,
    max_depth: Option<usize>,
    min_samples_split: usize,
    min_samples_leaf: usize,
    seed: u64,
    trees: Vec<RegressionTree>,
    n_features: usize,
}

impl RandomForest {
    /// Forest with `n_trees` unlimited-depth trees, seed 42.
    pub fn new(n_trees: usize) -> Self {
        Self {
            n_trees,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            seed: 42,
            trees: Vec::new(),
            n_features: 0,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = Some(max_depth);
        self
    }

    pub fn with_min_samples_split(mut self, min_samples_split: usize) -> Self {
        self.min_samples_split = min_samples_split;
        self
    }

    pub fn with_min_samples_leaf(mut self, min_samples_leaf: usize) -> Self {
        self.min_samples_leaf = min_samples_leaf;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn n_trees(&self) -> usize {
        self.n_trees
    }

    fn tree_config(&self) -> TreeConfig {
        TreeConfig {
            max_depth: self.max_depth,
            min_samples_split: self.min_samples_split,
            min_samples_leaf: self.min_samples_leaf,
        }
    }
}

impl Regressor for RandomForest {
    fn fit(&mut self, rows: &[Vec<f64>], target: &[f64]) -> Result<()> {
        if rows.is_empty() {
            return Err(ForecastError::EmptyData);
        }
        if rows.len() != target.len() {
            return Err(ForecastError::DimensionMismatch {
                expected: rows.len(),
                got: target.len(),
            });
        }
        if self.n_trees == 0 {
            return Err(ForecastError::InvalidParameter(
                "forest needs at least one tree".into(),
            ));
        }
        let n_features = rows[0].len();
        if let Some(bad) = rows.iter().find(|row| row.len() != n_features) {
            return Err(ForecastError::DimensionMismatch {
                expected: n_features,
                got: bad.len(),
            });
        }

        let n = rows.len();
        let config = self.tree_config();
        let mut rng = StdRng::seed_from_u64(self.seed);

        let mut trees = Vec::with_capacity(self.n_trees);
        let mut sample = vec![0usize; n];
        for _ in 0..self.n_trees {
            for slot in sample.iter_mut() {
                *slot = rng.gen_range(0..n);
            }
            trees.push(RegressionTree::fit(rows, target, &sample, &config));
        }

        self.trees = trees;
        self.n_features = n_features;
        Ok(())
    }

    fn predict(&self, row: &[f64]) -> Result<f64> {
        if self.trees.is_empty() {
            return Err(ForecastError::FitRequired);
        }
        if row.len() != self.n_features {
            return Err(ForecastError::DimensionMismatch {
                expected: self.n_features,
                got: row.len(),
            });
        }
        let sum: f64 = self.trees.iter().map(|tree| tree.predict(row)).sum();
        Ok(sum / self.trees.len() as f64)
    }

    fn name(&self) -> &str {
        "random_forest"
    }
}
