use super::tree::{RegressionTree, TreeParams};
use super::{Dataset, ModelError};
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForestParams {
    pub n_trees: usize,
    pub tree: TreeParams,
    /// Train each tree on a bootstrap resample instead of the full training set.
    pub bootstrap: bool,
    pub seed: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_trees: 200,
            tree: TreeParams::default(),
            bootstrap: true,
            seed: 42,
        }
    }
}

/// Bagged ensemble of regression trees; predictions are the mean over trees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    n_features: usize,
    params: ForestParams,
    trees: Vec<RegressionTree>,
    feature_importances: Vec<f64>,
}

impl RandomForest {
    pub fn fit(data: &Dataset, params: &ForestParams) -> Result<Self, ModelError> {
        Self::fit_with_callback(data, params, |_| {})
    }

    /// Trains the forest, invoking `on_tree_done` with the index of each finished tree.
    ///
    /// Per-tree generators are seeded up front from `params.seed`, so the result does not
    /// depend on whether trees are trained sequentially or on the rayon pool.
    #[instrument(level = "debug", skip_all, fields(n_trees = params.n_trees, rows = data.len()))]
    pub fn fit_with_callback<F>(
        data: &Dataset,
        params: &ForestParams,
        on_tree_done: F,
    ) -> Result<Self, ModelError>
    where
        F: Fn(usize) + Sync,
    {
        if params.n_trees == 0 {
            return Err(ModelError::InvalidHyperparameter(
                "a forest needs at least one tree".to_string(),
            ));
        }
        params.tree.validate()?;
        if data.is_empty() {
            return Err(ModelError::EmptyDataset);
        }

        let mut seeder = StdRng::seed_from_u64(params.seed);
        let tree_seeds: Vec<(usize, u64)> = (0..params.n_trees)
            .map(|i| (i, seeder.next_u64()))
            .collect();

        #[cfg(not(feature = "parallel"))]
        let iterator = tree_seeds.iter();

        #[cfg(feature = "parallel")]
        let iterator = tree_seeds.par_iter();

        let trees = iterator
            .map(|&(index, seed)| {
                let mut rng = StdRng::seed_from_u64(seed);
                let rows = if params.bootstrap {
                    bootstrap_sample(data.len(), &mut rng)
                } else {
                    (0..data.len()).collect()
                };
                let tree = RegressionTree::fit_on_indices(data, rows, &params.tree)?;
                on_tree_done(index);
                Ok(tree)
            })
            .collect::<Result<Vec<_>, ModelError>>()?;

        let feature_importances = aggregate_importances(&trees, data.n_features());
        debug!(?feature_importances, "Random forest trained.");

        Ok(Self {
            n_features: data.n_features(),
            params: *params,
            trees,
            feature_importances,
        })
    }

    pub fn predict(&self, row: &[f64]) -> Result<f64, ModelError> {
        let mut total = 0.0;
        for tree in &self.trees {
            total += tree.predict(row)?;
        }
        Ok(total / self.trees.len() as f64)
    }

    pub fn predict_dataset(&self, data: &Dataset) -> Result<Vec<f64>, ModelError> {
        data.rows().map(|row| self.predict(row)).collect()
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn params(&self) -> &ForestParams {
        &self.params
    }

    pub fn trees(&self) -> &[RegressionTree] {
        &self.trees
    }

    /// Mean-decrease-in-impurity importances: each value in `[0, 1]`, summing to 1.
    pub fn feature_importances(&self) -> &[f64] {
        &self.feature_importances
    }
}

fn bootstrap_sample(n: usize, rng: &mut impl Rng) -> Vec<usize> {
    (0..n).map(|_| rng.gen_range(0..n)).collect()
}

/// Averages per-tree normalized importances over the trees that split at least once. A forest
/// of stumps carries no attribution, so it reports a uniform distribution.
fn aggregate_importances(trees: &[RegressionTree], n_features: usize) -> Vec<f64> {
    let mut sum = vec![0.0; n_features];
    let mut contributing = 0usize;
    for normalized in trees.iter().filter_map(|t| t.normalized_importances()) {
        for (s, v) in sum.iter_mut().zip(normalized) {
            *s += v;
        }
        contributing += 1;
    }

    let total: f64 = sum.iter().sum();
    if contributing == 0 || total <= 0.0 {
        return vec![1.0 / n_features as f64; n_features];
    }
    sum.iter().map(|v| (v / total).clamp(0.0, 1.0)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::regression::metrics::r2_score;

    fn linear_data(rows: usize, seed: u64) -> Dataset {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut data = Dataset::new(3);
        for _ in 0..rows {
            let row = [
                rng.gen_range(0.0..10.0),
                rng.gen_range(0.0..10.0),
                rng.gen_range(0.0..10.0),
            ];
            // Third column is pure noise with no influence on the target.
            data.push(&row, 3.0 * row[0] + 1.5 * row[1]).unwrap();
        }
        data
    }

    fn small_params() -> ForestParams {
        ForestParams {
            n_trees: 20,
            tree: TreeParams {
                max_depth: 8,
                ..TreeParams::default()
            },
            bootstrap: true,
            seed: 7,
        }
    }

    #[test]
    fn forest_fits_linear_target_on_holdout() {
        let train = linear_data(600, 1);
        let test = linear_data(200, 2);
        let forest = RandomForest::fit(&train, &small_params()).unwrap();
        let predictions = forest.predict_dataset(&test).unwrap();
        let r2 = r2_score(test.targets(), &predictions).unwrap();
        assert!(r2 > 0.9, "holdout r2 was {}", r2);
    }

    #[test]
    fn importances_sum_to_one_and_rank_informative_features() {
        let forest = RandomForest::fit(&linear_data(400, 3), &small_params()).unwrap();
        let importances = forest.feature_importances();
        assert_eq!(importances.len(), 3);
        assert!((importances.iter().sum::<f64>() - 1.0).abs() < 1e-6);
        assert!(importances.iter().all(|v| (0.0..=1.0).contains(v)));
        assert!(importances[0] > importances[1]);
        assert!(importances[1] > importances[2]);
    }

    #[test]
    fn training_is_deterministic_for_a_fixed_seed() {
        let data = linear_data(200, 4);
        let a = RandomForest::fit(&data, &small_params()).unwrap();
        let b = RandomForest::fit(&data, &small_params()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn callback_sees_every_tree() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        let finished = AtomicUsize::new(0);
        let forest = RandomForest::fit_with_callback(&linear_data(100, 5), &small_params(), |_| {
            finished.fetch_add(1, Ordering::Relaxed);
        })
        .unwrap();
        assert_eq!(forest.trees().len(), 20);
        assert_eq!(finished.load(Ordering::Relaxed), 20);
    }

    #[test]
    fn constant_target_gives_uniform_importances() {
        let data = Dataset::from_parts(2, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], vec![7.0; 3]).unwrap();
        let forest = RandomForest::fit(&data, &small_params()).unwrap();
        assert_eq!(forest.feature_importances(), &[0.5, 0.5]);
        assert_eq!(forest.predict(&[0.0, 0.0]).unwrap(), 7.0);
    }

    #[test]
    fn zero_trees_is_rejected() {
        let params = ForestParams {
            n_trees: 0,
            ..small_params()
        };
        assert!(matches!(
            RandomForest::fit(&linear_data(10, 6), &params),
            Err(ModelError::InvalidHyperparameter(_))
        ));
    }
}
