use super::{Dataset, ModelError};
use serde::{Deserialize, Serialize};
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeParams {
    /// The root sits at depth 0; nodes at `max_depth` are always leaves.
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
}

impl Default for TreeParams {
    fn default() -> Self {
        Self {
            max_depth: 10,
            min_samples_split: 2,
            min_samples_leaf: 1,
        }
    }
}

impl TreeParams {
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.min_samples_split < 2 {
            return Err(ModelError::InvalidHyperparameter(format!(
                "min_samples_split must be at least 2 (got {})",
                self.min_samples_split
            )));
        }
        if self.min_samples_leaf < 1 {
            return Err(ModelError::InvalidHyperparameter(
                "min_samples_leaf must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Node {
    Leaf {
        value: f64,
    },
    /// Rows with `row[feature] <= threshold` descend into `left`.
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

#[derive(Debug, Clone, Copy)]
struct SplitCandidate {
    feature: usize,
    threshold: f64,
    children_sse: f64,
}

/// A CART regression tree grown greedily on the squared-error criterion.
///
/// Nodes live in a flat arena with the root at index 0. While growing, the tree records the
/// total squared-error reduction contributed by each feature, which is what the forest turns
/// into impurity-based importances.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    n_features: usize,
    nodes: Vec<Node>,
    impurity_decrease: Vec<f64>,
}

impl RegressionTree {
    pub fn fit(data: &Dataset, params: &TreeParams) -> Result<Self, ModelError> {
        Self::fit_on_indices(data, (0..data.len()).collect(), params)
    }

    /// Grows a tree on the given rows of `data`. Indices may repeat, as they do in a
    /// bootstrap sample.
    pub fn fit_on_indices(
        data: &Dataset,
        mut indices: Vec<usize>,
        params: &TreeParams,
    ) -> Result<Self, ModelError> {
        params.validate()?;
        if indices.is_empty() {
            return Err(ModelError::EmptyDataset);
        }
        if data.targets().iter().any(|y| !y.is_finite()) {
            return Err(ModelError::NonFinite("training targets"));
        }

        let mut tree = Self {
            n_features: data.n_features(),
            nodes: Vec::new(),
            impurity_decrease: vec![0.0; data.n_features()],
        };
        let mut scratch = Vec::with_capacity(indices.len());
        tree.grow(data, &mut indices, 0, params, &mut scratch);

        trace!(
            nodes = tree.nodes.len(),
            depth = tree.depth(),
            "Regression tree grown."
        );
        Ok(tree)
    }

    fn grow(
        &mut self,
        data: &Dataset,
        indices: &mut [usize],
        depth: usize,
        params: &TreeParams,
        scratch: &mut Vec<usize>,
    ) -> usize {
        let targets = data.targets();
        let n = indices.len() as f64;
        let mean = indices.iter().map(|&i| targets[i]).sum::<f64>() / n;
        let sse: f64 = indices.iter().map(|&i| (targets[i] - mean).powi(2)).sum();

        let node_index = self.nodes.len();
        self.nodes.push(Node::Leaf { value: mean });

        if depth >= params.max_depth
            || indices.len() < params.min_samples_split
            || indices.len() < 2 * params.min_samples_leaf
            || sse <= f64::EPSILON
        {
            return node_index;
        }

        let Some(best) = self.best_split(data, indices, mean, sse, params, scratch) else {
            return node_index;
        };
        let gain = sse - best.children_sse;
        if gain <= f64::EPSILON * sse {
            return node_index;
        }
        self.impurity_decrease[best.feature] += gain;

        let mid = partition(indices, |i| data.value(i, best.feature) <= best.threshold);
        let (left_rows, right_rows) = indices.split_at_mut(mid);
        let left = self.grow(data, left_rows, depth + 1, params, scratch);
        let right = self.grow(data, right_rows, depth + 1, params, scratch);

        self.nodes[node_index] = Node::Split {
            feature: best.feature,
            threshold: best.threshold,
            left,
            right,
        };
        node_index
    }

    /// Exhaustive search over every feature and every boundary between distinct values.
    /// Targets are centered on the node mean so the running sums stay well conditioned.
    fn best_split(
        &self,
        data: &Dataset,
        indices: &[usize],
        mean: f64,
        sse: f64,
        params: &TreeParams,
        order: &mut Vec<usize>,
    ) -> Option<SplitCandidate> {
        let targets = data.targets();
        let len = indices.len();
        let total_sum: f64 = indices.iter().map(|&i| targets[i] - mean).sum();
        let mut best: Option<SplitCandidate> = None;

        for feature in 0..self.n_features {
            order.clear();
            order.extend_from_slice(indices);
            order.sort_unstable_by(|&a, &b| data.value(a, feature).total_cmp(&data.value(b, feature)));

            let mut left_sum = 0.0;
            let mut left_sq = 0.0;
            for k in 0..len - 1 {
                let y = targets[order[k]] - mean;
                left_sum += y;
                left_sq += y * y;

                let n_left = k + 1;
                let n_right = len - n_left;
                if n_left < params.min_samples_leaf || n_right < params.min_samples_leaf {
                    continue;
                }
                let here = data.value(order[k], feature);
                let next = data.value(order[k + 1], feature);
                if next <= here {
                    continue;
                }

                let right_sum = total_sum - left_sum;
                let right_sq = sse - left_sq;
                let left_sse = (left_sq - left_sum * left_sum / n_left as f64).max(0.0);
                let right_sse = (right_sq - right_sum * right_sum / n_right as f64).max(0.0);
                let children_sse = left_sse + right_sse;

                if best.is_none_or(|b| children_sse < b.children_sse) {
                    best = Some(SplitCandidate {
                        feature,
                        threshold: midpoint(here, next),
                        children_sse,
                    });
                }
            }
        }
        best
    }

    pub fn predict(&self, row: &[f64]) -> Result<f64, ModelError> {
        if row.len() != self.n_features {
            return Err(ModelError::DimensionMismatch {
                expected: self.n_features,
                found: row.len(),
            });
        }
        let mut index = 0;
        loop {
            match self.nodes[index] {
                Node::Leaf { value } => return Ok(value),
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    index = if row[feature] <= threshold { left } else { right };
                }
            }
        }
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn leaf_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, Node::Leaf { .. }))
            .count()
    }

    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], index: usize) -> usize {
            match nodes[index] {
                Node::Leaf { .. } => 0,
                Node::Split { left, right, .. } => 1 + walk(nodes, left).max(walk(nodes, right)),
            }
        }
        if self.nodes.is_empty() { 0 } else { walk(&self.nodes, 0) }
    }

    /// Raw squared-error reduction per feature, summed over every split.
    pub fn impurity_decrease(&self) -> &[f64] {
        &self.impurity_decrease
    }

    /// Impurity decrease normalized to sum to 1, or `None` for a tree without splits.
    pub fn normalized_importances(&self) -> Option<Vec<f64>> {
        let total: f64 = self.impurity_decrease.iter().sum();
        if total <= 0.0 || !total.is_finite() {
            return None;
        }
        Some(self.impurity_decrease.iter().map(|v| v / total).collect())
    }
}

/// Threshold strictly below `next` so that `here` goes left and `next` goes right.
fn midpoint(here: f64, next: f64) -> f64 {
    let mid = here + (next - here) / 2.0;
    if mid >= next { here } else { mid }
}

/// Moves every index satisfying `goes_left` to the front and returns how many there are.
fn partition(indices: &mut [usize], goes_left: impl Fn(usize) -> bool) -> usize {
    let mut boundary = 0;
    for k in 0..indices.len() {
        if goes_left(indices[k]) {
            indices.swap(boundary, k);
            boundary += 1;
        }
    }
    boundary
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step_data() -> Dataset {
        // Target jumps from 1 to 5 when feature 1 crosses 0.5; feature 0 is noise.
        let rows = [
            ([3.0, 0.1], 1.0),
            ([1.0, 0.2], 1.0),
            ([2.0, 0.3], 1.0),
            ([2.0, 0.7], 5.0),
            ([3.0, 0.8], 5.0),
            ([1.0, 0.9], 5.0),
        ];
        let mut data = Dataset::new(2);
        for (row, y) in rows {
            data.push(&row, y).unwrap();
        }
        data
    }

    #[test]
    fn single_split_recovers_step_function() {
        let tree = RegressionTree::fit(&step_data(), &TreeParams::default()).unwrap();
        assert_eq!(tree.depth(), 1);
        assert_eq!(tree.leaf_count(), 2);
        match tree.nodes()[0] {
            Node::Split {
                feature, threshold, ..
            } => {
                assert_eq!(feature, 1);
                assert!((threshold - 0.5).abs() < 1e-12);
            }
            Node::Leaf { .. } => panic!("root should split"),
        }
        assert_eq!(tree.predict(&[0.0, 0.0]).unwrap(), 1.0);
        assert_eq!(tree.predict(&[0.0, 1.0]).unwrap(), 5.0);
    }

    #[test]
    fn importance_goes_entirely_to_informative_feature() {
        let tree = RegressionTree::fit(&step_data(), &TreeParams::default()).unwrap();
        assert_eq!(tree.normalized_importances().unwrap(), vec![0.0, 1.0]);
        // Total SSE of the step data is 6 * 4 = 24 and the split removes all of it.
        assert!((tree.impurity_decrease()[1] - 24.0).abs() < 1e-9);
    }

    #[test]
    fn max_depth_zero_yields_mean_leaf() {
        let params = TreeParams {
            max_depth: 0,
            ..TreeParams::default()
        };
        let tree = RegressionTree::fit(&step_data(), &params).unwrap();
        assert_eq!(tree.nodes().len(), 1);
        assert_eq!(tree.predict(&[0.0, 0.0]).unwrap(), 3.0);
        assert!(tree.normalized_importances().is_none());
    }

    #[test]
    fn depth_never_exceeds_limit() {
        let mut data = Dataset::new(1);
        for i in 0..200 {
            let x = i as f64;
            data.push(&[x], (x * 0.37).sin() * 10.0).unwrap();
        }
        let params = TreeParams {
            max_depth: 4,
            ..TreeParams::default()
        };
        let tree = RegressionTree::fit(&data, &params).unwrap();
        assert!(tree.depth() <= 4);
        assert!(tree.leaf_count() <= 16);
    }

    #[test]
    fn fully_grown_tree_interpolates_training_points() {
        let mut data = Dataset::new(1);
        for i in 0..32 {
            data.push(&[i as f64], (i * i) as f64).unwrap();
        }
        let params = TreeParams {
            max_depth: 16,
            ..TreeParams::default()
        };
        let tree = RegressionTree::fit(&data, &params).unwrap();
        for i in 0..32 {
            assert_eq!(tree.predict(&[i as f64]).unwrap(), (i * i) as f64);
        }
    }

    #[test]
    fn duplicate_feature_values_are_never_separated() {
        let data = Dataset::from_parts(1, vec![1.0, 1.0, 1.0, 1.0], vec![0.0, 10.0, 0.0, 10.0]).unwrap();
        let tree = RegressionTree::fit(&data, &TreeParams::default()).unwrap();
        assert_eq!(tree.nodes().len(), 1);
        assert_eq!(tree.predict(&[1.0]).unwrap(), 5.0);
    }

    #[test]
    fn repeated_bootstrap_indices_are_supported() {
        let data = step_data();
        let tree =
            RegressionTree::fit_on_indices(&data, vec![0, 0, 0, 4, 4], &TreeParams::default())
                .unwrap();
        assert_eq!(tree.predict(&[3.0, 0.1]).unwrap(), 1.0);
        assert_eq!(tree.predict(&[3.0, 0.8]).unwrap(), 5.0);
    }

    #[test]
    fn invalid_inputs_are_rejected() {
        let data = step_data();
        assert_eq!(
            RegressionTree::fit_on_indices(&data, vec![], &TreeParams::default()),
            Err(ModelError::EmptyDataset)
        );
        let bad = TreeParams {
            min_samples_split: 1,
            ..TreeParams::default()
        };
        assert!(matches!(
            RegressionTree::fit(&data, &bad),
            Err(ModelError::InvalidHyperparameter(_))
        ));
        let tree = RegressionTree::fit(&data, &TreeParams::default()).unwrap();
        assert!(tree.predict(&[1.0]).is_err());
    }

    #[test]
    fn partition_moves_matching_indices_to_front() {
        let mut indices = vec![5, 2, 8, 1, 9];
        let mid = partition(&mut indices, |i| i < 5);
        assert_eq!(mid, 2);
        let mut left = indices[..mid].to_vec();
        left.sort();
        assert_eq!(left, vec![1, 2]);
    }

    #[test]
    fn midpoint_stays_below_upper_value() {
        assert_eq!(midpoint(1.0, 3.0), 2.0);
        let a: f64 = 1.0;
        let b = f64::from_bits(a.to_bits() + 1);
        assert!(midpoint(a, b) < b);
    }
}
