//! Variance-reduction regression trees, the base learner of the forest.

/// Growth limits for a single tree.
#[derive(Debug, Clone)]
pub(crate) struct TreeConfig {
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
}

#[derive(Debug, Clone)]
enum Node {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

/// A single fitted regression tree. Splits greedily minimise the summed
/// squared error of the two children; leaves predict the mean target.
#[derive(Debug, Clone)]
pub(crate) struct RegressionTree {
    root: Node,
}

impl RegressionTree {
    /// Grow a tree over the rows selected by `indices`.
    pub fn fit(rows: &[Vec<f64>], target: &[f64], indices: &[usize], config: &TreeConfig) -> Self {
        let root = grow(rows, target, indices, 0, config);
        Self { root }
    }

    pub fn predict(&self, row: &[f64]) -> f64 {
        let mut node = &self.root;
        loop {
            match node {
                Node::Leaf { value } => return *value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if row[*feature] <= *threshold {
                        left
                    } else {
                        right
                    };
                }
            }
        }
    }
}

fn mean_of(target: &[f64], indices: &[usize]) -> f64 {
    if indices.is_empty() {
        return 0.0;
    }
    indices.iter().map(|&i| target[i]).sum::<f64>() / indices.len() as f64
}

fn grow(
    rows: &[Vec<f64>],
    target: &[f64],
    indices: &[usize],
    depth: usize,
    config: &TreeConfig,
) -> Node {
    let leaf = Node::Leaf {
        value: mean_of(target, indices),
    };

    if indices.len() < config.min_samples_split {
        return leaf;
    }
    if let Some(max_depth) = config.max_depth {
        if depth >= max_depth {
            return leaf;
        }
    }

    let Some((feature, threshold)) = best_split(rows, target, indices, config.min_samples_leaf)
    else {
        return leaf;
    };

    let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices
        .iter()
        .partition(|&&i| rows[i][feature] <= threshold);

    // A degenerate partition means the candidate threshold separated nothing.
    if left_idx.len() < config.min_samples_leaf || right_idx.len() < config.min_samples_leaf {
        return leaf;
    }

    Node::Split {
        feature,
        threshold,
        left: Box::new(grow(rows, target, &left_idx, depth + 1, config)),
        right: Box::new(grow(rows, target, &right_idx, depth + 1, config)),
    }
}

/// Exhaustive search for the split minimising the children's summed squared
/// error. Returns `None` when no split satisfies the leaf minimum or every
/// feature is constant over the selection.
fn best_split(
    rows: &[Vec<f64>],
    target: &[f64],
    indices: &[usize],
    min_samples_leaf: usize,
) -> Option<(usize, f64)> {
    let n = indices.len();
    if n < 2 * min_samples_leaf {
        return None;
    }
    let n_features = rows[indices[0]].len();

    let mut best: Option<(usize, f64, f64)> = None; // (feature, threshold, sse)

    for feature in 0..n_features {
        let mut order: Vec<(f64, f64)> = indices
            .iter()
            .map(|&i| (rows[i][feature], target[i]))
            .collect();
        order.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

        // Prefix sums over the sorted order let every cut point be scored in
        // constant time.
        let mut prefix_sum = 0.0;
        let mut prefix_sq = 0.0;
        let total_sum: f64 = order.iter().map(|(_, y)| y).sum();
        let total_sq: f64 = order.iter().map(|(_, y)| y * y).sum();

        for cut in 1..n {
            prefix_sum += order[cut - 1].1;
            prefix_sq += order[cut - 1].1 * order[cut - 1].1;

            if cut < min_samples_leaf || n - cut < min_samples_leaf {
                continue;
            }
            // Identical feature values cannot be separated by a threshold.
            if order[cut].0 <= order[cut - 1].0 {
                continue;
            }

            let left_n = cut as f64;
            let right_n = (n - cut) as f64;
            let right_sum = total_sum - prefix_sum;
            let right_sq = total_sq - prefix_sq;
            let sse = (prefix_sq - prefix_sum * prefix_sum / left_n)
                + (right_sq - right_sum * right_sum / right_n);

            let improves = match best {
                None => true,
                Some((_, _, best_sse)) => sse < best_sse,
            };
            if improves {
                let threshold = (order[cut - 1].0 + order[cut].0) / 2.0;
                best = Some((feature, threshold, sse));
            }
        }
    }

    best.map(|(feature, threshold, _)| (feature, threshold))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn config() -> TreeConfig {
        TreeConfig {
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
        }
    }

    #[test]
    fn tree_splits_a_step_function_exactly() {
        let rows: Vec<Vec<f64>> = (0..10).map(|i| vec![i as f64]).collect();
        let target: Vec<f64> = (0..10).map(|i| if i < 5 { 1.0 } else { 9.0 }).collect();
        let indices: Vec<usize> = (0..10).collect();

        let tree = RegressionTree::fit(&rows, &target, &indices, &config());

        assert_relative_eq!(tree.predict(&[2.0]), 1.0, epsilon = 1e-12);
        assert_relative_eq!(tree.predict(&[7.0]), 9.0, epsilon = 1e-12);
    }

    #[test]
    fn constant_target_yields_a_single_leaf() {
        let rows: Vec<Vec<f64>> = (0..5).map(|i| vec![i as f64]).collect();
        let target = vec![3.5; 5];
        let indices: Vec<usize> = (0..5).collect();

        let tree = RegressionTree::fit(&rows, &target, &indices, &config());
        assert_relative_eq!(tree.predict(&[100.0]), 3.5, epsilon = 1e-12);
    }

    #[test]
    fn depth_limit_caps_tree_growth() {
        let rows: Vec<Vec<f64>> = (0..8).map(|i| vec![i as f64]).collect();
        let target: Vec<f64> = (0..8).map(|i| i as f64).collect();
        let indices: Vec<usize> = (0..8).collect();

        let shallow = TreeConfig {
            max_depth: Some(1),
            min_samples_split: 2,
            min_samples_leaf: 1,
        };
        let tree = RegressionTree::fit(&rows, &target, &indices, &shallow);

        // Depth 1 means one split: both halves predict their own mean.
        assert_relative_eq!(tree.predict(&[0.0]), 1.5, epsilon = 1e-12);
        assert_relative_eq!(tree.predict(&[7.0]), 5.5, epsilon = 1e-12);
    }

    #[test]
    fn min_samples_leaf_rejects_unbalanced_splits() {
        let rows: Vec<Vec<f64>> = (0..4).map(|i| vec![i as f64]).collect();
        let target = vec![0.0, 0.0, 0.0, 100.0];
        let indices: Vec<usize> = (0..4).collect();

        let balanced = TreeConfig {
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 2,
        };
        let tree = RegressionTree::fit(&rows, &target, &indices, &balanced);

        // The 3/1 split is forbidden; only 2/2 is allowed.
        assert_relative_eq!(tree.predict(&[0.0]), 0.0, epsilon = 1e-12);
        assert_relative_eq!(tree.predict(&[3.0]), 50.0, epsilon = 1e-12);
    }

    #[test]
    fn tree_uses_the_most_informative_feature() {
        // Feature 0 is noise, feature 1 carries the signal.
        let rows: Vec<Vec<f64>> = (0..10)
            .map(|i| vec![(i % 3) as f64, if i < 5 { 0.0 } else { 1.0 }])
            .collect();
        let target: Vec<f64> = (0..10).map(|i| if i < 5 { -2.0 } else { 2.0 }).collect();
        let indices: Vec<usize> = (0..10).collect();

        let tree = RegressionTree::fit(&rows, &target, &indices, &config());
        assert_relative_eq!(tree.predict(&[0.0, 0.0]), -2.0, epsilon = 1e-12);
        assert_relative_eq!(tree.predict(&[0.0, 1.0]), 2.0, epsilon = 1e-12);
    }
}
