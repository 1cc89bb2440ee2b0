//! Bagged regression trees over a single numeric feature
//!
//! Each tree is a fully grown CART fit to a bootstrap resample of the
//! training set. Splits sit at the midpoint between adjacent distinct feature
//! values and minimize the summed squared error of both children. Sampling is
//! driven by a seeded [`StdRng`], so a forest is fully determined by its data
//! and seed.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[derive(Debug, Clone)]
enum Node {
    Leaf(f64),
    Split {
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

/// A single regression tree
#[derive(Debug, Clone)]
pub struct RegressionTree {
    root: Node,
}

impl RegressionTree {
    /// Fit to paired samples. Panics in debug builds if lengths differ.
    pub fn fit(x: &[f64], y: &[f64]) -> Self {
        debug_assert_eq!(x.len(), y.len());
        let mut samples: Vec<(f64, f64)> = x.iter().copied().zip(y.iter().copied()).collect();
        Self {
            root: build(&mut samples),
        }
    }

    pub fn predict(&self, x: f64) -> f64 {
        let mut node = &self.root;
        loop {
            match node {
                Node::Leaf(value) => return *value,
                Node::Split {
                    threshold,
                    left,
                    right,
                } => {
                    node = if x <= *threshold { left } else { right };
                }
            }
        }
    }

    pub fn depth(&self) -> usize {
        fn walk(node: &Node) -> usize {
            match node {
                Node::Leaf(_) => 0,
                Node::Split { left, right, .. } => 1 + walk(left).max(walk(right)),
            }
        }
        walk(&self.root)
    }
}

fn mean(samples: &[(f64, f64)]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    samples.iter().map(|(_, y)| y).sum::<f64>() / samples.len() as f64
}

fn build(samples: &mut [(f64, f64)]) -> Node {
    let n = samples.len();
    if n < 2 {
        return Node::Leaf(mean(samples));
    }

    samples.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

    let first_y = samples[0].1;
    let constant_y = samples.iter().all(|(_, y)| *y == first_y);
    let constant_x = samples[0].0 == samples[n - 1].0;
    if constant_y || constant_x {
        return Node::Leaf(mean(samples));
    }

    let total_sum: f64 = samples.iter().map(|(_, y)| y).sum();
    let total_sq: f64 = samples.iter().map(|(_, y)| y * y).sum();

    // (split position, sse); left side is samples[..pos]
    let mut best: Option<(usize, f64)> = None;
    let (mut left_sum, mut left_sq) = (0.0, 0.0);
    for pos in 1..n {
        let y = samples[pos - 1].1;
        left_sum += y;
        left_sq += y * y;
        if samples[pos - 1].0 == samples[pos].0 {
            continue;
        }

        let left_n = pos as f64;
        let right_n = (n - pos) as f64;
        let right_sum = total_sum - left_sum;
        let right_sq = total_sq - left_sq;
        let sse = (left_sq - left_sum * left_sum / left_n) + (right_sq - right_sum * right_sum / right_n);

        if best.map_or(true, |(_, best_sse)| sse < best_sse) {
            best = Some((pos, sse));
        }
    }

    let Some((pos, _)) = best else {
        return Node::Leaf(mean(samples));
    };

    let threshold = (samples[pos - 1].0 + samples[pos].0) / 2.0;
    let (left, right) = samples.split_at_mut(pos);
    Node::Split {
        threshold,
        left: Box::new(build(left)),
        right: Box::new(build(right)),
    }
}

/// Average of bootstrap-trained regression trees
#[derive(Debug, Clone)]
pub struct RandomForest {
    trees: Vec<RegressionTree>,
}

impl RandomForest {
    /// Fit `n_trees` trees, each on a bootstrap resample drawn from a
    /// generator seeded with `seed`. An empty training set yields a forest
    /// that predicts 0.
    pub fn fit(x: &[f64], y: &[f64], n_trees: usize, seed: u64) -> Self {
        debug_assert_eq!(x.len(), y.len());
        let n = x.len();
        if n == 0 {
            return Self { trees: Vec::new() };
        }

        let mut rng = StdRng::seed_from_u64(seed);
        let mut bx = Vec::with_capacity(n);
        let mut by = Vec::with_capacity(n);
        let trees = (0..n_trees.max(1))
            .map(|_| {
                bx.clear();
                by.clear();
                for _ in 0..n {
                    let i = rng.gen_range(0..n);
                    bx.push(x[i]);
                    by.push(y[i]);
                }
                RegressionTree::fit(&bx, &by)
            })
            .collect();

        Self { trees }
    }

    pub fn predict(&self, x: f64) -> f64 {
        if self.trees.is_empty() {
            return 0.0;
        }
        self.trees.iter().map(|t| t.predict(x)).sum::<f64>() / self.trees.len() as f64
    }

    pub fn len(&self) -> usize {
        self.trees.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trees.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tree_fits_training_points_exactly() {
        let x = [0.0, 1.0, 2.0, 3.0];
        let y = [10.0, 40.0, 20.0, 30.0];
        let tree = RegressionTree::fit(&x, &y);
        for (xi, yi) in x.iter().zip(y.iter()) {
            assert_eq!(tree.predict(*xi), *yi);
        }
    }

    #[test]
    fn test_tree_constant_target_is_leaf() {
        let tree = RegressionTree::fit(&[0.0, 1.0, 2.0], &[5.0, 5.0, 5.0]);
        assert_eq!(tree.depth(), 0);
        assert_eq!(tree.predict(100.0), 5.0);
    }

    #[test]
    fn test_tree_duplicate_x_averages() {
        let tree = RegressionTree::fit(&[1.0, 1.0, 2.0], &[2.0, 4.0, 9.0]);
        assert_eq!(tree.predict(1.0), 3.0);
        assert_eq!(tree.predict(2.0), 9.0);
        assert_eq!(tree.predict(1.4), 3.0);
        assert_eq!(tree.predict(1.6), 9.0);
    }

    #[test]
    fn test_tree_extrapolates_with_edge_leaf() {
        let tree = RegressionTree::fit(&[0.0, 1.0, 2.0], &[100.0, 200.0, 300.0]);
        assert_eq!(tree.predict(3.0), 300.0);
        assert_eq!(tree.predict(-1.0), 100.0);
    }

    #[test]
    fn test_forest_is_deterministic_for_seed() {
        let x = [0.0, 1.0, 2.0, 3.0, 4.0];
        let y = [100.0, 120.0, 90.0, 150.0, 130.0];
        let a = RandomForest::fit(&x, &y, 100, 42);
        let b = RandomForest::fit(&x, &y, 100, 42);
        assert_eq!(a.len(), 100);
        assert_eq!(a.predict(5.0), b.predict(5.0));
    }

    #[test]
    fn test_forest_prediction_within_target_range() {
        let x = [0.0, 1.0, 2.0, 3.0];
        let y = [80.0, 95.0, 110.0, 70.0];
        let forest = RandomForest::fit(&x, &y, 50, 7);
        let p = forest.predict(4.0);
        assert!((70.0..=110.0).contains(&p), "prediction {p} out of range");
    }

    #[test]
    fn test_forest_constant_series() {
        let forest = RandomForest::fit(&[0.0, 1.0, 2.0], &[50.0, 50.0, 50.0], 10, 1);
        assert_eq!(forest.predict(3.0), 50.0);
    }

    #[test]
    fn test_empty_forest_predicts_zero() {
        let forest = RandomForest::fit(&[], &[], 10, 1);
        assert!(forest.is_empty());
        assert_eq!(forest.predict(1.0), 0.0);
    }
}
