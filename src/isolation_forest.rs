//! Seeded isolation forest over a one-dimensional sample.
//!
//! Each tree isolates points by recursive random splits between the current
//! minimum and maximum. Points that separate after few splits get scores
//! close to 1, points deep inside the bulk get scores well below 0.5.

use crate::outliers::OutlierModel;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;

#[derive(Debug, Clone)]
pub struct IsolationForest {
    n_trees: usize,
    max_samples: usize,
}

impl Default for IsolationForest {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_samples: 256,
        }
    }
}

impl IsolationForest {
    pub fn new(n_trees: usize, max_samples: usize) -> Self {
        Self {
            n_trees: n_trees.max(1),
            max_samples: max_samples.max(2),
        }
    }
}

impl OutlierModel for IsolationForest {
    fn score_samples(&self, sample: &[f64], seed: u64) -> Vec<f64> {
        if sample.is_empty() {
            return Vec::new();
        }

        let subsample_size = self.max_samples.min(sample.len());
        let height_limit = (subsample_size as f64).log2().ceil() as usize;
        let mut rng = StdRng::seed_from_u64(seed);

        let trees: Vec<IsolationTree> = (0..self.n_trees)
            .map(|_| {
                let subsample: Vec<f64> =
                    rand::seq::index::sample(&mut rng, sample.len(), subsample_size)
                        .iter()
                        .map(|i| sample[i])
                        .collect();
                IsolationTree::build(&subsample, height_limit, &mut rng)
            })
            .collect();

        let normalizer = average_path_length(subsample_size);

        sample
            .iter()
            .map(|&x| {
                let total: f64 = trees.iter().map(|t| t.path_length(x)).sum();
                let mean_depth = total / trees.len() as f64;
                if normalizer > 0.0 {
                    2f64.powf(-mean_depth / normalizer)
                } else {
                    0.5
                }
            })
            .collect()
    }
}

#[derive(Debug, Clone)]
enum Node {
    Leaf {
        size: usize,
    },
    Split {
        threshold: f64,
        left: usize,
        right: usize,
    },
}

#[derive(Debug, Clone)]
struct IsolationTree {
    nodes: Vec<Node>,
}

impl IsolationTree {
    fn build(points: &[f64], height_limit: usize, rng: &mut StdRng) -> Self {
        let mut tree = Self { nodes: Vec::new() };
        tree.grow(points, 0, height_limit, rng);
        tree
    }

    fn grow(&mut self, points: &[f64], depth: usize, height_limit: usize, rng: &mut StdRng) -> usize {
        let idx = self.nodes.len();

        if depth >= height_limit || points.len() <= 1 {
            self.nodes.push(Node::Leaf { size: points.len() });
            return idx;
        }

        let (min, max) = points
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &p| {
                (lo.min(p), hi.max(p))
            });

        if !(min < max) || !(max - min).is_finite() {
            self.nodes.push(Node::Leaf { size: points.len() });
            return idx;
        }

        let threshold = rng.gen_range(min..max);

        // Placeholder until both children exist
        self.nodes.push(Node::Leaf { size: points.len() });

        let (left_points, right_points): (Vec<f64>, Vec<f64>) =
            points.iter().copied().partition(|&p| p < threshold);

        let left = self.grow(&left_points, depth + 1, height_limit, rng);
        let right = self.grow(&right_points, depth + 1, height_limit, rng);

        self.nodes[idx] = Node::Split {
            threshold,
            left,
            right,
        };
        idx
    }

    fn path_length(&self, x: f64) -> f64 {
        let mut node = 0;
        let mut depth = 0.0;

        loop {
            match self.nodes[node] {
                Node::Leaf { size } => return depth + average_path_length(size),
                Node::Split {
                    threshold,
                    left,
                    right,
                } => {
                    node = if x < threshold { left } else { right };
                    depth += 1.0;
                }
            }
        }
    }
}

/// Average path length of an unsuccessful binary search tree lookup over `n`
/// points, used to normalize depths and to extend truncated leaves.
fn average_path_length(n: usize) -> f64 {
    match n {
        0 | 1 => 0.0,
        2 => 1.0,
        _ => {
            let n = n as f64;
            2.0 * ((n - 1.0).ln() + EULER_GAMMA) - 2.0 * (n - 1.0) / n
        }
    }
}
