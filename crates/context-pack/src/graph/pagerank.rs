//! Personalized PageRank over a small local-index graph.

use tracing::debug;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PageRankParams {
    pub damping: f64,
    pub max_iterations: usize,
    pub tolerance: f64,
}

impl Default for PageRankParams {
    fn default() -> Self {
        Self {
            damping: 0.85,
            max_iterations: 50,
            tolerance: 1e-6,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct PageRankOutcome {
    /// L1-normalized scores, aligned with the input adjacency.
    pub scores: Vec<f64>,
    pub iterations: usize,
    /// L1 change of the last iteration (0 if none ran).
    pub delta: f64,
}

/// Teleport distribution: weights clipped at zero and L1-normalized, uniform
/// when nothing is positive.
pub fn teleport_vector(weights: &[f64]) -> Vec<f64> {
    let n = weights.len();
    if n == 0 {
        return Vec::new();
    }
    let clipped: Vec<f64> = weights.iter().map(|w| w.max(0.0)).collect();
    let total: f64 = clipped.iter().sum();
    if total > 0.0 && total.is_finite() {
        clipped.into_iter().map(|w| w / total).collect()
    } else {
        vec![1.0 / n as f64; n]
    }
}

/// Power iteration with restart. `adjacency[i]` lists the targets of `i`
/// (parallel edges count twice); mass on nodes without targets is spread
/// uniformly over all nodes.
pub fn personalized_pagerank(
    adjacency: &[Vec<usize>],
    restart_weights: &[f64],
    params: PageRankParams,
) -> PageRankOutcome {
    let n = adjacency.len();
    if n == 0 {
        return PageRankOutcome {
            scores: Vec::new(),
            iterations: 0,
            delta: 0.0,
        };
    }
    let damping = params.damping;
    let teleport = teleport_vector(restart_weights);
    let mut scores = vec![1.0 / n as f64; n];
    let mut iterations = 0;
    let mut delta = 0.0;

    while iterations < params.max_iterations {
        let dangling_mass: f64 = adjacency
            .iter()
            .zip(&scores)
            .filter(|(targets, _)| targets.is_empty())
            .map(|(_, score)| score)
            .sum();
        let dangling_share = damping * dangling_mass / n as f64;

        let mut next_scores: Vec<f64> = teleport
            .iter()
            .map(|t| (1.0 - damping) * t + dangling_share)
            .collect();
        for (source, targets) in adjacency.iter().enumerate() {
            if targets.is_empty() {
                continue;
            }
            let share = damping * scores[source] / targets.len() as f64;
            for &target in targets {
                next_scores[target] += share;
            }
        }

        delta = next_scores
            .iter()
            .zip(&scores)
            .map(|(next, prev)| (next - prev).abs())
            .sum();
        scores = next_scores;
        iterations += 1;
        if delta < params.tolerance {
            break;
        }
    }

    let total: f64 = scores.iter().sum();
    if total > 0.0 {
        for score in &mut scores {
            *score /= total;
        }
    }
    debug!("PPR over {n} nodes stopped after {iterations} iterations (delta {delta:.3e})");

    PageRankOutcome {
        scores,
        iterations,
        delta,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_sums_to_one(scores: &[f64]) {
        let total: f64 = scores.iter().sum();
        assert!((total - 1.0).abs() < 1e-9, "sum was {total}");
    }

    #[test]
    fn test_teleport_vector_normalizes_and_clips() {
        assert_eq!(teleport_vector(&[1.0, 3.0]), vec![0.25, 0.75]);
        assert_eq!(teleport_vector(&[-2.0, 1.0]), vec![0.0, 1.0]);
        assert_eq!(teleport_vector(&[0.0, 0.0]), vec![0.5, 0.5]);
        assert_eq!(teleport_vector(&[-1.0, f64::NAN]), vec![0.5, 0.5]);
        assert!(teleport_vector(&[]).is_empty());
    }

    #[test]
    fn test_empty_graph() {
        let outcome = personalized_pagerank(&[], &[], PageRankParams::default());
        assert!(outcome.scores.is_empty());
        assert_eq!(outcome.iterations, 0);
    }

    #[test]
    fn test_chain_accumulates_at_sink() {
        let adjacency = vec![vec![1], vec![2], vec![]];
        let outcome = personalized_pagerank(&adjacency, &[1.0, 1.0, 1.0], PageRankParams::default());
        assert_sums_to_one(&outcome.scores);
        assert!(outcome.scores[2] > outcome.scores[1]);
        assert!(outcome.scores[1] > outcome.scores[0]);
    }

    #[test]
    fn test_converges_before_iteration_cap() {
        let adjacency = vec![vec![1], vec![0]];
        let params = PageRankParams {
            max_iterations: 500,
            ..PageRankParams::default()
        };
        let outcome = personalized_pagerank(&adjacency, &[1.0, 1.0], params);
        assert!(outcome.iterations < 500);
        assert!(outcome.delta < params.tolerance);
        assert!((outcome.scores[0] - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_restart_bias_favors_weighted_node() {
        let adjacency = vec![vec![], vec![], vec![]];
        let outcome = personalized_pagerank(&adjacency, &[0.0, 0.0, 1.0], PageRankParams::default());
        assert_sums_to_one(&outcome.scores);
        assert!(outcome.scores[2] > outcome.scores[0]);
        assert_eq!(outcome.scores[0], outcome.scores[1]);
    }

    #[test]
    fn test_zero_iterations_returns_uniform() {
        let adjacency = vec![vec![1], vec![]];
        let params = PageRankParams {
            max_iterations: 0,
            ..PageRankParams::default()
        };
        let outcome = personalized_pagerank(&adjacency, &[1.0, 0.0], params);
        assert_eq!(outcome.scores, vec![0.5, 0.5]);
        assert_eq!(outcome.iterations, 0);
    }

    #[test]
    fn test_parallel_edges_carry_extra_weight() {
        let adjacency = vec![vec![1, 1, 2], vec![], vec![]];
        let outcome = personalized_pagerank(&adjacency, &[1.0, 0.0, 0.0], PageRankParams::default());
        assert_sums_to_one(&outcome.scores);
        assert!(outcome.scores[1] > outcome.scores[2]);
    }
}
