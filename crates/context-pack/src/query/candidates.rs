//! Candidate selection: hop-limited expansion from hit nodes, truncation by
//! base score, then PPR re-ranking over the surviving subgraph.

use std::cmp::Ordering;
use std::collections::VecDeque;

use tracing::debug;

use crate::config::PackConfig;
use crate::graph::pagerank::{personalized_pagerank, PageRankParams};
use crate::graph::view::{GraphView, NodeHandle};

/// Hops walked from each hit node, ignoring edge direction.
pub const EXPANSION_HOPS: usize = 2;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RankedCandidate {
    pub handle: NodeHandle,
    pub ppr: f64,
    /// `theta * ppr + (1 - theta) * base_score`.
    pub score: f64,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct CandidateRanking {
    /// Candidates in original node order.
    pub candidates: Vec<NodeHandle>,
    /// PPR score of each candidate, aligned with `candidates`.
    pub ppr_scores: Vec<f64>,
    /// Composite score of each candidate, aligned with `candidates`.
    pub scores: Vec<f64>,
    /// Candidates by descending composite score; ties keep node order.
    pub ranked: Vec<RankedCandidate>,
    pub iterations: usize,
}

impl CandidateRanking {
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn ppr_for(&self, handle: NodeHandle) -> Option<f64> {
        self.position(handle).map(|i| self.ppr_scores[i])
    }

    pub fn score_for(&self, handle: NodeHandle) -> Option<f64> {
        self.position(handle).map(|i| self.scores[i])
    }

    fn position(&self, handle: NodeHandle) -> Option<usize> {
        self.candidates.binary_search(&handle).ok()
    }

    /// Ranked node ids.
    pub fn ranked_ids(&self, view: &GraphView) -> Vec<String> {
        self.ranked
            .iter()
            .map(|c| view.node(c.handle).id.clone())
            .collect()
    }
}

/// Breadth-first walk over forward and reverse edges, at most `max_hops` from
/// any seed. Returns a visited mask indexed by handle.
pub fn expand(view: &GraphView, seeds: &[NodeHandle], max_hops: usize) -> Vec<bool> {
    let mut reached = vec![false; view.len()];
    let mut queue: VecDeque<(NodeHandle, usize)> = VecDeque::new();
    for &seed in seeds {
        if !reached[seed.index()] {
            reached[seed.index()] = true;
            queue.push_back((seed, 0));
        }
    }
    while let Some((current, depth)) = queue.pop_front() {
        if depth >= max_hops {
            continue;
        }
        let neighbors = view
            .successors(current)
            .iter()
            .chain(view.predecessors(current));
        for &neighbor in neighbors {
            if !reached[neighbor.index()] {
                reached[neighbor.index()] = true;
                queue.push_back((neighbor, depth + 1));
            }
        }
    }
    reached
}

fn by_descending(a: f64, b: f64) -> Ordering {
    b.partial_cmp(&a).unwrap_or(Ordering::Equal)
}

/// The candidate pool before PPR: expansion around hits (or every node when
/// there are none), truncated to `limits.ncand` by base score. Never empty for
/// a non-empty graph.
pub fn select_candidates(view: &GraphView, config: &PackConfig) -> Vec<NodeHandle> {
    let pool: Vec<NodeHandle> = if view.hits().is_empty() {
        view.handles().collect()
    } else {
        let reached = expand(view, view.hits(), EXPANSION_HOPS);
        view.handles().filter(|h| reached[h.index()]).collect()
    };
    let pool_size = pool.len();

    let mut by_score = pool;
    by_score.sort_by(|a, b| by_descending(view.base_score(*a), view.base_score(*b)));
    by_score.truncate(config.limits.ncand);

    let mut kept = vec![false; view.len()];
    for handle in &by_score {
        kept[handle.index()] = true;
    }
    let mut candidates: Vec<NodeHandle> = view.handles().filter(|h| kept[h.index()]).collect();
    if candidates.is_empty() {
        candidates = view.handles().collect();
    }
    debug!(
        "Candidate pool: {} hits expanded to {}, kept {}",
        view.hits().len(),
        pool_size,
        candidates.len()
    );
    candidates
}

/// Select candidates, run PPR on their induced subgraph, and rank them by
/// composite score.
pub fn score_candidates(view: &GraphView, config: &PackConfig) -> CandidateRanking {
    let candidates = select_candidates(view, config);
    if candidates.is_empty() {
        return CandidateRanking::default();
    }

    let mut local: Vec<Option<usize>> = vec![None; view.len()];
    for (i, handle) in candidates.iter().enumerate() {
        local[handle.index()] = Some(i);
    }
    let adjacency: Vec<Vec<usize>> = candidates
        .iter()
        .map(|&h| {
            view.successors(h)
                .iter()
                .filter_map(|dst| local[dst.index()])
                .collect()
        })
        .collect();
    let restart: Vec<f64> = candidates.iter().map(|&h| view.base_score(h)).collect();

    let params = PageRankParams {
        damping: config.pagerank.lambda,
        max_iterations: config.limits.iters,
        tolerance: config.limits.tol,
    };
    let outcome = personalized_pagerank(&adjacency, &restart, params);

    let theta = config.pagerank.theta;
    let scores: Vec<f64> = outcome
        .scores
        .iter()
        .zip(&restart)
        .map(|(ppr, base)| theta * ppr + (1.0 - theta) * base)
        .collect();

    let mut ranked: Vec<RankedCandidate> = candidates
        .iter()
        .zip(outcome.scores.iter().zip(&scores))
        .map(|(&handle, (&ppr, &score))| RankedCandidate { handle, ppr, score })
        .collect();
    ranked.sort_by(|a, b| by_descending(a.score, b.score));

    CandidateRanking {
        candidates,
        ppr_scores: outcome.scores,
        scores,
        ranked,
        iterations: outcome.iterations,
    }
}
