//! Approximate edge-betweenness centrality via k-sampled Brandes
//! accumulation.
//!
//! One single-source shortest-path pass is run per sampled source,
//! dependencies are accumulated onto the edges of the shortest-path
//! DAG, and the totals are rescaled by `|V| / k` to project the sample
//! to the full node population.

use std::collections::{BinaryHeap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};

use indicatif::ProgressBar;
use log::{debug, info};
use rand::{rngs::StdRng, SeedableRng};
use rayon::prelude::*;

use crate::error::PipelineError;
use crate::graph::{EdgeIndex, Graph, NodeIndex};
use crate::statistics::EstimateStats;

const STEP_SIZE: f64 = 5.0;

/// How many sources to sample relative to graph size.
#[derive(Debug, Clone, Copy)]
pub struct SamplingParams {
    pub fraction: f64,
    pub min_k: usize,
    pub max_k: usize,
}

impl SamplingParams {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn fraction(mut self, fraction: f64) -> Self {
        self.fraction = fraction;
        self
    }

    pub fn min_k(mut self, min_k: usize) -> Self {
        self.min_k = min_k;
        self
    }

    pub fn max_k(mut self, max_k: usize) -> Self {
        self.max_k = max_k;
        self
    }

    /// `clamp(round(fraction * n), min_k, max_k)`, additionally capped
    /// at `n` so small graphs degrade to exhaustive sampling.
    pub fn sample_size(&self, node_count: usize) -> usize {
        let k = (self.fraction * node_count as f64).round() as usize;
        k.clamp(self.min_k, self.max_k).min(node_count)
    }
}

impl Default for SamplingParams {
    fn default() -> Self {
        SamplingParams {
            fraction: 0.02,
            min_k: 200,
            max_k: 1500,
        }
    }
}

/// Edge centrality estimates, one slot per edge of the graph the
/// estimator ran on. Values may be non-finite; callers filter
/// explicitly.
#[derive(Debug, Clone)]
pub struct CentralityValues {
    values: Vec<f64>,
}

impl CentralityValues {
    pub fn get(&self, edge_idx: EdgeIndex) -> f64 {
        self.values[edge_idx.index()]
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn finite(&self) -> Vec<f64> {
        self.values.iter().copied().filter(|v| v.is_finite()).collect()
    }
}

struct Candidate {
    node_idx: NodeIndex,
    weight: f64,
}

impl Candidate {
    fn new(node_idx: NodeIndex, weight: f64) -> Self {
        Self { node_idx, weight }
    }
}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        other.weight.partial_cmp(&self.weight)
    }
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        other.weight == self.weight
    }
}

impl Eq for Candidate {}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        other
            .weight
            .partial_cmp(&self.weight)
            .unwrap_or(std::cmp::Ordering::Equal)
    }
}

pub struct EdgeBetweenness<'a> {
    pub stats: EstimateStats,
    g: &'a Graph,
    weighted: bool,
    seed: u64,
    progress: bool,
}

impl<'a> EdgeBetweenness<'a> {
    pub fn new(graph: &'a Graph) -> Self {
        EdgeBetweenness {
            g: graph,
            weighted: false,
            seed: 42,
            progress: false,
            stats: EstimateStats::default(),
        }
    }

    /// Use segment lengths as shortest-path weights instead of hop
    /// counts.
    pub fn weighted(mut self, weighted: bool) -> Self {
        self.weighted = weighted;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    /// Draw `k` sources without replacement. The set depends only on
    /// the seed and the graph's node count, never on worker scheduling.
    pub fn sample_sources(&self, k: usize) -> Vec<NodeIndex> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        rand::seq::index::sample(&mut rng, self.g.node_count(), k.min(self.g.node_count()))
            .into_iter()
            .map(NodeIndex::new)
            .collect()
    }

    /// Estimate edge betweenness from `k` sampled sources.
    ///
    /// Per-source passes run in parallel; each produces a private
    /// contribution vector and the vectors are reduced by summation,
    /// so only floating-point rounding depends on scheduling.
    pub fn estimate(&mut self, k: usize) -> Result<CentralityValues, PipelineError> {
        let n = self.g.node_count();
        let m = self.g.edge_count();

        self.stats.init();
        let sources = self.sample_sources(k);
        let k = sources.len();

        info!(
            "BEGIN estimating betweenness for {} edges ({} of {} sources, weighted: {})",
            m, k, n, self.weighted
        );

        let pb = if self.progress {
            Some(ProgressBar::new(k as u64))
        } else {
            None
        };
        let step = ((k as f64 * STEP_SIZE / 100.0).ceil() as usize).max(1);
        let processed = AtomicUsize::new(0);

        let g = self.g;
        let weighted = self.weighted;

        let totals = sources
            .par_iter()
            .map(|&s| {
                let contrib = single_source_pass(g, s, weighted);
                let done = processed.fetch_add(1, Ordering::Relaxed) + 1;
                if done % step == 0 {
                    debug!("Progress: {:.2}%", done as f64 / k as f64 * 100.0);
                }
                if let Some(pb) = &pb {
                    pb.inc(1);
                }
                contrib
            })
            .reduce(
                || vec![0.0; m],
                |mut acc, contrib| {
                    for (total, c) in acc.iter_mut().zip(contrib) {
                        *total += c;
                    }
                    acc
                },
            );

        if let Some(pb) = &pb {
            pb.finish_and_clear();
        }

        // Project the k-sample estimate to the full node population
        let scale = n as f64 / k as f64;
        let values: Vec<f64> = totals.into_iter().map(|v| v * scale).collect();

        self.stats.sources_sampled = k;
        self.stats.finish();
        info!(
            "FINISHED estimating betweenness. Took {:?}",
            self.stats.duration.unwrap_or_default()
        );

        if !values.iter().any(|v| v.is_finite()) {
            return Err(PipelineError::NoFiniteCentrality { edges: m });
        }

        Ok(CentralityValues { values })
    }
}

/// One Brandes single-source pass: shortest-path DAG from `s`, then
/// dependency accumulation onto the DAG's edges in reverse settle
/// order.
fn single_source_pass(g: &Graph, s: NodeIndex, weighted: bool) -> Vec<f64> {
    let n = g.node_count();

    let mut sigma = vec![0.0f64; n];
    let mut preds: Vec<Vec<(NodeIndex, EdgeIndex)>> = vec![Vec::new(); n];
    let mut order: Vec<NodeIndex> = Vec::with_capacity(n);

    sigma[s.index()] = 1.0;

    if weighted {
        dijkstra_tree(g, s, &mut sigma, &mut preds, &mut order);
    } else {
        bfs_tree(g, s, &mut sigma, &mut preds, &mut order);
    }

    let mut contrib = vec![0.0f64; g.edge_count()];
    let mut delta = vec![0.0f64; n];

    // Leaves of the shortest-path DAG first
    for &w in order.iter().rev() {
        let coeff = (1.0 + delta[w.index()]) / sigma[w.index()];
        for &(u, e) in &preds[w.index()] {
            let c = sigma[u.index()] * coeff;
            contrib[e.index()] += c;
            delta[u.index()] += c;
        }
    }

    contrib
}

fn bfs_tree(
    g: &Graph,
    s: NodeIndex,
    sigma: &mut [f64],
    preds: &mut [Vec<(NodeIndex, EdgeIndex)>],
    order: &mut Vec<NodeIndex>,
) {
    let mut dist = vec![-1i64; g.node_count()];
    let mut queue = VecDeque::new();

    dist[s.index()] = 0;
    queue.push_back(s);

    while let Some(v) = queue.pop_front() {
        order.push(v);
        let next_dist = dist[v.index()] + 1;

        for (edge_idx, w) in g.neighbors(v) {
            if dist[w.index()] < 0 {
                dist[w.index()] = next_dist;
                queue.push_back(w);
            }
            if dist[w.index()] == next_dist {
                sigma[w.index()] += sigma[v.index()];
                preds[w.index()].push((v, edge_idx));
            }
        }
    }
}

fn dijkstra_tree(
    g: &Graph,
    s: NodeIndex,
    sigma: &mut [f64],
    preds: &mut [Vec<(NodeIndex, EdgeIndex)>],
    order: &mut Vec<NodeIndex>,
) {
    let mut dist = vec![f64::INFINITY; g.node_count()];
    let mut settled = vec![false; g.node_count()];
    let mut queue = BinaryHeap::new();

    dist[s.index()] = 0.0;
    queue.push(Candidate::new(s, 0.0));

    while let Some(Candidate { node_idx, weight }) = queue.pop() {
        // Lazy deletion: stale entries are skipped on pop
        if settled[node_idx.index()] {
            continue;
        }
        settled[node_idx.index()] = true;
        order.push(node_idx);

        for (edge_idx, w) in g.neighbors(node_idx) {
            let new_distance = weight + g.edge(edge_idx).weight();

            if new_distance < dist[w.index()] {
                dist[w.index()] = new_distance;
                sigma[w.index()] = sigma[node_idx.index()];
                preds[w.index()].clear();
                preds[w.index()].push((node_idx, edge_idx));
                queue.push(Candidate::new(w, new_distance));
            } else if !settled[w.index()] && new_distance == dist[w.index()] {
                // Tied shortest path: accumulate path counts
                sigma[w.index()] += sigma[node_idx.index()];
                preds[w.index()].push((node_idx, edge_idx));
            }
        }
    }
}
