use log::{debug, info};
use road_reader::RoadSegment;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::PipelineError;

/// Default integer type for node and edge indices.
/// Needs to be increased for very large graphs > u32::max
pub type DefaultIdx = u32;

/// Node identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
pub struct NodeIndex(DefaultIdx);

impl NodeIndex {
    #[inline]
    pub fn new(x: usize) -> Self {
        NodeIndex(x as DefaultIdx)
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Short version of `NodeIndex::new`
pub fn node_index(index: usize) -> NodeIndex {
    NodeIndex::new(index)
}

/// Edge identifier.
#[derive(
    Debug, Copy, Clone, Default, PartialEq, PartialOrd, Eq, Ord, Hash, Deserialize, Serialize,
)]
pub struct EdgeIndex(DefaultIdx);

impl EdgeIndex {
    #[inline]
    pub fn new(x: usize) -> Self {
        EdgeIndex(x as DefaultIdx)
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Canonical spatial identity of a graph vertex: both coordinates
/// rounded to `decimals` places and scaled to integers. Two segment
/// endpoints merge into one node iff their keys are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct NodeKey {
    x: i64,
    y: i64,
}

impl NodeKey {
    pub fn new(x: f64, y: f64, decimals: u32) -> Self {
        let scale = 10f64.powi(decimals as i32);
        NodeKey {
            x: (x * scale).round() as i64,
            y: (y * scale).round() as i64,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Node {
    pub key: NodeKey,
    // Representative coordinates (first endpoint seen for this key)
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Edge {
    pub source: NodeIndex,
    pub target: NodeIndex,
    pub length_km: Option<f64>,
}

impl Edge {
    pub fn new(source: NodeIndex, target: NodeIndex, length_km: Option<f64>) -> Self {
        Edge {
            source,
            target,
            length_km,
        }
    }

    /// Shortest-path weight: segment length, or unit weight when the
    /// length is unknown.
    pub fn weight(&self) -> f64 {
        self.length_km.unwrap_or(1.0)
    }

    pub fn opposite(&self, node_idx: NodeIndex) -> NodeIndex {
        if self.source == node_idx {
            self.target
        } else {
            self.source
        }
    }
}

/// Undirected road graph with deduplicated nodes. No self-loops, no
/// parallel edges: repeated segments between one node pair collapse to
/// the first edge seen.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    adj: Vec<Vec<EdgeIndex>>,
    node_lookup: FxHashMap<NodeKey, NodeIndex>,
    edge_lookup: FxHashMap<(NodeIndex, NodeIndex), EdgeIndex>,
}

impl Graph {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn with_capacity(num_nodes: usize, num_edges: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(num_nodes),
            edges: Vec::with_capacity(num_edges),
            adj: Vec::with_capacity(num_nodes),
            node_lookup: FxHashMap::with_capacity_and_hasher(num_nodes, Default::default()),
            edge_lookup: FxHashMap::with_capacity_and_hasher(num_edges, Default::default()),
        }
    }

    /// Build the graph from validated road segments.
    ///
    /// Endpoints are rounded to `decimals` places; segments whose
    /// endpoints collapse to one key are discarded. Duplicate edges
    /// keep the first length seen.
    pub fn from_segments(segments: &[RoadSegment], decimals: u32) -> Result<Self, PipelineError> {
        let now = std::time::Instant::now();
        info!("BEGIN building graph from {} segments", segments.len());

        let mut g = Graph::with_capacity(segments.len(), segments.len());
        let mut self_loops = 0usize;
        let mut duplicates = 0usize;

        for segment in segments {
            let u = NodeKey::new(segment.x1, segment.y1, decimals);
            let v = NodeKey::new(segment.x2, segment.y2, decimals);

            if u == v {
                self_loops += 1;
                continue;
            }

            let u = g.add_node(u, segment.x1, segment.y1);
            let v = g.add_node(v, segment.x2, segment.y2);

            if g.add_edge(Edge::new(u, v, segment.length_km)).is_none() {
                duplicates += 1;
            }
        }

        debug!(
            "Discarded {} self-loop segments and {} duplicate edges",
            self_loops, duplicates
        );
        info!(
            "FINISHED building graph. {} nodes, {} edges. Took {:?}",
            g.nodes.len(),
            g.edges.len(),
            now.elapsed()
        );

        if g.nodes.is_empty() || g.edges.is_empty() {
            return Err(PipelineError::GraphEmpty {
                segments: segments.len(),
                nodes: g.nodes.len(),
                edges: g.edges.len(),
                self_loops,
            });
        }

        Ok(g)
    }

    /// Adds the node for `key`, or returns the existing index if the
    /// key was seen before.
    pub fn add_node(&mut self, key: NodeKey, x: f64, y: f64) -> NodeIndex {
        if let Some(node_idx) = self.node_lookup.get(&key) {
            return *node_idx;
        }

        let node_idx = NodeIndex::new(self.nodes.len());
        self.nodes.push(Node { key, x, y });
        self.adj.push(Vec::new());
        self.node_lookup.insert(key, node_idx);
        node_idx
    }

    /// Add an undirected edge. Returns `None` if an edge between the
    /// two nodes already exists (first-seen wins) or if the edge would
    /// be a self-loop.
    pub fn add_edge(&mut self, edge: Edge) -> Option<EdgeIndex> {
        if edge.source == edge.target {
            return None;
        }

        let key = normalize(edge.source, edge.target);
        if self.edge_lookup.contains_key(&key) {
            return None;
        }

        let edge_idx = EdgeIndex::new(self.edges.len());
        self.adj[edge.source.index()].push(edge_idx);
        self.adj[edge.target.index()].push(edge_idx);
        self.edge_lookup.insert(key, edge_idx);
        self.edges.push(edge);

        Some(edge_idx)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn edge(&self, edge_idx: EdgeIndex) -> &Edge {
        &self.edges[edge_idx.index()]
    }

    pub fn edge_between(&self, u: NodeIndex, v: NodeIndex) -> Option<EdgeIndex> {
        self.edge_lookup.get(&normalize(u, v)).copied()
    }

    pub fn degree(&self, node_idx: NodeIndex) -> usize {
        self.adj[node_idx.index()].len()
    }

    /// Iterate the incident edges of `node_idx` as
    /// `(edge index, neighbor)` pairs.
    pub fn neighbors(&self, node_idx: NodeIndex) -> impl Iterator<Item = (EdgeIndex, NodeIndex)> + '_ {
        self.adj[node_idx.index()]
            .iter()
            .map(move |edge_idx| (*edge_idx, self.edges[edge_idx.index()].opposite(node_idx)))
    }

    /// Per-edge lengths in kilometres, with missing lengths as 0.0.
    pub fn edge_lengths_km(&self) -> Vec<f64> {
        self.edges
            .iter()
            .map(|e| e.length_km.unwrap_or(0.0))
            .collect()
    }

    pub fn total_length_km(&self) -> f64 {
        self.edges.iter().filter_map(|e| e.length_km).sum()
    }
}

#[inline]
fn normalize(u: NodeIndex, v: NodeIndex) -> (NodeIndex, NodeIndex) {
    if u <= v {
        (u, v)
    } else {
        (v, u)
    }
}

#[cfg(test)]
mod tests {
    use road_reader::HighwayClass;

    use crate::util::test_graphs::seg;

    use super::*;

    #[test]
    fn merges_nodes_within_rounding_precision() {
        // Both endpoints round to (23.71, 37.98) at 5 decimals
        let segments = vec![
            seg(23.710_000_01, 37.980_000_02, 23.72, 37.99),
            seg(23.710_000_04, 37.979_999_99, 23.73, 37.97),
        ];

        let g = Graph::from_segments(&segments, 5).unwrap();

        assert_eq!(g.node_count(), 3);
        assert_eq!(g.edge_count(), 2);
    }

    #[test]
    fn discards_self_loop_segments() {
        let segments = vec![
            // Collapses to a single key at 5 decimals
            seg(23.710_000_01, 37.98, 23.710_000_02, 37.98),
            seg(23.71, 37.98, 23.72, 37.99),
        ];

        let g = Graph::from_segments(&segments, 5).unwrap();

        assert_eq!(g.node_count(), 2);
        assert_eq!(g.edge_count(), 1);
        for edge in &g.edges {
            assert_ne!(edge.source, edge.target);
        }
    }

    #[test]
    fn duplicate_edges_keep_first_length() {
        let segments = vec![
            seg(23.71, 37.98, 23.72, 37.99).with_length(2.0),
            seg(23.71, 37.98, 23.72, 37.99).with_length(9.0),
            // Same pair in reverse direction
            seg(23.72, 37.99, 23.71, 37.98).with_length(5.0),
        ];

        let g = Graph::from_segments(&segments, 5).unwrap();

        assert_eq!(g.edge_count(), 1);
        assert_eq!(g.edges[0].length_km, Some(2.0));
    }

    #[test]
    fn all_self_loops_is_graph_empty() {
        let segments = vec![seg(23.71, 37.98, 23.710_000_01, 37.98)];

        let err = Graph::from_segments(&segments, 5).unwrap_err();

        assert!(matches!(err, PipelineError::GraphEmpty { self_loops: 1, .. }));
    }

    #[test]
    fn no_segments_is_graph_empty() {
        let err = Graph::from_segments(&[], 5).unwrap_err();

        assert!(matches!(err, PipelineError::GraphEmpty { segments: 0, .. }));
    }

    #[test]
    fn neighbors_iterates_both_directions() {
        let segments = vec![
            seg(0.0, 0.0, 1.0, 0.0),
            seg(1.0, 0.0, 1.0, 1.0),
        ];

        let g = Graph::from_segments(&segments, 5).unwrap();

        // The shared corner node sees both edges
        let corner = NodeIndex::new(1);
        let neighbors: Vec<_> = g.neighbors(corner).map(|(_, n)| n).collect();
        assert_eq!(neighbors.len(), 2);
        assert!(neighbors.contains(&NodeIndex::new(0)));
        assert!(neighbors.contains(&NodeIndex::new(2)));
    }

    #[test]
    fn unknown_length_means_unit_weight() {
        let edge = Edge::new(NodeIndex::new(0), NodeIndex::new(1), None);
        assert_eq!(edge.weight(), 1.0);

        let seg = seg(0.0, 0.0, 1.0, 0.0).with_length(3.5);
        assert_eq!(seg.highway, HighwayClass::Primary);
        assert_eq!(seg.length_km, Some(3.5));
    }

    #[test]
    fn node_merging_survives_sub_precision_jitter() {
        let mut runner = proptest::test_runner::TestRunner::default();

        runner
            .run(
                &(-1e-6..1e-6f64, -1e-6..1e-6f64),
                |(dx, dy)| {
                    let a = NodeKey::new(23.71, 37.98, 5);
                    let b = NodeKey::new(23.71 + dx / 3.0, 37.98 + dy / 3.0, 5);
                    assert_eq!(a, b);
                    Ok(())
                },
            )
            .unwrap();
    }
}
