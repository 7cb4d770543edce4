//! Fixture graphs shared across test modules.

use road_reader::{HighwayClass, RoadSegment};

use crate::graph::Graph;

pub fn seg(x1: f64, y1: f64, x2: f64, y2: f64) -> RoadSegment {
    RoadSegment::new(HighwayClass::Primary, x1, y1, x2, y2)
}

/// A 4-cycle: N1-N2-N3-N4-N1, no lengths.
pub fn square_segments() -> Vec<RoadSegment> {
    vec![
        seg(0.0, 0.0, 1.0, 0.0),
        seg(1.0, 0.0, 1.0, 1.0),
        seg(1.0, 1.0, 0.0, 1.0),
        seg(0.0, 1.0, 0.0, 0.0),
    ]
}

pub fn square_segments_with_lengths() -> Vec<RoadSegment> {
    square_segments()
        .into_iter()
        .map(|s| s.with_length(1.0))
        .collect()
}

pub fn square_graph() -> Graph {
    Graph::from_segments(&square_segments(), 5).unwrap()
}

/// Two triangles joined by one bridge edge.
///
///  b           f
///  | \        / |
///  |   c -- d   |
///  | /        \ |
///  a           e
///
/// Node order: a=0, b=1, c=2, d=3, e=4, f=5; the bridge is edge 3
/// between nodes 2 and 3.
pub fn bowtie_segments() -> Vec<RoadSegment> {
    let a = (0.0, 0.0);
    let b = (0.0, 1.0);
    let c = (1.0, 0.5);
    let d = (2.0, 0.5);
    let e = (3.0, 0.0);
    let f = (3.0, 1.0);

    vec![
        seg(a.0, a.1, b.0, b.1),
        seg(a.0, a.1, c.0, c.1),
        seg(b.0, b.1, c.0, c.1),
        seg(c.0, c.1, d.0, d.1),
        seg(d.0, d.1, e.0, e.1),
        seg(d.0, d.1, f.0, f.1),
        seg(e.0, e.1, f.0, f.1),
    ]
}

pub fn bowtie_graph() -> Graph {
    Graph::from_segments(&bowtie_segments(), 5).unwrap()
}

/// Chain of `n` nodes along the x axis.
pub fn path_graph(n: usize) -> Graph {
    let segments: Vec<RoadSegment> = (0..n - 1)
        .map(|i| seg(i as f64 * 0.001, 0.0, (i + 1) as f64 * 0.001, 0.0))
        .collect();
    Graph::from_segments(&segments, 5).unwrap()
}

/// Diamond with two equal-length routes between opposite corners,
/// every edge 1 km.
pub fn weighted_diamond_graph() -> Graph {
    let segments = vec![
        seg(0.0, 0.0, 1.0, 0.0).with_length(1.0),
        seg(0.0, 0.0, 0.0, 1.0).with_length(1.0),
        seg(1.0, 0.0, 1.0, 1.0).with_length(1.0),
        seg(0.0, 1.0, 1.0, 1.0).with_length(1.0),
    ];
    Graph::from_segments(&segments, 5).unwrap()
}
