use std::{
    fmt::{Debug, Display},
    time::{Duration, Instant},
};

use histogram::Histogram;

use crate::graph::{node_index, Graph};

/// Wall-clock bookkeeping for one centrality estimation run.
#[derive(Debug, Default)]
pub struct EstimateStats {
    pub sources_sampled: usize,
    pub duration: Option<Duration>,
    start_time: Option<Instant>,
}

impl EstimateStats {
    pub fn init(&mut self) {
        self.sources_sampled = 0;
        self.start_time = Some(Instant::now());
    }

    pub fn finish(&mut self) {
        if let Some(start_time) = self.start_time {
            self.duration = Some(start_time.elapsed());
        }
    }
}

impl Display for EstimateStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Stats: {} sources sampled in {:?}",
            self.sources_sampled, self.duration
        )
    }
}

pub fn degree_hist(g: &Graph) -> Histogram {
    let hist = Histogram::new(0, 10, 30).unwrap();
    for node in 0..g.node_count() {
        let degree = g.degree(node_index(node));
        hist.increment(degree as u64, 1).unwrap();
    }
    hist
}

pub fn average_degree(g: &Graph) -> f64 {
    let mut sum = 0.0;
    for node in 0..g.node_count() {
        sum += g.degree(node_index(node)) as f64;
    }
    sum / g.node_count() as f64
}
