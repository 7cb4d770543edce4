//! Re-exports of the most commonly used items in `vuln_core`.
pub use crate::aggregate::{summarize, IndicatorSummary};
pub use crate::centrality::{CentralityValues, EdgeBetweenness, SamplingParams};
pub use crate::error::PipelineError;
pub use crate::pipeline::{self, PipelineConfig, ShareKind};
pub use crate::sink::{CsvSink, MemorySink, MetricSink};

pub use crate::graph::node_index;
pub use crate::graph::Graph;
