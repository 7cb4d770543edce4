//! Network-vulnerability indicator for a regional road network.
//!
//! # Basic usage
//! ```no_run
//! use std::path::Path;
//! use vuln_core::prelude::*;
//!
//! let segments =
//!     road_reader::read_segments(Path::new("segments.csv"), &Default::default())
//!         .expect("Failed to read segments");
//!
//! let cfg = PipelineConfig::new().region("EL30").seed(42);
//! let mut sink = CsvSink::new(Path::new("indicators.csv"));
//!
//! let summary = pipeline::run(&cfg, &segments, &mut sink).expect("Pipeline failed");
//! println!("Edge share >= p90: {:?}%", summary.edge_count_share_pct);
//! ```
pub mod aggregate;
pub mod centrality;
pub mod error;
pub mod graph;
pub mod pipeline;
pub mod prelude;
pub mod sink;
pub mod statistics;
pub mod util;

pub use error::PipelineError;
pub use graph::Graph;
