//! Pipeline entry point: segments in, one indicator upsert out.

use chrono::NaiveDate;
use log::{debug, info, warn};
use road_reader::{HighwayClass, RoadSegment, MAJOR};

use crate::aggregate::{summarize, IndicatorSummary};
use crate::centrality::{EdgeBetweenness, SamplingParams};
use crate::error::PipelineError;
use crate::graph::Graph;
use crate::sink::MetricSink;
use crate::statistics::{average_degree, degree_hist};

/// Which share becomes the published `value_raw`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShareKind {
    EdgeCount,
    LengthWeighted,
}

impl ShareKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShareKind::EdgeCount => "edge count",
            ShareKind::LengthWeighted => "length weighted",
        }
    }
}

/// All knobs of one pipeline run, fixed at call time.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub region: String,
    pub indicator_code: String,
    pub time_start: NaiveDate,
    pub time_end: NaiveDate,
    /// Allow-list the loader applied; recorded in the provenance text.
    pub highway_classes: Vec<HighwayClass>,
    pub rounding_decimals: u32,
    pub percentile: f64,
    pub sampling: SamplingParams,
    pub seed: u64,
    pub weighted: bool,
    pub publish: ShareKind,
    pub progress: bool,
}

impl PipelineConfig {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn region(mut self, region: &str) -> Self {
        self.region = region.to_string();
        self
    }

    pub fn indicator_code(mut self, code: &str) -> Self {
        self.indicator_code = code.to_string();
        self
    }

    pub fn window(mut self, time_start: NaiveDate, time_end: NaiveDate) -> Self {
        self.time_start = time_start;
        self.time_end = time_end;
        self
    }

    pub fn highway_classes(mut self, classes: Vec<HighwayClass>) -> Self {
        self.highway_classes = classes;
        self
    }

    pub fn rounding_decimals(mut self, decimals: u32) -> Self {
        self.rounding_decimals = decimals;
        self
    }

    pub fn percentile(mut self, percentile: f64) -> Self {
        self.percentile = percentile;
        self
    }

    pub fn sampling(mut self, sampling: SamplingParams) -> Self {
        self.sampling = sampling;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn weighted(mut self, weighted: bool) -> Self {
        self.weighted = weighted;
        self
    }

    pub fn publish(mut self, publish: ShareKind) -> Self {
        self.publish = publish;
        self
    }

    pub fn progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            region: "EL30".to_string(),
            indicator_code: "T2_VULN_CENTRAL_EDGES_SHARE".to_string(),
            time_start: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            time_end: NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
            highway_classes: MAJOR.to_vec(),
            rounding_decimals: 5,
            percentile: 90.0,
            sampling: SamplingParams::default(),
            seed: 42,
            weighted: false,
            publish: ShareKind::EdgeCount,
            progress: false,
        }
    }
}

/// Run the full pipeline: build the graph, estimate centrality,
/// aggregate, and upsert the configured share.
///
/// Fatal errors abort before anything reaches the sink. A run whose
/// published share is undefined (length-weighted with zero total
/// length) skips the write and still returns the summary.
pub fn run(
    cfg: &PipelineConfig,
    segments: &[RoadSegment],
    sink: &mut dyn MetricSink,
) -> Result<IndicatorSummary, PipelineError> {
    let usable: Vec<RoadSegment> = segments.iter().filter(|s| s.is_valid()).cloned().collect();
    if usable.is_empty() {
        return Err(PipelineError::InputEmpty {
            total: segments.len(),
            dropped: segments.len(),
        });
    }

    let g = Graph::from_segments(&usable, cfg.rounding_decimals)?;
    info!(
        "Graph has {} nodes, {} edges, {:.1} km total, average degree {:.2}",
        g.node_count(),
        g.edge_count(),
        g.total_length_km(),
        average_degree(&g)
    );
    if log::log_enabled!(log::Level::Debug) {
        for bucket in degree_hist(&g).into_iter().filter(|b| b.count() > 0) {
            debug!("Degree [{}-{}]: {}", bucket.low(), bucket.high(), bucket.count());
        }
    }

    let k = cfg.sampling.sample_size(g.node_count());
    let centrality = EdgeBetweenness::new(&g)
        .weighted(cfg.weighted)
        .seed(cfg.seed)
        .progress(cfg.progress)
        .estimate(k)?;

    let summary = summarize(&g, &centrality, cfg.percentile)?;

    let source_text = provenance(cfg, &summary, k);

    let value = match cfg.publish {
        ShareKind::EdgeCount => summary.edge_count_share_pct,
        ShareKind::LengthWeighted => summary.length_weighted_share_pct,
    };

    match value {
        Some(value) => {
            sink.upsert_indicator(
                &cfg.region,
                &cfg.indicator_code,
                cfg.time_start,
                cfg.time_end,
                value,
                &source_text,
            )
            .map_err(PipelineError::SinkWriteFailed)?;
            info!(
                "Upserted {}={:.3}% for {} {}..{}",
                cfg.indicator_code, value, cfg.region, cfg.time_start, cfg.time_end
            );
        }
        None => {
            warn!(
                "Published share ({}) is undefined, skipping sink write",
                cfg.publish.as_str()
            );
        }
    }

    Ok(summary)
}

fn provenance(cfg: &PipelineConfig, summary: &IndicatorSummary, k: usize) -> String {
    let classes: Vec<&str> = cfg.highway_classes.iter().map(|c| c.as_str()).collect();
    format!(
        "Road graph ({} nodes, {} edges; classes: {}); edge betweenness \
         (k={} sources, seed {}, {} paths); rounded nodes @1e-{} deg; share by {}",
        summary.node_count,
        summary.edge_count,
        classes.join(","),
        k,
        cfg.seed,
        if cfg.weighted { "length-weighted" } else { "unweighted" },
        cfg.rounding_decimals,
        cfg.publish.as_str(),
    )
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use crate::sink::MemorySink;
    use crate::util::test_graphs::{seg, square_segments, square_segments_with_lengths};

    use super::*;

    fn init_log() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    #[test]
    fn square_end_to_end() {
        init_log();
        let cfg = PipelineConfig::new();
        let mut sink = MemorySink::new();

        let summary = run(&cfg, &square_segments(), &mut sink).unwrap();

        assert_abs_diff_eq!(summary.edge_count_share_pct.unwrap(), 100.0);
        assert_eq!(sink.len(), 1);

        let row = sink
            .get("EL30", "T2_VULN_CENTRAL_EDGES_SHARE", cfg.time_start, cfg.time_end)
            .unwrap();
        assert_abs_diff_eq!(row.value_raw, 100.0);
        assert!(row.source.contains("seed 42"));
        assert!(row.source.contains("1e-5 deg"));
        assert_eq!(row.value_norm, None);
    }

    #[test]
    fn empty_input_never_touches_the_sink() {
        let cfg = PipelineConfig::new();
        let mut sink = MemorySink::new();

        let err = run(&cfg, &[], &mut sink).unwrap_err();

        assert!(matches!(err, PipelineError::InputEmpty { .. }));
        assert!(sink.is_empty());
    }

    #[test]
    fn invalid_only_input_never_touches_the_sink() {
        let cfg = PipelineConfig::new();
        let mut sink = MemorySink::new();

        let segments = vec![seg(f64::NAN, 0.0, 1.0, 1.0)];
        let err = run(&cfg, &segments, &mut sink).unwrap_err();

        assert!(matches!(err, PipelineError::InputEmpty { total: 1, .. }));
        assert!(sink.is_empty());
    }

    #[test]
    fn graph_empty_aborts_before_the_sink() {
        let cfg = PipelineConfig::new();
        let mut sink = MemorySink::new();

        // Single segment collapsing to a self-loop
        let segments = vec![seg(23.71, 37.98, 23.710_000_01, 37.98)];
        let err = run(&cfg, &segments, &mut sink).unwrap_err();

        assert!(matches!(err, PipelineError::GraphEmpty { .. }));
        assert!(sink.is_empty());
    }

    #[test]
    fn undefined_length_share_skips_the_write() {
        let cfg = PipelineConfig::new().publish(ShareKind::LengthWeighted);
        let mut sink = MemorySink::new();

        // Lengths all missing, so the published share is undefined
        let summary = run(&cfg, &square_segments(), &mut sink).unwrap();

        assert_eq!(summary.length_weighted_share_pct, None);
        assert!(sink.is_empty());
    }

    #[test]
    fn length_weighted_publish_writes_the_length_share() {
        let cfg = PipelineConfig::new()
            .publish(ShareKind::LengthWeighted)
            .weighted(true);
        let mut sink = MemorySink::new();

        let summary = run(&cfg, &square_segments_with_lengths(), &mut sink).unwrap();

        let row = sink
            .get("EL30", "T2_VULN_CENTRAL_EDGES_SHARE", cfg.time_start, cfg.time_end)
            .unwrap();
        assert_abs_diff_eq!(row.value_raw, summary.length_weighted_share_pct.unwrap());
        assert!(row.source.contains("length-weighted"));
    }

    #[test]
    fn rerun_overwrites_the_same_window() {
        let cfg = PipelineConfig::new();
        let mut sink = MemorySink::new();

        run(&cfg, &square_segments(), &mut sink).unwrap();
        run(&cfg, &square_segments(), &mut sink).unwrap();

        assert_eq!(sink.len(), 1);
    }

    #[test]
    fn failing_sink_propagates() {
        struct FailingSink;
        impl MetricSink for FailingSink {
            fn upsert_indicator(
                &mut self,
                _: &str,
                _: &str,
                _: NaiveDate,
                _: NaiveDate,
                _: f64,
                _: &str,
            ) -> anyhow::Result<()> {
                anyhow::bail!("connection refused")
            }
        }

        let cfg = PipelineConfig::new();
        let err = run(&cfg, &square_segments(), &mut FailingSink).unwrap_err();

        assert!(matches!(err, PipelineError::SinkWriteFailed(_)));
    }
}
