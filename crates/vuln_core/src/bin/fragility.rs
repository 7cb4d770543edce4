use anyhow::Context;
use vuln_core::prelude::*;
use vuln_core::util::cli;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cfg = cli::parse();

    let segments = road_reader::read_segments(&cfg.segments_file, &cfg.reader)
        .context("Failed to read segments")?;

    let mut sink = CsvSink::new(&cfg.sink_file);
    let summary = pipeline::run(&cfg.pipeline, &segments, &mut sink)?;

    println!(
        "Graph nodes: {}, edges: {}",
        summary.node_count, summary.edge_count
    );
    println!("Edge betweenness p{}: {:.6}", cfg.pipeline.percentile, summary.threshold);
    if let Some(share) = summary.edge_count_share_pct {
        println!("Share of edges >= threshold: {:.3}%", share);
    }
    if let Some(share) = summary.length_weighted_share_pct {
        println!("Share of km >= threshold: {:.3}%", share);
    }

    Ok(())
}
