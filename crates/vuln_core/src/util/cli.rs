use std::path::PathBuf;

use chrono::NaiveDate;
use clap::Parser;
use road_reader::{HighwayClass, ReaderOptions};

use crate::centrality::SamplingParams;
use crate::pipeline::{PipelineConfig, ShareKind};

#[derive(Parser)]
#[command(version, about = "Road-network fragility indicator", long_about = None)]
struct Cli {
    /// Path to the segments CSV file (highway,x1,y1,x2,y2[,length_km])
    segments_file: String,

    /// Path to the indicator CSV file the result is upserted into
    #[arg(long, default_value = "indicators.csv")]
    sink: String,

    /// Region ISO code
    #[arg(long, default_value = "EL30")]
    region: String,

    /// Indicator code
    #[arg(long, default_value = "T2_VULN_CENTRAL_EDGES_SHARE")]
    code: String,

    /// Start of the scoring window (YYYY-MM-DD)
    #[arg(long, default_value = "2024-01-01")]
    time_start: NaiveDate,

    /// End of the scoring window (YYYY-MM-DD)
    #[arg(long, default_value = "2024-12-31")]
    time_end: NaiveDate,

    /// Comma-separated highway classes to keep (default: all major)
    #[arg(long, value_name = "classes", value_delimiter = ',')]
    classes: Option<Vec<HighwayClass>>,

    /// Percentile for the fragility threshold
    #[arg(short, long, default_value = "90.0")]
    percentile: f64,

    /// Seed for source sampling
    #[arg(long, default_value = "42")]
    seed: u64,

    /// Coordinate rounding precision in decimal places
    #[arg(long, default_value = "5")]
    decimals: u32,

    /// Use segment lengths as shortest-path weights
    #[arg(short, long)]
    weighted: bool,

    /// Publish the length-weighted share instead of the edge-count share
    #[arg(long)]
    publish_length_share: bool,

    /// Derive missing segment lengths from endpoint distance
    #[arg(long)]
    derive_lengths: bool,

    /// Show a progress bar during estimation
    #[arg(long)]
    progress: bool,
}

#[derive(Debug, Clone)]
pub struct Cfg {
    pub segments_file: PathBuf,
    pub sink_file: PathBuf,
    pub reader: ReaderOptions,
    pub pipeline: PipelineConfig,
}

pub fn parse() -> Cfg {
    let cli = Cli::parse();

    let mut reader = ReaderOptions {
        derive_missing_lengths: cli.derive_lengths,
        ..Default::default()
    };
    if let Some(classes) = &cli.classes {
        reader.allowed = classes.clone();
    }

    let publish = if cli.publish_length_share {
        ShareKind::LengthWeighted
    } else {
        ShareKind::EdgeCount
    };

    let pipeline = PipelineConfig::new()
        .region(&cli.region)
        .indicator_code(&cli.code)
        .window(cli.time_start, cli.time_end)
        .highway_classes(reader.allowed.clone())
        .rounding_decimals(cli.decimals)
        .percentile(cli.percentile)
        .sampling(SamplingParams::default())
        .seed(cli.seed)
        .weighted(cli.weighted)
        .publish(publish)
        .progress(cli.progress);

    Cfg {
        segments_file: PathBuf::from(cli.segments_file),
        sink_file: PathBuf::from(cli.sink),
        reader,
        pipeline,
    }
}
