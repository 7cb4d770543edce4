use log::{info, warn};

use crate::centrality::CentralityValues;
use crate::error::PipelineError;
use crate::graph::Graph;
use crate::util::math::quantile;

/// Condensed fragility metrics for one run: the percentile threshold
/// over the finite centrality distribution plus the shares of the
/// network at or above it.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSummary {
    pub threshold: f64,
    pub edge_count_share_pct: Option<f64>,
    pub length_weighted_share_pct: Option<f64>,
    pub node_count: usize,
    pub edge_count: usize,
}

/// Compute the percentile threshold and both shares.
///
/// Non-finite centrality values are excluded from the distribution.
/// The length-weighted share is absent when the total network length
/// is zero; it is never reported as 0 or NaN in that case.
pub fn summarize(
    g: &Graph,
    centrality: &CentralityValues,
    percentile: f64,
) -> Result<IndicatorSummary, PipelineError> {
    let finite = centrality.finite();

    let threshold = quantile(&finite, percentile / 100.0).ok_or(
        PipelineError::NoFiniteCentrality {
            edges: centrality.len(),
        },
    )?;

    // Ties at the threshold are in
    let above = finite.iter().filter(|v| **v >= threshold).count();
    let edge_count_share_pct = Some(100.0 * above as f64 / finite.len() as f64);

    let lengths = g.edge_lengths_km();
    let total_km: f64 = lengths.iter().sum();
    let length_weighted_share_pct = if total_km > 0.0 {
        let above_km: f64 = centrality
            .values()
            .iter()
            .zip(&lengths)
            .filter(|(v, _)| v.is_finite() && **v >= threshold)
            .map(|(_, km)| km)
            .sum();
        Some(100.0 * above_km / total_km)
    } else {
        warn!("{}", PipelineError::UndefinedShare);
        None
    };

    info!(
        "p{} threshold: {:.6}, edge share: {:?}%, length share: {:?}%",
        percentile, threshold, edge_count_share_pct, length_weighted_share_pct
    );

    Ok(IndicatorSummary {
        threshold,
        edge_count_share_pct,
        length_weighted_share_pct,
        node_count: g.node_count(),
        edge_count: g.edge_count(),
    })
}
