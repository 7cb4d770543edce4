use thiserror::Error;

/// Failure taxonomy for the fragility pipeline. The first three are
/// fatal and abort the run before anything is written to the sink.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("no usable road segments after filtering ({dropped} of {total} dropped)")]
    InputEmpty { total: usize, dropped: usize },

    #[error(
        "graph is empty: {segments} segments produced {nodes} nodes and {edges} edges \
         ({self_loops} collapsed to self-loops)"
    )]
    GraphEmpty {
        segments: usize,
        nodes: usize,
        edges: usize,
        self_loops: usize,
    },

    #[error("all {edges} edge centrality estimates are non-finite")]
    NoFiniteCentrality { edges: usize },

    #[error("length-weighted share is undefined: total network length is zero")]
    UndefinedShare,

    #[error("metric sink rejected the indicator upsert")]
    SinkWriteFailed(#[source] anyhow::Error),
}
