// Observability: metrics recording and export

pub mod metrics;

pub use metrics::{init, render, MetricName};

// Phase recorders
pub use metrics::{aggregate, clean, ingest, join, pipeline};
