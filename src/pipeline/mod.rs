// Data processing pipeline: ingestion and processing stages

pub mod ingestion;
pub mod processing;
pub mod pipeline;

pub use pipeline::{Pipeline, PipelineOutput, PipelineReport};
