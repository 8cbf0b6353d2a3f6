use thiserror::Error;

use crate::types::TableKind;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Input file for {table} not found: {path}")]
    MissingInput { table: TableKind, path: String },

    #[error("CSV read failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Missing required column '{column}' in {table} input")]
    MissingColumn { table: TableKind, column: String },
}

pub type Result<T> = std::result::Result<T, PipelineError>;
