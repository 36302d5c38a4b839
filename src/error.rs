use arrow_schema::ArrowError;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Could not read input {}: {source}", .path.display())]
    Input {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("Missing required column: {0}")]
    MissingColumn(String),
    #[error("Could not write output {}: {source}", .path.display())]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Parquet Error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),
    #[error("Arrow Error: {0}")]
    Arrow(#[from] ArrowError),
    #[error("JSON Error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Chart Error: {0}")]
    Chart(String),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
