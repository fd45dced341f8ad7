use thiserror::Error;

#[derive(Error, Debug)]
pub enum InsightError {
    #[error("Ingestion error: {0}")]
    Ingest(String),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Profiling error: {0}")]
    Profile(String),

    #[error("Chart error: {0}")]
    Chart(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),
}

pub type Result<T> = std::result::Result<T, InsightError>;
