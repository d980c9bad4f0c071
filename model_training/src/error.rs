use thiserror::Error;

#[derive(Error, Debug)]
pub enum TrainingError {
    #[error("Required column `{0}` is missing")]
    MissingColumn(String),

    #[error("Unsupported table format: {0}")]
    UnsupportedFormat(String),

    #[error("Dataset has no usable rows")]
    EmptyDataset,

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Model has not been fitted yet")]
    NotFitted,

    #[error("Dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("Polars error: {0}")]
    PolarsError(#[from] polars::error::PolarsError),

    #[error("Shape error: {0}")]
    ShapeError(#[from] ndarray::ShapeError),

    #[error("JSON serialization error: {0}")]
    SerdeJsonError(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}
