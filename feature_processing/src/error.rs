use data_ingestion::DataIngestionError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FeatureError {
    #[error(transparent)]
    Ingestion(#[from] DataIngestionError),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Arrow error: {0}")]
    ArrowError(#[from] arrow::error::ArrowError),

    #[error("Parquet error: {0}")]
    ParquetError(#[from] parquet::errors::ParquetError),

    #[error("JSON serialization error: {0}")]
    SerdeJsonError(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Column `{0}` is missing or has an unexpected type")]
    InvalidColumn(String),

    #[error("Timestamp {0}us is out of range")]
    InvalidTimestamp(i64),
}
