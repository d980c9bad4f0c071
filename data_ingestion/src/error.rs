use std::path::PathBuf;

use config;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DataIngestionError {
    #[error("Input not found: {}", .0.display())]
    MissingInput(PathBuf),

    #[error("Expected a directory of CSV files: {} is not a directory", .0.display())]
    NotADirectory(PathBuf),

    #[error("{origin}: required column `{column}` is missing")]
    MissingColumn { origin: String, column: &'static str },

    #[error("{origin}: record {record}: cannot parse timestamp `{value}`")]
    InvalidTimestamp {
        origin: String,
        record: usize,
        value: String,
    },

    #[error("{origin}: record {record}: column `{column}` is not a number: `{value}`")]
    InvalidNumber {
        origin: String,
        record: usize,
        column: &'static str,
        value: String,
    },

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Config not found: {0}")]
    ConfigValueNotFoundError(#[from] config::ConfigError),
}
