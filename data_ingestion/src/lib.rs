pub mod config;
pub mod error;
pub mod loader;
pub mod logger;
pub mod observation;
pub mod schema;

pub use config::{DatasetConfig, PipelineConfig, TrainingConfig};
pub use error::DataIngestionError;
pub use loader::{read_observations, read_series_file, scan_dataset};
pub use observation::{InstrumentSeries, Observation};
