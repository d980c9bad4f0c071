use std::path::PathBuf;

use data_ingestion::{DatasetConfig, PipelineConfig, scan_dataset};
use log::{info, warn};

use crate::batch::build_batch;
use crate::error::FeatureError;
use crate::feature_view::FeatureView;
use crate::persistence::{write_csv, write_parquet};
use crate::types::FeatureTable;

/// Where a processed dataset version was written.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetOutput {
    pub dataset: String,
    pub rows: usize,
    pub instruments: usize,
    pub csv_path: PathBuf,
    pub parquet_path: PathBuf,
    pub feature_view_path: PathBuf,
}

/// Builds the feature table for every source of `dataset` and writes it as
/// CSV, Parquet and a feature-view descriptor. A missing source directory
/// aborts; sources without CSV files are skipped, and a dataset with no
/// files at all writes nothing.
pub fn process_dataset(
    config: &PipelineConfig,
    dataset: &DatasetConfig,
) -> Result<Option<DatasetOutput>, FeatureError> {
    let mut tables = Vec::with_capacity(dataset.sources.len());
    let mut instruments = 0;

    for source in &dataset.sources {
        let dir = config.source_dir(source);
        let batch = scan_dataset(&dir)?;
        if batch.is_empty() {
            warn!("{}: no CSV files in {}. Skipping.", dataset.name, dir.display());
            continue;
        }
        instruments += batch.len();
        tables.push(build_batch(&batch));
    }

    if tables.is_empty() {
        warn!("{}: nothing to process", dataset.name);
        return Ok(None);
    }

    let table = FeatureTable::concat(tables);
    let csv_path = config.processed_csv(&dataset.name);
    let parquet_path = config.processed_parquet(&dataset.name);
    let feature_view_path = config.feature_view_path(&dataset.name);

    write_csv(&table, &csv_path)?;
    write_parquet(&table, &parquet_path)?;
    FeatureView::stock_technical_features(&parquet_path).write(&feature_view_path)?;

    info!(
        "{}: {} rows from {} instruments",
        dataset.name,
        table.len(),
        instruments
    );
    Ok(Some(DatasetOutput {
        dataset: dataset.name.clone(),
        rows: table.len(),
        instruments,
        csv_path,
        parquet_path,
        feature_view_path,
    }))
}

pub fn process_all(config: &PipelineConfig) -> Result<Vec<DatasetOutput>, FeatureError> {
    let mut outputs = Vec::new();
    for dataset in &config.datasets {
        info!("Processing dataset {}", dataset.name);
        if let Some(output) = process_dataset(config, dataset)? {
            outputs.push(output);
        }
    }
    Ok(outputs)
}
