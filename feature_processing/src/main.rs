use anyhow::{Context, Result};
use data_ingestion::PipelineConfig;
use data_ingestion::logger::init_logger;
use feature_processing::pipeline::process_all;
use log::*;

fn main() -> Result<()> {
    init_logger();
    let config = PipelineConfig::from_env().context("Failed to load pipeline configuration")?;

    let outputs = process_all(&config).context("Feature processing failed")?;
    for output in &outputs {
        info!(
            "Saved combined processed data for {} to {} and {}",
            output.dataset,
            output.csv_path.display(),
            output.parquet_path.display()
        );
    }

    info!("Feature processing finished for {} datasets", outputs.len());
    Ok(())
}
