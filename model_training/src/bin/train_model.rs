use anyhow::{Context, Result};
use data_ingestion::PipelineConfig;
use data_ingestion::logger::init_logger;
use log::*;
use model_training::train_and_evaluate_model;

fn main() -> Result<()> {
    init_logger();
    let config = PipelineConfig::from_env().context("Failed to load pipeline configuration")?;

    for dataset in &config.datasets {
        let data_path = config.processed_parquet(&dataset.name);
        if !data_path.exists() {
            warn!(
                "No processed data for {} at {}, skipping",
                dataset.name,
                data_path.display()
            );
            continue;
        }

        let model_path = config.model_path(&dataset.name);
        info!("--- Training model for dataset: {} ---", dataset.name);
        let outcome = train_and_evaluate_model(&data_path, &model_path, &config.training)
            .with_context(|| format!("Training failed for dataset {}", dataset.name))?;
        info!(
            "Dataset {}: accuracy {:.4} on {} held-out rows",
            dataset.name, outcome.report.accuracy, outcome.test_size
        );
    }

    info!("--- All models trained ---");
    Ok(())
}
