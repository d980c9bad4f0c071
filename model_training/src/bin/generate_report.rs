use anyhow::{Context, Result};
use data_ingestion::PipelineConfig;
use data_ingestion::logger::init_logger;
use log::*;
use model_training::generate_markdown_report;

fn main() -> Result<()> {
    init_logger();
    let config = PipelineConfig::from_env().context("Failed to load pipeline configuration")?;

    let dataset = &config
        .report_target()
        .context("Invalid report configuration")?
        .name;
    let model_path = config.model_path(dataset);
    let data_path = config.processed_csv(dataset);

    let report = generate_markdown_report(&model_path, &data_path, &config.report_path)
        .with_context(|| format!("Failed to generate report for dataset {dataset}"))?;
    info!("Overall accuracy for {}: {:.4}", dataset, report.accuracy);
    Ok(())
}
