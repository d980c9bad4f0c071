use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use log::info;

use crate::dataset::{Dataset, load_dataset};
use crate::error::TrainingError;
use crate::metrics::ClassificationReport;
use crate::model::{Classifier, LogisticRegression};

pub fn evaluate(
    model: &impl Classifier,
    dataset: &Dataset,
) -> Result<ClassificationReport, TrainingError> {
    let predictions = model.predict(&dataset.x)?;
    ClassificationReport::from_predictions(&dataset.y, &predictions)
}

pub fn render_markdown(
    model_path: &Path,
    data_path: &Path,
    report: &ClassificationReport,
) -> String {
    let mut md = String::new();
    md.push_str("# Model Performance Report\n\n");
    md.push_str(&format!("**Model Path:** `{}`\n", model_path.display()));
    md.push_str(&format!("**Data Path:** `{}`\n\n", data_path.display()));
    md.push_str("## Overall Accuracy\n");
    md.push_str(&format!("`{:.4}`\n\n", report.accuracy));
    md.push_str("## Classification Report\n");
    md.push_str("| class | precision | recall | f1-score | support |\n");
    md.push_str("|:--|--:|--:|--:|--:|\n");
    for (label, m) in report.rows() {
        let _ = writeln!(
            md,
            "| {} | {:.4} | {:.4} | {:.4} | {} |",
            label, m.precision, m.recall, m.f1, m.support
        );
    }
    md
}

/// Scores the saved model on every row of `data_path` and writes the
/// Markdown report to `output_path`.
pub fn generate_markdown_report(
    model_path: &Path,
    data_path: &Path,
    output_path: &Path,
) -> Result<ClassificationReport, TrainingError> {
    info!(
        "Generating report for model at {} using data from {}...",
        model_path.display(),
        data_path.display()
    );
    let dataset = load_dataset(data_path)?;
    let model = LogisticRegression::load(model_path)?;
    let report = evaluate(&model, &dataset)?;

    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(output_path, render_markdown(model_path, data_path, &report))?;
    info!("Report successfully generated at {}", output_path.display());
    Ok(report)
}
