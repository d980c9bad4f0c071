use std::path::Path;

use data_ingestion::TrainingConfig;
use log::info;

use crate::dataset::load_dataset;
use crate::error::TrainingError;
use crate::metrics::ClassificationReport;
use crate::model::LogisticRegression;
use crate::report::evaluate;
use crate::split::stratified_split;

#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    pub model: LogisticRegression,
    pub n_samples: usize,
    pub train_size: usize,
    pub test_size: usize,
    pub report: ClassificationReport,
}

/// Loads the processed table, fits on a stratified training split, scores
/// the held-out rows and saves the model.
pub fn train_and_evaluate_model(
    data_path: &Path,
    model_path: &Path,
    config: &TrainingConfig,
) -> Result<TrainingOutcome, TrainingError> {
    let dataset = load_dataset(data_path)?;
    let (train, test) = stratified_split(&dataset, config.test_size, config.seed)?;
    info!(
        "Split {} rows into {} train / {} test (test_split={}, random_state={})",
        dataset.n_samples(),
        train.n_samples(),
        test.n_samples(),
        config.test_size,
        config.seed
    );

    info!("Training Logistic Regression model...");
    let mut model = LogisticRegression::new(
        dataset.feature_names.clone(),
        config.learning_rate,
        config.max_iter,
        config.tolerance,
    );
    model.fit(&train.x, &train.y)?;

    let report = evaluate(&model, &test)?;
    info!("Model Accuracy: {:.4}", report.accuracy);
    info!("\n{}", report.render_text());

    model.save(model_path)?;

    Ok(TrainingOutcome {
        model,
        n_samples: dataset.n_samples(),
        train_size: train.n_samples(),
        test_size: test.n_samples(),
        report,
    })
}
