pub mod dataset;
pub mod error;
pub mod metrics;
pub mod model;
pub mod report;
pub mod split;
pub mod train;

pub use dataset::{Dataset, load_dataset};
pub use error::TrainingError;
pub use metrics::{ClassMetrics, ClassificationReport, ConfusionMatrix};
pub use model::{Classifier, LogisticRegression};
pub use report::{evaluate, generate_markdown_report};
pub use train::{TrainingOutcome, train_and_evaluate_model};
