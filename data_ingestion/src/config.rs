use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;

pub const DEFAULT_CONFIG_PATH: &str = "pipeline.toml";
/// Overrides the location of the TOML file.
pub const CONFIG_PATH_VAR: &str = "PIPELINE_CONFIG";

const ENV_PREFIX: &str = "PIPELINE";
const PROCESSED_STEM: &str = "combined_processed_data";

/// A named dataset version built from one or more raw source directories,
/// e.g. `v0_v1` = `data/v0` + `data/v1`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DatasetConfig {
    pub name: String,
    pub sources: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    pub test_size: f64,
    pub seed: u64,
    pub learning_rate: f64,
    pub max_iter: usize,
    pub tolerance: f64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            test_size: 0.2,
            seed: 42,
            learning_rate: 0.1,
            max_iter: 1000,
            tolerance: 1e-6,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub data_root: PathBuf,
    pub processed_root: PathBuf,
    pub models_root: PathBuf,
    pub report_path: PathBuf,
    pub report_dataset: String,
    pub datasets: Vec<DatasetConfig>,
    pub training: TrainingConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data_root: PathBuf::from("data"),
            processed_root: PathBuf::from("data/processed"),
            models_root: PathBuf::from("models"),
            report_path: PathBuf::from("report.md"),
            report_dataset: "v0_v1".to_string(),
            datasets: vec![
                DatasetConfig {
                    name: "v0".to_string(),
                    sources: vec!["v0".to_string()],
                },
                DatasetConfig {
                    name: "v0_v1".to_string(),
                    sources: vec!["v0".to_string(), "v1".to_string()],
                },
            ],
            training: TrainingConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Loads `.env`, then the TOML file named by `PIPELINE_CONFIG` (or
    /// `pipeline.toml`), then `PIPELINE__*` environment overrides.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        let path =
            std::env::var(CONFIG_PATH_VAR).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::from_file(path)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref().to_string_lossy().into_owned();
        let cfg = Config::builder()
            .add_source(File::new(&path, FileFormat::Toml).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        cfg.try_deserialize()
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let cfg = Config::builder()
            .add_source(File::from_str(raw, FileFormat::Toml))
            .build()?;

        cfg.try_deserialize()
    }

    pub fn dataset(&self, name: &str) -> Option<&DatasetConfig> {
        self.datasets.iter().find(|d| d.name == name)
    }

    /// The dataset named by `report_dataset`, which must be configured.
    pub fn report_target(&self) -> Result<&DatasetConfig, ConfigError> {
        self.dataset(&self.report_dataset).ok_or_else(|| {
            ConfigError::NotFound(format!(
                "report_dataset `{}` is not a configured dataset",
                self.report_dataset
            ))
        })
    }

    pub fn source_dir(&self, source: &str) -> PathBuf {
        self.data_root.join(source)
    }

    pub fn processed_dir(&self, dataset: &str) -> PathBuf {
        self.processed_root.join(dataset)
    }

    pub fn processed_csv(&self, dataset: &str) -> PathBuf {
        self.processed_dir(dataset)
            .join(format!("{PROCESSED_STEM}.csv"))
    }

    pub fn processed_parquet(&self, dataset: &str) -> PathBuf {
        self.processed_dir(dataset)
            .join(format!("{PROCESSED_STEM}.parquet"))
    }

    pub fn feature_view_path(&self, dataset: &str) -> PathBuf {
        self.processed_dir(dataset).join("feature_view.json")
    }

    pub fn model_path(&self, dataset: &str) -> PathBuf {
        self.models_root.join(dataset).join("model.json")
    }
}
