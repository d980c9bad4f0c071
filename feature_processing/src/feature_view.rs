//! Feature-store registration for the processed Parquet table.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::FeatureError;

const SEVEN_DAYS_SECS: u64 = 7 * 24 * 60 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueType {
    String,
    Float64,
    Int64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub name: String,
    pub join_keys: Vec<String>,
    pub value_type: ValueType,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureField {
    pub name: String,
    pub dtype: ValueType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileSource {
    pub path: String,
    pub timestamp_field: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureView {
    pub name: String,
    pub entities: Vec<Entity>,
    pub ttl_secs: u64,
    pub schema: Vec<FeatureField>,
    pub source: FileSource,
}

impl FeatureView {
    /// View over `rolling_avg_10`, `volume_sum_10` and `target`, keyed by
    /// `stock`.
    pub fn stock_technical_features(source_path: &Path) -> Self {
        let field = |name: &str, dtype| FeatureField {
            name: name.to_string(),
            dtype,
        };

        Self {
            name: "stock_technical_features".to_string(),
            entities: vec![Entity {
                name: "stock".to_string(),
                join_keys: vec!["stock".to_string()],
                value_type: ValueType::String,
                description: "NSE stock ticker symbol".to_string(),
            }],
            ttl_secs: SEVEN_DAYS_SECS,
            schema: vec![
                field("rolling_avg_10", ValueType::Float64),
                field("volume_sum_10", ValueType::Float64),
                field("target", ValueType::Int64),
            ],
            source: FileSource {
                path: source_path.to_string_lossy().into_owned(),
                timestamp_field: "timestamp".to_string(),
            },
        }
    }

    pub fn write(&self, path: &Path) -> Result<(), FeatureError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}
