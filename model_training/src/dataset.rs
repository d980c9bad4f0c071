//! Loads the processed feature table into a training matrix.

use std::fs::File;
use std::path::Path;

use log::{debug, info};
use ndarray::{Array1, Array2, Axis};
use polars::prelude::*;

use crate::error::TrainingError;

pub const FEATURE_COLUMNS: [&str; 2] = ["rolling_avg_10", "volume_sum_10"];
pub const TARGET_COLUMN: &str = "target";

/// Feature matrix (`n_samples x n_features`) and 0/1 labels.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub x: Array2<f64>,
    pub y: Array1<f64>,
    pub feature_names: Vec<String>,
}

impl Dataset {
    pub fn new(x: Array2<f64>, y: Array1<f64>, feature_names: Vec<String>) -> Self {
        Self {
            x,
            y,
            feature_names,
        }
    }

    pub fn n_samples(&self) -> usize {
        self.x.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.x.ncols()
    }

    pub fn is_empty(&self) -> bool {
        self.n_samples() == 0
    }

    /// Rows at `indices`, in that order.
    pub fn select(&self, indices: &[usize]) -> Self {
        Self {
            x: self.x.select(Axis(0), indices),
            y: self.y.select(Axis(0), indices),
            feature_names: self.feature_names.clone(),
        }
    }

    /// `(negatives, positives)`
    pub fn class_counts(&self) -> (usize, usize) {
        let positives = self.y.iter().filter(|&&label| label >= 0.5).count();
        (self.n_samples() - positives, positives)
    }

    /// Extracts the feature and target columns, dropping rows where any of
    /// them is null or not finite.
    pub fn from_frame(df: &DataFrame) -> Result<Self, TrainingError> {
        let features = FEATURE_COLUMNS
            .iter()
            .map(|name| float_column(df, name))
            .collect::<Result<Vec<_>, _>>()?;
        let target = float_column(df, TARGET_COLUMN)?;

        let mut flat = Vec::with_capacity(target.len() * FEATURE_COLUMNS.len());
        let mut labels = Vec::with_capacity(target.len());
        for (row, label) in target.iter().enumerate() {
            let values: Option<Vec<f64>> = features
                .iter()
                .map(|column| column[row].filter(|v| v.is_finite()))
                .collect();
            match (values, label.filter(|v| v.is_finite())) {
                (Some(values), Some(label)) => {
                    flat.extend(values);
                    labels.push(label);
                }
                _ => debug!("Dropping row {row} with missing feature or target"),
            }
        }

        let x = Array2::from_shape_vec((labels.len(), FEATURE_COLUMNS.len()), flat)?;
        let names = FEATURE_COLUMNS.iter().map(|s| s.to_string()).collect();
        Ok(Self::new(x, Array1::from_vec(labels), names))
    }
}

fn float_column(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>, TrainingError> {
    let series = df
        .column(name)
        .map_err(|_| TrainingError::MissingColumn(name.to_string()))?;
    let values = series.cast(&DataType::Float64)?;
    let values = values.f64()?.into_iter().collect();
    Ok(values)
}

/// Reads a CSV or Parquet feature table, chosen by file extension.
pub fn load_training_frame(path: &Path) -> Result<DataFrame, TrainingError> {
    let extension = path
        .extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    let file = File::open(path)?;

    let df = match extension.as_str() {
        "csv" => CsvReader::new(file)
            .infer_schema(Some(1024))
            .has_header(true)
            .finish()?,
        "parquet" => ParquetReader::new(file).finish()?,
        _ => return Err(TrainingError::UnsupportedFormat(path.display().to_string())),
    };
    Ok(df)
}

pub fn load_dataset(path: &Path) -> Result<Dataset, TrainingError> {
    info!("Loading data from {}...", path.display());
    let df = load_training_frame(path)?;
    let dataset = Dataset::from_frame(&df)?;
    if dataset.is_empty() {
        return Err(TrainingError::EmptyDataset);
    }
    info!(
        "Loaded {} rows ({} dropped)",
        dataset.n_samples(),
        df.height() - dataset.n_samples()
    );
    Ok(dataset)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame() -> DataFrame {
        DataFrame::new(vec![
            Series::new("rolling_avg_10", &[Some(100.0), None, Some(102.0), Some(f64::NAN)]),
            Series::new("volume_sum_10", &[Some(1e4), Some(2e4), Some(3e4), Some(4e4)]),
            Series::new("target", &[Some(1i64), Some(0), Some(0), Some(1)]),
            Series::new("stock", &["ACC", "ACC", "TCS", "TCS"]),
        ])
        .unwrap()
    }

    #[test]
    fn test_from_frame_drops_incomplete_rows() {
        let dataset = Dataset::from_frame(&frame()).unwrap();
        assert_eq!(dataset.n_samples(), 2);
        assert_eq!(dataset.n_features(), 2);
        assert_eq!(dataset.x.row(1).to_vec(), vec![102.0, 3e4]);
        assert_eq!(dataset.y.to_vec(), vec![1.0, 0.0]);
        assert_eq!(dataset.class_counts(), (1, 1));
    }

    #[test]
    fn test_missing_feature_column() {
        let df = frame().drop("volume_sum_10").unwrap();
        let err = Dataset::from_frame(&df).unwrap_err();
        assert!(matches!(err, TrainingError::MissingColumn(ref c) if c == "volume_sum_10"));
    }

    #[test]
    fn test_select_rows() {
        let dataset = Dataset::from_frame(&frame()).unwrap();
        let picked = dataset.select(&[1]);
        assert_eq!(picked.n_samples(), 1);
        assert_eq!(picked.y[0], 0.0);
    }

    #[test]
    fn test_unsupported_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("table.json");
        std::fs::write(&path, "{}").unwrap();
        assert!(matches!(
            load_training_frame(&path),
            Err(TrainingError::UnsupportedFormat(_))
        ));
    }
}
