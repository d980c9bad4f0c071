//! Logistic regression for the up/down label.

use std::fs;
use std::path::Path;

use log::{debug, info};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

use crate::error::TrainingError;

/// Anything that maps a feature matrix to 0/1 labels.
pub trait Classifier {
    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>, TrainingError>;
}

/// Column-wise standardisation fitted on the training split.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub means: Vec<f64>,
    pub stds: Vec<f64>,
}

impl StandardScaler {
    pub fn fit(x: &Array2<f64>) -> Result<Self, TrainingError> {
        let means = x.mean_axis(Axis(0)).ok_or(TrainingError::EmptyDataset)?;
        let stds = x.std_axis(Axis(0), 0.0);
        Ok(Self {
            means: means.to_vec(),
            stds: stds.to_vec(),
        })
    }

    pub fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>, TrainingError> {
        if x.ncols() != self.means.len() {
            return Err(TrainingError::DimensionMismatch {
                expected: self.means.len(),
                got: x.ncols(),
            });
        }
        Ok(Array2::from_shape_fn(x.raw_dim(), |(i, j)| {
            let centered = x[[i, j]] - self.means[j];
            if self.stds[j] > 1e-12 {
                centered / self.stds[j]
            } else {
                0.0
            }
        }))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticRegression {
    pub feature_names: Vec<String>,
    learning_rate: f64,
    max_iter: usize,
    tolerance: f64,
    scaler: Option<StandardScaler>,
    coefficients: Option<Vec<f64>>,
    intercept: Option<f64>,
    /// Log loss per iteration of the last fit.
    #[serde(skip)]
    pub cost_history: Vec<f64>,
}

impl LogisticRegression {
    pub fn new(
        feature_names: Vec<String>,
        learning_rate: f64,
        max_iter: usize,
        tolerance: f64,
    ) -> Self {
        Self {
            feature_names,
            learning_rate,
            max_iter,
            tolerance,
            scaler: None,
            coefficients: None,
            intercept: None,
            cost_history: Vec::new(),
        }
    }

    pub fn is_fitted(&self) -> bool {
        self.coefficients.is_some()
    }

    pub fn coefficients(&self) -> Option<&[f64]> {
        self.coefficients.as_deref()
    }

    pub fn intercept(&self) -> Option<f64> {
        self.intercept
    }

    fn sigmoid(z: f64) -> f64 {
        if z >= 0.0 {
            1.0 / (1.0 + (-z).exp())
        } else {
            let exp_z = z.exp();
            exp_z / (1.0 + exp_z)
        }
    }

    fn log_loss(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> f64 {
        let eps = 1e-15;
        let n = y_true.len() as f64;

        -y_true
            .iter()
            .zip(y_pred.iter())
            .map(|(&y, &p)| {
                let p = p.clamp(eps, 1.0 - eps);
                y * p.ln() + (1.0 - y) * (1.0 - p).ln()
            })
            .sum::<f64>()
            / n
    }

    /// Batch gradient descent on standardised features.
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<(), TrainingError> {
        if x.nrows() != y.len() {
            return Err(TrainingError::DimensionMismatch {
                expected: x.nrows(),
                got: y.len(),
            });
        }
        if x.ncols() != self.feature_names.len() {
            return Err(TrainingError::DimensionMismatch {
                expected: self.feature_names.len(),
                got: x.ncols(),
            });
        }
        if x.nrows() == 0 {
            return Err(TrainingError::EmptyDataset);
        }

        let scaler = StandardScaler::fit(x)?;
        let x = scaler.transform(x)?;
        let n_samples = x.nrows() as f64;

        let mut weights = Array1::<f64>::zeros(x.ncols());
        let mut bias = 0.0;
        self.cost_history.clear();

        for iter in 0..self.max_iter {
            let predictions = (x.dot(&weights) + bias).mapv(Self::sigmoid);

            let errors = &predictions - y;
            let dw = x.t().dot(&errors) / n_samples;
            let db = errors.sum() / n_samples;

            weights = &weights - &(&dw * self.learning_rate);
            bias -= self.learning_rate * db;

            let cost = Self::log_loss(y, &predictions);
            self.cost_history.push(cost);

            if iter > 0 && (self.cost_history[iter - 1] - cost).abs() < self.tolerance {
                debug!("Converged at iteration {}", iter);
                break;
            }
        }

        info!(
            "Fitted logistic regression in {} iterations, final log loss {:.6}",
            self.cost_history.len(),
            self.cost_history.last().copied().unwrap_or_default()
        );
        self.scaler = Some(scaler);
        self.coefficients = Some(weights.to_vec());
        self.intercept = Some(bias);
        Ok(())
    }

    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>, TrainingError> {
        let (Some(scaler), Some(weights), Some(bias)) =
            (&self.scaler, &self.coefficients, self.intercept)
        else {
            return Err(TrainingError::NotFitted);
        };

        let x = scaler.transform(x)?;
        let weights = Array1::from_vec(weights.clone());
        Ok((x.dot(&weights) + bias).mapv(Self::sigmoid))
    }

    pub fn save(&self, path: &Path) -> Result<(), TrainingError> {
        if !self.is_fitted() {
            return Err(TrainingError::NotFitted);
        }
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        info!("Model saved to {}", path.display());
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self, TrainingError> {
        let raw = fs::read_to_string(path)?;
        let model: Self = serde_json::from_str(&raw)?;
        if !model.is_fitted() {
            return Err(TrainingError::NotFitted);
        }
        Ok(model)
    }
}

impl Classifier for LogisticRegression {
    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>, TrainingError> {
        let proba = self.predict_proba(x)?;
        Ok(proba.mapv(|p| if p >= 0.5 { 1.0 } else { 0.0 }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use tempfile::tempdir;

    fn names() -> Vec<String> {
        vec!["rolling_avg_10".into(), "volume_sum_10".into()]
    }

    /// Price-like first feature, volume-like second; the label follows the
    /// first feature.
    fn separable() -> (Array2<f64>, Array1<f64>) {
        let x = Array2::from_shape_vec(
            (8, 2),
            vec![
                100.0, 10_000.0, 100.5, 12_000.0, 101.0, 11_000.0, 101.5, 9_000.0, 105.0,
                10_500.0, 105.5, 11_500.0, 106.0, 9_500.0, 106.5, 12_500.0,
            ],
        )
        .unwrap();
        let y = Array1::from_vec(vec![0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0]);
        (x, y)
    }

    #[test]
    fn test_sigmoid() {
        assert_relative_eq!(LogisticRegression::sigmoid(0.0), 0.5, epsilon = 1e-12);
        assert!(LogisticRegression::sigmoid(100.0) > 0.99);
        assert!(LogisticRegression::sigmoid(-100.0) < 0.01);
    }

    #[test]
    fn test_scaler_standardises_columns() {
        let (x, _) = separable();
        let scaler = StandardScaler::fit(&x).unwrap();
        let scaled = scaler.transform(&x).unwrap();
        for column in scaled.columns() {
            assert_relative_eq!(column.mean().unwrap(), 0.0, epsilon = 1e-9);
            assert_relative_eq!(column.std(0.0), 1.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_constant_column_maps_to_zero() {
        let x = Array2::from_shape_vec((3, 1), vec![5.0, 5.0, 5.0]).unwrap();
        let scaler = StandardScaler::fit(&x).unwrap();
        assert!(scaler.transform(&x).unwrap().iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_fit_separates_classes() {
        let (x, y) = separable();
        let mut model = LogisticRegression::new(names(), 0.5, 2000, 1e-9);
        model.fit(&x, &y).unwrap();

        let predictions = model.predict(&x).unwrap();
        assert_eq!(predictions, y);
        assert!(model.coefficients().unwrap()[0] > 0.0);
        let history = &model.cost_history;
        assert!(history.last().unwrap() < history.first().unwrap());
    }

    #[test]
    fn test_predictions_are_binary() {
        let (x, y) = separable();
        let mut model = LogisticRegression::new(names(), 0.1, 100, 1e-6);
        model.fit(&x, &y).unwrap();
        let dummy = Array2::from_shape_vec((2, 2), vec![100.0, 10_000.0, 101.0, 10_500.0]).unwrap();
        let predictions = model.predict(&dummy).unwrap();
        assert_eq!(predictions.len(), 2);
        assert!(predictions.iter().all(|p| *p == 0.0 || *p == 1.0));
    }

    #[test]
    fn test_unfitted_model_refuses_to_predict() {
        let model = LogisticRegression::new(names(), 0.1, 10, 1e-6);
        let (x, _) = separable();
        assert!(matches!(model.predict(&x), Err(TrainingError::NotFitted)));
    }

    #[test]
    fn test_fit_rejects_mismatched_shapes() {
        let (x, _) = separable();
        let mut model = LogisticRegression::new(names(), 0.1, 10, 1e-6);
        let y = Array1::zeros(3);
        assert!(matches!(
            model.fit(&x, &y),
            Err(TrainingError::DimensionMismatch { expected: 8, got: 3 })
        ));
    }

    #[test]
    fn test_save_and_load() {
        let (x, y) = separable();
        let mut model = LogisticRegression::new(names(), 0.5, 500, 1e-9);
        model.fit(&x, &y).unwrap();

        let dir = tempdir().unwrap();
        let path = dir.path().join("models/v0/model.json");
        model.save(&path).unwrap();
        let loaded = LogisticRegression::load(&path).unwrap();

        assert_eq!(loaded.feature_names, model.feature_names);
        assert_eq!(loaded.coefficients(), model.coefficients());
        assert_eq!(loaded.predict(&x).unwrap(), model.predict(&x).unwrap());
    }

    #[test]
    fn test_reloaded_parameters_are_bit_identical() {
        let mut model = LogisticRegression::new(names(), 0.1, 10, 1e-6);
        model.scaler = Some(StandardScaler {
            means: vec![10_000.0 * (0.1 + 0.2), 12_345.678_901_234_567],
            stds: vec![1e4 / 3.0, 7.0 / 11.0],
        });
        model.coefficients = Some(vec![0.1 + 0.2, 0.217_702_443_474_849_35]);
        model.intercept = Some(-2.0 / 7.0);

        let dir = tempdir().unwrap();
        let path = dir.path().join("model.json");
        model.save(&path).unwrap();
        let loaded = LogisticRegression::load(&path).unwrap();

        let bits = |values: &[f64]| values.iter().map(|v| v.to_bits()).collect::<Vec<_>>();
        let (saved, reloaded) = (model.scaler.unwrap(), loaded.scaler.clone().unwrap());
        assert_eq!(bits(&reloaded.means), bits(&saved.means));
        assert_eq!(bits(&reloaded.stds), bits(&saved.stds));
        assert_eq!(
            bits(loaded.coefficients().unwrap()),
            bits(model.coefficients.as_deref().unwrap())
        );
        assert_eq!(
            loaded.intercept().map(f64::to_bits),
            model.intercept.map(f64::to_bits)
        );
    }
}
