//! Classification metrics for the up/down label.

use ndarray::Array1;
use serde::Serialize;

use crate::error::TrainingError;

/// Confusion matrix for binary classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ConfusionMatrix {
    pub tp: usize,
    pub tn: usize,
    pub fp: usize,
    pub fn_: usize,
}

impl ConfusionMatrix {
    pub fn from_predictions(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Self {
        let mut cm = Self::default();
        for (&t, &p) in y_true.iter().zip(y_pred.iter()) {
            match (t >= 0.5, p >= 0.5) {
                (true, true) => cm.tp += 1,
                (false, false) => cm.tn += 1,
                (false, true) => cm.fp += 1,
                (true, false) => cm.fn_ += 1,
            }
        }
        cm
    }

    pub fn total(&self) -> usize {
        self.tp + self.tn + self.fp + self.fn_
    }
}

fn ratio(num: usize, denom: usize) -> f64 {
    if denom == 0 {
        0.0
    } else {
        num as f64 / denom as f64
    }
}

/// Precision, recall and F1 of one class treated as the positive label.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct ClassMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

impl ClassMetrics {
    fn new(hits: usize, predicted: usize, actual: usize) -> Self {
        let precision = ratio(hits, predicted);
        let recall = ratio(hits, actual);
        let f1 = if precision + recall > 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else {
            0.0
        };
        Self {
            precision,
            recall,
            f1,
            support: actual,
        }
    }
}

/// Accuracy plus per-class and averaged precision/recall/F1.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationReport {
    pub confusion_matrix: ConfusionMatrix,
    pub accuracy: f64,
    /// Index 0 is the "down" class, index 1 the "up" class.
    pub classes: [ClassMetrics; 2],
    pub macro_avg: ClassMetrics,
    pub weighted_avg: ClassMetrics,
}

impl ClassificationReport {
    pub fn from_predictions(
        y_true: &Array1<f64>,
        y_pred: &Array1<f64>,
    ) -> Result<Self, TrainingError> {
        if y_true.len() != y_pred.len() {
            return Err(TrainingError::DimensionMismatch {
                expected: y_true.len(),
                got: y_pred.len(),
            });
        }

        let cm = ConfusionMatrix::from_predictions(y_true, y_pred);
        let down = ClassMetrics::new(cm.tn, cm.tn + cm.fn_, cm.tn + cm.fp);
        let up = ClassMetrics::new(cm.tp, cm.tp + cm.fp, cm.tp + cm.fn_);
        let total = cm.total();

        let macro_avg = ClassMetrics {
            precision: (down.precision + up.precision) / 2.0,
            recall: (down.recall + up.recall) / 2.0,
            f1: (down.f1 + up.f1) / 2.0,
            support: total,
        };
        let weight = |f: fn(&ClassMetrics) -> f64| {
            if total == 0 {
                0.0
            } else {
                (f(&down) * down.support as f64 + f(&up) * up.support as f64) / total as f64
            }
        };
        let weighted_avg = ClassMetrics {
            precision: weight(|m| m.precision),
            recall: weight(|m| m.recall),
            f1: weight(|m| m.f1),
            support: total,
        };

        Ok(Self {
            confusion_matrix: cm,
            accuracy: ratio(cm.tp + cm.tn, total),
            classes: [down, up],
            macro_avg,
            weighted_avg,
        })
    }

    /// `(label, metrics)` rows in display order.
    pub fn rows(&self) -> [(&'static str, ClassMetrics); 4] {
        [
            ("0", self.classes[0]),
            ("1", self.classes[1]),
            ("macro avg", self.macro_avg),
            ("weighted avg", self.weighted_avg),
        ]
    }

    /// Plain-text table for logs.
    pub fn render_text(&self) -> String {
        let mut s = format!(
            "{:>12} {:>9} {:>9} {:>9} {:>9}\n",
            "", "precision", "recall", "f1-score", "support"
        );
        for (label, m) in self.rows() {
            s.push_str(&format!(
                "{:>12} {:>9.4} {:>9.4} {:>9.4} {:>9}\n",
                label, m.precision, m.recall, m.f1, m.support
            ));
        }
        s.push_str(&format!("{:>12} {:>9.4}\n", "accuracy", self.accuracy));
        s
    }
}
