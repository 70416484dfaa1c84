//! Confusion matrix plots

use std::ops::{Add, Sub};

use serde::{Deserialize, Serialize};

use super::{class_names, Axes, Figure, FigureConfig, Plot};
use crate::metrics::{confusion_matrix, normalize_rows};
use crate::{Error, Result};

/// Confusion matrix with optional row normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    labels: Vec<i64>,
    target_names: Vec<String>,
    cm: Vec<Vec<u64>>,
    normalize: bool,
}

impl ConfusionMatrix {
    /// Compute from true and predicted labels.
    ///
    /// # Errors
    ///
    /// Returns error if the inputs are empty or differ in length.
    pub fn from_raw_data(y_true: &[i64], y_pred: &[i64]) -> Result<Self> {
        let (labels, cm) = confusion_matrix(y_true, y_pred)?;
        let target_names = class_names(&labels, None)?;
        Ok(Self {
            labels,
            target_names,
            cm,
            normalize: false,
        })
    }

    /// Replace the displayed class names.
    ///
    /// # Errors
    ///
    /// Returns error if the number of names differs from the number of labels.
    pub fn with_target_names(mut self, names: &[String]) -> Result<Self> {
        self.target_names = class_names(&self.labels, Some(names))?;
        Ok(self)
    }

    /// A copy that displays row-normalized values.
    #[must_use]
    pub fn normalized(&self) -> Self {
        Self {
            normalize: true,
            ..self.clone()
        }
    }

    /// Class labels, in row/column order.
    #[must_use]
    pub fn labels(&self) -> &[i64] {
        &self.labels
    }

    /// Displayed class names.
    #[must_use]
    pub fn target_names(&self) -> &[String] {
        &self.target_names
    }

    /// Raw counts; rows are true labels, columns predicted labels.
    #[must_use]
    pub fn counts(&self) -> &[Vec<u64>] {
        &self.cm
    }

    /// Whether values are displayed row-normalized.
    #[must_use]
    pub const fn is_normalized(&self) -> bool {
        self.normalize
    }

    /// Displayed values: counts, or row fractions when normalized.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn values(&self) -> Vec<Vec<f64>> {
        if self.normalize {
            normalize_rows(&self.cm)
        } else {
            self.cm
                .iter()
                .map(|row| row.iter().map(|&v| v as f64).collect())
                .collect()
        }
    }

    fn annotations(&self) -> Vec<Vec<String>> {
        if self.normalize {
            format_matrix(&self.values())
        } else {
            self.cm
                .iter()
                .map(|row| row.iter().map(ToString::to_string).collect())
                .collect()
        }
    }

    fn axes(&self, title: &str) -> Axes {
        let mut axes = Axes::new(title)
            .x_label("Predicted label")
            .y_label("True label");
        axes.heatmap(
            self.target_names.clone(),
            self.target_names.clone(),
            self.values(),
            self.annotations(),
        );
        axes
    }

    fn check_compatible(&self, other: &Self) -> Result<()> {
        if self.labels != other.labels {
            return Err(Error::ShapeMismatch {
                expected: format!("labels {:?}", self.labels),
                actual: format!("labels {:?}", other.labels),
            });
        }
        Ok(())
    }
}

fn format_matrix(values: &[Vec<f64>]) -> Vec<Vec<String>> {
    values
        .iter()
        .map(|row| row.iter().map(|v| format!("{v:.2}")).collect())
        .collect()
}

impl Plot for ConfusionMatrix {
    const CLASS: &'static str = "ConfusionMatrix";

    fn plot_with(&self, config: &FigureConfig) -> Figure {
        let title = if self.normalize {
            "Confusion matrix (normalized)"
        } else {
            "Confusion matrix"
        };
        Figure::single(self.axes(title), config.clone())
    }
}

/// Two confusion matrices shown side by side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfusionMatrixComparison {
    a: ConfusionMatrix,
    b: ConfusionMatrix,
}

impl ConfusionMatrixComparison {
    /// Left matrix.
    #[must_use]
    pub const fn first(&self) -> &ConfusionMatrix {
        &self.a
    }

    /// Right matrix.
    #[must_use]
    pub const fn second(&self) -> &ConfusionMatrix {
        &self.b
    }
}

impl Plot for ConfusionMatrixComparison {
    const CLASS: &'static str = "ConfusionMatrixAdd";

    fn plot_with(&self, config: &FigureConfig) -> Figure {
        let config = config.clone().width(config.get_width() * 2);
        Figure::row(vec![self.a.axes("First model"), self.b.axes("Second model")], config)
    }
}

/// Element-wise difference of two confusion matrices (first minus second).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfusionMatrixDiff {
    target_names: Vec<String>,
    diff: Vec<Vec<f64>>,
}

impl ConfusionMatrixDiff {
    /// Difference values.
    #[must_use]
    pub fn values(&self) -> &[Vec<f64>] {
        &self.diff
    }
}

impl Plot for ConfusionMatrixDiff {
    const CLASS: &'static str = "ConfusionMatrixSub";

    fn plot_with(&self, config: &FigureConfig) -> Figure {
        let mut axes = Axes::new("Confusion matrix difference")
            .x_label("Predicted label")
            .y_label("True label");
        axes.heatmap(
            self.target_names.clone(),
            self.target_names.clone(),
            self.diff.clone(),
            format_matrix(&self.diff),
        );
        Figure::single(axes, config.clone())
    }
}

/// Side-by-side comparison; both matrices must share labels.
impl Add for ConfusionMatrix {
    type Output = Result<ConfusionMatrixComparison>;

    fn add(self, other: Self) -> Self::Output {
        self.check_compatible(&other)?;
        Ok(ConfusionMatrixComparison { a: self, b: other })
    }
}

/// Difference of displayed values; both matrices must share labels.
impl Sub for ConfusionMatrix {
    type Output = Result<ConfusionMatrixDiff>;

    fn sub(self, other: Self) -> Self::Output {
        self.check_compatible(&other)?;
        let diff = self
            .values()
            .iter()
            .zip(other.values())
            .map(|(a, b)| a.iter().zip(b).map(|(x, y)| x - y).collect())
            .collect();
        Ok(ConfusionMatrixDiff {
            target_names: self.target_names,
            diff,
        })
    }
}
