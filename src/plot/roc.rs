//! Receiver operating characteristic plot

use std::ops::Add;

use serde::{Deserialize, Serialize};

use super::{binary_target, Axes, Figure, FigureConfig, Plot};
use crate::metrics::{auc, label_binarize, roc_curve, score_columns, unique_labels};
use crate::{Error, Result};

/// ROC curves for one or more classes.
///
/// Binary problems hold a single curve. Multiclass problems hold the
/// micro-average curve followed by one one-vs-rest curve per class, labelled
/// `(class K)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Roc {
    fpr: Vec<Vec<f64>>,
    tpr: Vec<Vec<f64>>,
    labels: Vec<String>,
}

impl Roc {
    /// Build from precomputed curves.
    ///
    /// # Errors
    ///
    /// Returns error if the number of fpr, tpr and label entries differ, or
    /// any curve has mismatched coordinates.
    pub fn new(fpr: Vec<Vec<f64>>, tpr: Vec<Vec<f64>>, labels: Vec<String>) -> Result<Self> {
        if fpr.len() != tpr.len() || fpr.len() != labels.len() {
            return Err(Error::ShapeMismatch {
                expected: format!("{} curves", fpr.len()),
                actual: format!("{} tpr curves and {} labels", tpr.len(), labels.len()),
            });
        }
        if let Some((x, y)) = fpr.iter().zip(&tpr).find(|(x, y)| x.len() != y.len()) {
            return Err(Error::length_mismatch(x.len(), y.len()));
        }
        Ok(Self { fpr, tpr, labels })
    }

    /// Compute curves from labels and a score matrix.
    ///
    /// `y_score` has one column per class (sorted label order). One or two
    /// columns are treated as a binary problem.
    ///
    /// # Errors
    ///
    /// Returns error if the shapes disagree or a class has no positive or no
    /// negative samples.
    pub fn from_raw_data(y_true: &[i64], y_score: &[Vec<f64>]) -> Result<Self> {
        crate::metrics::check_same_length(y_true.len(), y_score.len())?;
        let columns = score_columns(y_score)?;

        if columns.len() == 1 {
            let curve = roc_curve(&binary_target(y_true)?, &columns[0])?;
            return Self::new(vec![curve.x], vec![curve.y], vec!["ROC curve".to_string()]);
        }

        let classes = unique_labels(y_true);
        if classes.len() != columns.len() {
            return Err(Error::ShapeMismatch {
                expected: format!("{} score columns (one per class)", classes.len()),
                actual: format!("{} score columns", columns.len()),
            });
        }
        let binarized = label_binarize(y_true, &classes);

        let flat_truth: Vec<bool> = binarized.iter().flatten().map(|&b| b == 1).collect();
        let flat_score: Vec<f64> = y_score.iter().flatten().copied().collect();
        let micro = roc_curve(&flat_truth, &flat_score)?;

        let mut fpr = vec![micro.x];
        let mut tpr = vec![micro.y];
        let mut labels = vec!["micro-average".to_string()];

        for (i, (class, column)) in classes.iter().zip(&columns).enumerate() {
            let truth: Vec<bool> = binarized.iter().map(|row| row[i] == 1).collect();
            let curve = roc_curve(&truth, column)?;
            fpr.push(curve.x);
            tpr.push(curve.y);
            labels.push(format!("(class {class})"));
        }

        Self::new(fpr, tpr, labels)
    }

    /// False positive rates per curve.
    #[must_use]
    pub fn fpr(&self) -> &[Vec<f64>] {
        &self.fpr
    }

    /// True positive rates per curve.
    #[must_use]
    pub fn tpr(&self) -> &[Vec<f64>] {
        &self.tpr
    }

    /// Curve labels.
    #[must_use]
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Number of curves.
    #[must_use]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Whether there are no curves.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Area under each curve; curves too short to integrate report 0.
    #[must_use]
    pub fn aucs(&self) -> Vec<f64> {
        self.fpr
            .iter()
            .zip(&self.tpr)
            .map(|(x, y)| auc(x, y).unwrap_or(0.0))
            .collect()
    }

    /// A single curve as its own plot.
    ///
    /// # Errors
    ///
    /// Returns error if `index` is out of range.
    pub fn curve(&self, index: usize) -> Result<Self> {
        if index >= self.len() {
            return Err(Error::NotFound(format!(
                "ROC curve {index} (plot has {} curves)",
                self.len()
            )));
        }
        Self::new(
            vec![self.fpr[index].clone()],
            vec![self.tpr[index].clone()],
            vec![self.labels[index].clone()],
        )
    }
}

impl Plot for Roc {
    const CLASS: &'static str = "ROC";

    fn plot_with(&self, config: &FigureConfig) -> Figure {
        let mut axes = Axes::new("ROC")
            .x_label("False Positive Rate")
            .y_label("True Positive Rate")
            .x_range(0.0, 1.0)
            .y_range(0.0, 1.05);
        for (((x, y), label), area) in self.fpr.iter().zip(&self.tpr).zip(&self.labels).zip(self.aucs()) {
            axes.line(x, y, Some(format!("{label} (area = {area:.2})")));
        }
        axes.dashed_line(&[0.0, 1.0], &[0.0, 1.0], None);
        Figure::single(axes, config.clone())
    }
}

/// Overlay the curves of two ROC plots.
impl Add for Roc {
    type Output = Self;

    fn add(mut self, other: Self) -> Self {
        self.fpr.extend(other.fpr);
        self.tpr.extend(other.tpr);
        self.labels.extend(other.labels);
        self
    }
}
