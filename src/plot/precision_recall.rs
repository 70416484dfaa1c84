//! Precision-recall plot

use serde::{Deserialize, Serialize};

use super::{binary_target, Axes, Figure, FigureConfig, Plot};
use crate::metrics::{
    average_precision, label_binarize, precision_recall_curve, score_columns, unique_labels,
};
use crate::{Error, Result};

/// Precision-recall curves with their average precision.
///
/// Multiclass problems hold the micro-average curve first, then one curve
/// per class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrecisionRecall {
    precision: Vec<Vec<f64>>,
    recall: Vec<Vec<f64>>,
    average_precision: Vec<f64>,
    labels: Vec<String>,
}

impl PrecisionRecall {
    /// Compute curves from labels and a score matrix.
    ///
    /// # Errors
    ///
    /// Returns error if the shapes disagree or a class has no positives.
    pub fn from_raw_data(y_true: &[i64], y_score: &[Vec<f64>]) -> Result<Self> {
        crate::metrics::check_same_length(y_true.len(), y_score.len())?;
        let columns = score_columns(y_score)?;
        let mut pr = Self {
            precision: Vec::new(),
            recall: Vec::new(),
            average_precision: Vec::new(),
            labels: Vec::new(),
        };

        if columns.len() == 1 {
            pr.push(&binary_target(y_true)?, &columns[0], "Precision-Recall curve".into())?;
            return Ok(pr);
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
        pr.push(&flat_truth, &flat_score, "micro-average".into())?;

        for (i, (class, column)) in classes.iter().zip(&columns).enumerate() {
            let truth: Vec<bool> = binarized.iter().map(|row| row[i] == 1).collect();
            pr.push(&truth, column, format!("(class {class})"))?;
        }
        Ok(pr)
    }

    fn push(&mut self, truth: &[bool], score: &[f64], label: String) -> Result<()> {
        let curve = precision_recall_curve(truth, score)?;
        self.average_precision.push(average_precision(truth, score)?);
        self.recall.push(curve.x);
        self.precision.push(curve.y);
        self.labels.push(label);
        Ok(())
    }

    /// Precision per curve.
    #[must_use]
    pub fn precision(&self) -> &[Vec<f64>] {
        &self.precision
    }

    /// Recall per curve.
    #[must_use]
    pub fn recall(&self) -> &[Vec<f64>] {
        &self.recall
    }

    /// Average precision per curve.
    #[must_use]
    pub fn average_precision(&self) -> &[f64] {
        &self.average_precision
    }

    /// Curve labels.
    #[must_use]
    pub fn labels(&self) -> &[String] {
        &self.labels
    }
}

impl Plot for PrecisionRecall {
    const CLASS: &'static str = "PrecisionRecall";

    fn plot_with(&self, config: &FigureConfig) -> Figure {
        let mut axes = Axes::new("Precision-Recall")
            .x_label("Recall")
            .y_label("Precision")
            .x_range(0.0, 1.0)
            .y_range(0.0, 1.05);
        for (((recall, precision), label), ap) in self
            .recall
            .iter()
            .zip(&self.precision)
            .zip(&self.labels)
            .zip(&self.average_precision)
        {
            axes.line(recall, precision, Some(format!("{label} (AP = {ap:.2})")));
        }
        Figure::single(axes, config.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binary_single_column() {
        let pr = PrecisionRecall::from_raw_data(&[0, 0, 1, 1], &[
            vec![0.1],
            vec![0.4],
            vec![0.35],
            vec![0.8],
        ])
        .unwrap();
        assert_eq!(pr.labels().len(), 1);
        assert!((pr.average_precision()[0] - (1.0 / 3.0 + 0.5)).abs() < 1e-12);
    }

    #[test]
    fn test_multiclass_curves() {
        let y = [0, 1, 2];
        let score = vec![vec![0.7, 0.2, 0.1], vec![0.2, 0.7, 0.1], vec![0.1, 0.2, 0.7]];
        let pr = PrecisionRecall::from_raw_data(&y, &score).unwrap();
        assert_eq!(pr.labels().len(), 4);
        assert!(pr.average_precision().iter().all(|&ap| (ap - 1.0).abs() < 1e-12));
    }
}
