//! Calibration (reliability) curves

use serde::{Deserialize, Serialize};

use super::{binary_target, Axes, Figure, FigureConfig, Plot};
use crate::metrics::{calibration_curve, score_columns, DEFAULT_N_BINS};
use crate::{Error, Result};

/// Reliability curves for one or more models on binary targets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationCurve {
    prob_true: Vec<Vec<f64>>,
    prob_pred: Vec<Vec<f64>>,
    labels: Vec<String>,
    n_bins: usize,
}

impl CalibrationCurve {
    /// Compute one curve per `(y_true, y_prob)` pair.
    ///
    /// Each `y_prob` is a score matrix with one or two columns; the
    /// positive-class probability is used. `labels` default to
    /// `Classifier 1`, `Classifier 2`, ...
    ///
    /// # Errors
    ///
    /// Returns error if the lists differ in length, a target is not binary,
    /// or probabilities fall outside `[0, 1]`.
    pub fn from_raw_data(
        y_true: &[&[i64]],
        y_prob: &[&[Vec<f64>]],
        labels: Option<Vec<String>>,
        n_bins: usize,
    ) -> Result<Self> {
        crate::metrics::check_non_empty(y_true.len(), "y_true")?;
        crate::metrics::check_same_length(y_true.len(), y_prob.len())?;
        let labels = match labels {
            Some(labels) => {
                crate::metrics::check_same_length(y_true.len(), labels.len())?;
                labels
            }
            None => (1..=y_true.len()).map(|i| format!("Classifier {i}")).collect(),
        };

        let mut curve = Self {
            prob_true: Vec::with_capacity(y_true.len()),
            prob_pred: Vec::with_capacity(y_true.len()),
            labels,
            n_bins,
        };
        for (truth, prob) in y_true.iter().zip(y_prob) {
            crate::metrics::check_same_length(truth.len(), prob.len())?;
            let columns = score_columns(prob)?;
            if columns.len() != 1 {
                return Err(Error::invalid(format!(
                    "calibration curves need binary probabilities, got {} columns",
                    columns.len()
                )));
            }
            let (prob_true, prob_pred) =
                calibration_curve(&binary_target(truth)?, &columns[0], n_bins)?;
            curve.prob_true.push(prob_true);
            curve.prob_pred.push(prob_pred);
        }
        Ok(curve)
    }

    /// Single model with the default number of bins.
    ///
    /// # Errors
    ///
    /// Same conditions as [`CalibrationCurve::from_raw_data`].
    pub fn single(y_true: &[i64], y_prob: &[Vec<f64>]) -> Result<Self> {
        Self::from_raw_data(&[y_true], &[y_prob], None, DEFAULT_N_BINS)
    }

    /// Observed fraction of positives per bin, per model.
    #[must_use]
    pub fn prob_true(&self) -> &[Vec<f64>] {
        &self.prob_true
    }

    /// Mean predicted probability per bin, per model.
    #[must_use]
    pub fn prob_pred(&self) -> &[Vec<f64>] {
        &self.prob_pred
    }

    /// Model labels.
    #[must_use]
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Number of bins.
    #[must_use]
    pub const fn n_bins(&self) -> usize {
        self.n_bins
    }
}

impl Plot for CalibrationCurve {
    const CLASS: &'static str = "CalibrationCurve";

    fn plot_with(&self, config: &FigureConfig) -> Figure {
        let mut axes = Axes::new("Calibration plots (reliability curve)")
            .x_label("Mean predicted value")
            .y_label("Fraction of positives")
            .x_range(0.0, 1.0)
            .y_range(-0.05, 1.05);
        axes.dashed_line(&[0.0, 1.0], &[0.0, 1.0], Some("Perfectly calibrated".into()));
        for ((pred, truth), label) in self.prob_pred.iter().zip(&self.prob_true).zip(&self.labels) {
            axes.line(pred, truth, Some(label.clone()));
        }
        Figure::single(axes, config.clone())
    }
}
