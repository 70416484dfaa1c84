//! Cumulative gain chart

use serde::{Deserialize, Serialize};

use super::{binary_target, Axes, Figure, FigureConfig, Plot};
use crate::metrics::{cumulative_gain, score_columns};
use crate::{Error, Result};

/// Share of positives captured when targeting the highest-scored samples first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CumulativeGain {
    percentages: Vec<f64>,
    gains: Vec<f64>,
}

impl CumulativeGain {
    /// Compute from binary labels and a one- or two-column score matrix.
    ///
    /// # Errors
    ///
    /// Returns error if the target is not binary, has no positives, or the
    /// scores are not binary.
    pub fn from_raw_data(y_true: &[i64], y_score: &[Vec<f64>]) -> Result<Self> {
        crate::metrics::check_same_length(y_true.len(), y_score.len())?;
        let columns = score_columns(y_score)?;
        if columns.len() != 1 {
            return Err(Error::invalid(format!(
                "cumulative gain needs binary scores, got {} columns",
                columns.len()
            )));
        }
        let curve = cumulative_gain(&binary_target(y_true)?, &columns[0])?;
        Ok(Self {
            percentages: curve.x,
            gains: curve.y,
        })
    }

    /// Fraction of samples targeted.
    #[must_use]
    pub fn percentages(&self) -> &[f64] {
        &self.percentages
    }

    /// Fraction of positives captured.
    #[must_use]
    pub fn gains(&self) -> &[f64] {
        &self.gains
    }
}

impl Plot for CumulativeGain {
    const CLASS: &'static str = "CumulativeGain";

    fn plot_with(&self, config: &FigureConfig) -> Figure {
        let mut axes = Axes::new("Cumulative Gains Curve")
            .x_label("Percentage of sample")
            .y_label("Gain")
            .x_range(0.0, 1.0)
            .y_range(0.0, 1.05);
        axes.line(&self.percentages, &self.gains, Some("Positive class".into()));
        axes.dashed_line(&[0.0, 1.0], &[0.0, 1.0], Some("Baseline".into()));
        Figure::single(axes, config.clone())
    }
}
