//! Regression diagnostics

use serde::{Deserialize, Serialize};

use super::{Axes, Figure, FigureConfig, Plot};
use crate::metrics::{check_non_empty, check_same_length, r2_score};
use crate::Result;

fn span(values: &[f64]) -> (f64, f64) {
    values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)))
}

/// Predicted versus observed values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionError {
    y_true: Vec<f64>,
    y_pred: Vec<f64>,
}

impl PredictionError {
    /// Store observed and predicted values.
    ///
    /// # Errors
    ///
    /// Returns error if the inputs are empty or differ in length.
    pub fn from_raw_data(y_true: &[f64], y_pred: &[f64]) -> Result<Self> {
        check_non_empty(y_true.len(), "y_true")?;
        check_same_length(y_true.len(), y_pred.len())?;
        Ok(Self {
            y_true: y_true.to_vec(),
            y_pred: y_pred.to_vec(),
        })
    }

    /// Coefficient of determination of the stored predictions.
    #[must_use]
    pub fn r2(&self) -> f64 {
        r2_score(&self.y_true, &self.y_pred).unwrap_or(0.0)
    }
}

impl Plot for PredictionError {
    const CLASS: &'static str = "PredictionError";

    fn plot_with(&self, config: &FigureConfig) -> Figure {
        let (lo, hi) = span(&[self.y_true.as_slice(), self.y_pred.as_slice()].concat());
        let mut axes = Axes::new("Prediction Error")
            .x_label("y_pred")
            .y_label("y_true");
        axes.scatter(&self.y_pred, &self.y_true, Some(format!("R2 = {:.2}", self.r2())));
        axes.dashed_line(&[lo, hi], &[lo, hi], Some("identity".into()));
        Figure::single(axes, config.clone())
    }
}

/// Residuals (`y_true - y_pred`) against predictions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Residuals {
    y_pred: Vec<f64>,
    residuals: Vec<f64>,
}

impl Residuals {
    /// Compute residuals.
    ///
    /// # Errors
    ///
    /// Returns error if the inputs are empty or differ in length.
    pub fn from_raw_data(y_true: &[f64], y_pred: &[f64]) -> Result<Self> {
        check_non_empty(y_true.len(), "y_true")?;
        check_same_length(y_true.len(), y_pred.len())?;
        Ok(Self {
            y_pred: y_pred.to_vec(),
            residuals: y_true.iter().zip(y_pred).map(|(t, p)| t - p).collect(),
        })
    }

    /// Residual per sample.
    #[must_use]
    pub fn residuals(&self) -> &[f64] {
        &self.residuals
    }
}

impl Plot for Residuals {
    const CLASS: &'static str = "Residuals";

    fn plot_with(&self, config: &FigureConfig) -> Figure {
        let (lo, hi) = span(&self.y_pred);
        let mut axes = Axes::new("Residuals Plot")
            .x_label("Predicted Value")
            .y_label("Residuals");
        axes.scatter(&self.y_pred, &self.residuals, None);
        axes.dashed_line(&[lo, hi], &[0.0, 0.0], None);
        Figure::single(axes, config.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_residuals() {
        let r = Residuals::from_raw_data(&[1.0, 2.0], &[0.5, 2.5]).unwrap();
        assert_eq!(r.residuals(), &[0.5, -0.5]);
        assert!(r.plot().to_svg().contains("<circle"));
    }

    #[test]
    fn test_prediction_error_r2() {
        let p = PredictionError::from_raw_data(&[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0]).unwrap();
        assert!((p.r2() - 1.0).abs() < 1e-12);
        assert!(p.plot().to_svg().contains("R2 = 1.00"));
    }
}
