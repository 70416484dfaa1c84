//! Regression error metrics

use super::classification::{check_non_empty, check_same_length};
use crate::Result;

fn check(y_true: &[f64], y_pred: &[f64]) -> Result<()> {
    check_non_empty(y_true.len(), "y_true")?;
    check_same_length(y_true.len(), y_pred.len())
}

/// Mean absolute error.
///
/// # Errors
///
/// Returns error if the inputs are empty or differ in length.
#[allow(clippy::cast_precision_loss)]
pub fn mean_absolute_error(y_true: &[f64], y_pred: &[f64]) -> Result<f64> {
    check(y_true, y_pred)?;
    let total: f64 = y_true.iter().zip(y_pred).map(|(t, p)| (t - p).abs()).sum();
    Ok(total / y_true.len() as f64)
}

/// Mean squared error.
///
/// # Errors
///
/// Returns error if the inputs are empty or differ in length.
#[allow(clippy::cast_precision_loss)]
pub fn mean_squared_error(y_true: &[f64], y_pred: &[f64]) -> Result<f64> {
    check(y_true, y_pred)?;
    let total: f64 = y_true.iter().zip(y_pred).map(|(t, p)| (t - p).powi(2)).sum();
    Ok(total / y_true.len() as f64)
}

/// Coefficient of determination.
///
/// A constant target scores 1.0 when predicted perfectly and 0.0 otherwise.
///
/// # Errors
///
/// Returns error if the inputs are empty or differ in length.
#[allow(clippy::cast_precision_loss)]
pub fn r2_score(y_true: &[f64], y_pred: &[f64]) -> Result<f64> {
    check(y_true, y_pred)?;
    let mean = y_true.iter().sum::<f64>() / y_true.len() as f64;
    let ss_res: f64 = y_true.iter().zip(y_pred).map(|(t, p)| (t - p).powi(2)).sum();
    let ss_tot: f64 = y_true.iter().map(|t| (t - mean).powi(2)).sum();

    if ss_tot == 0.0 {
        return Ok(if ss_res == 0.0 { 1.0 } else { 0.0 });
    }
    Ok(1.0 - ss_res / ss_tot)
}
