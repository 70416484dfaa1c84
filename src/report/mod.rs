//! Model evaluation reports
//!
//! Heuristic checks turn raw predictions into a short HTML report: is the
//! test set balanced, is the accuracy meaningful, is any class poorly
//! separated. [`evaluate_model`] runs the single-model checks and
//! [`compare_models`] puts two classifiers side by side.
//!
//! ## Example
//!
//! ```rust
//! use skeval::report::evaluate_model;
//!
//! let y_true = [0, 0, 1, 1, 0, 1];
//! let y_pred = [0, 0, 1, 1, 1, 1];
//! let y_score = vec![vec![0.1], vec![0.3], vec![0.8], vec![0.7], vec![0.6], vec![0.9]];
//!
//! let report = evaluate_model(&y_true, &y_pred, &y_score).unwrap();
//! assert_eq!(report.title(), "Model evaluation");
//! assert!(report.to_html().unwrap().contains("general stats"));
//! ```

mod comparer;
mod evaluator;
mod section;

pub use comparer::{ModelComparer, COMPUTE_TIME_DIFF_THRESHOLD};
pub use evaluator::{ModelEvaluator, ACCURACY_THRESHOLD, AUC_LOW_RANGE};
pub use section::{Guideline, Report, ReportSection};

use crate::{Error, Result};

pub(crate) const GUIDE_LINK: &str =
    "To tackle this, check out this <a href='https://ploomber.io/blog/' target='_blank'>guide</a>";

/// A fitted classifier that can be evaluated.
pub trait Classifier {
    /// Predicted label per row of `x`.
    ///
    /// # Errors
    ///
    /// Returns error if the model cannot predict on `x`.
    fn predict(&self, x: &[Vec<f64>]) -> Result<Vec<i64>>;

    /// Class probabilities per row, one column per class in sorted label
    /// order.
    ///
    /// # Errors
    ///
    /// The default implementation returns [`Error::Model`]; models without
    /// probability estimates keep it.
    fn predict_proba(&self, _x: &[Vec<f64>]) -> Result<Vec<Vec<f64>>> {
        Err(Error::Model(
            "this model does not provide predict_proba".to_string(),
        ))
    }
}

/// Run balance, accuracy, AUC and general-stats checks on one model.
///
/// # Errors
///
/// Returns error if the inputs are empty, differ in length, or the ROC
/// curves cannot be computed.
pub fn evaluate_model(y_true: &[i64], y_pred: &[i64], y_score: &[Vec<f64>]) -> Result<Report> {
    let mut evaluator = ModelEvaluator::new();
    evaluator.evaluate_balance(y_true)?;
    evaluator.evaluate_accuracy(y_true, y_pred)?;
    evaluator.evaluate_auc(y_true, y_score)?;
    evaluator.generate_general_stats(y_true, y_pred, y_score)?;
    Ok(evaluator.create_report("Model evaluation"))
}

/// Compare two classifiers on the same test set.
///
/// # Errors
///
/// Returns error if either model fails to `predict`.
pub fn compare_models(
    model_a: &dyn Classifier,
    model_b: &dyn Classifier,
    x_test: &[Vec<f64>],
    y_true: &[i64],
) -> Result<Report> {
    let mut comparer = ModelComparer::new(model_a, model_b);
    comparer.precision_and_recall(x_test, y_true);
    comparer.auc(x_test, y_true);
    comparer.computation(x_test)?;
    comparer.calibration(x_test, y_true);
    comparer.add_combined_cm(x_test, y_true)?;
    Ok(comparer.create_report("Compare models"))
}
