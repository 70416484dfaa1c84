//! Heuristic checks on a single model's predictions

use super::section::{Guideline, Heuristics, Report, ReportSection};
use super::GUIDE_LINK;
use crate::metrics::{accuracy_score, check_array_balance, Range};
use crate::plot::{ConfusionMatrix, Plot, Roc, TargetAnalysis};
use crate::Result;

/// Accuracy at or above this is called out as high.
pub const ACCURACY_THRESHOLD: f64 = 0.9;

/// AUC values in this range are flagged as low.
pub const AUC_LOW_RANGE: Range = Range::new(0.0, 0.6);

/// Builds an evaluation report for one model, one check at a time.
///
/// ## Example
///
/// ```rust
/// use skeval::report::ModelEvaluator;
///
/// let y_true = [0, 0, 1, 1];
/// let mut evaluator = ModelEvaluator::new();
/// evaluator.evaluate_balance(&y_true).unwrap();
/// evaluator.evaluate_accuracy(&y_true, &[0, 0, 1, 1]).unwrap();
///
/// let report = evaluator.create_report("Model evaluation");
/// assert!(report.section("accuracy").unwrap().is_ok());
/// ```
#[derive(Debug, Clone, Default)]
pub struct ModelEvaluator {
    heuristics: Heuristics,
}

impl ModelEvaluator {
    /// Evaluator with no sections yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sections added so far, including hidden ones.
    #[must_use]
    pub fn sections(&self) -> &[ReportSection] {
        self.heuristics.sections()
    }

    /// Check whether the test set is balanced.
    ///
    /// # Errors
    ///
    /// Returns error if `y_true` is empty.
    pub fn evaluate_balance(&mut self, y_true: &[i64]) -> Result<()> {
        let mut section = ReportSection::new("balance");
        if check_array_balance(y_true)? {
            section.set_is_ok(true);
            section.append_guideline("Your test set is balanced");
        } else {
            section.set_is_ok(false);
            section.append_guideline("Your test set is highly imbalanced");
            section.append_guideline(TargetAnalysis::from_raw_data(y_true)?.plot());
            section.append_guideline(Guideline::Html(GUIDE_LINK.to_string()));
        }
        self.heuristics.add(section);
        Ok(())
    }

    /// Report accuracy; high accuracy on an imbalanced set is flagged.
    ///
    /// Balance is taken from an earlier [`evaluate_balance`](Self::evaluate_balance)
    /// call, or computed from `y_true` if there was none.
    ///
    /// # Errors
    ///
    /// Returns error if the inputs are empty or differ in length.
    pub fn evaluate_accuracy(&mut self, y_true: &[i64], y_pred: &[i64]) -> Result<()> {
        let mut section = ReportSection::new("accuracy");
        let accuracy = accuracy_score(y_true, y_pred)?;
        section.append_guideline(format!("Accuracy is {accuracy:.4}"));

        if accuracy >= ACCURACY_THRESHOLD {
            let balanced = match self.heuristics.get("balance") {
                Some(balance) => balance.is_ok(),
                None => check_array_balance(y_true)?,
            };
            if balanced {
                section.set_is_ok(true);
                section.append_guideline("Your model is accurate");
            } else {
                section.set_is_ok(false);
                section.append_guideline(
                    "Please note your test set is imbalanced, so high accuracy could be misleading",
                );
            }
        }
        self.heuristics.add(section);
        Ok(())
    }

    /// Check the area under each ROC curve.
    ///
    /// Curves with a low AUC get a warning and their own ROC figure. When
    /// no curve is low the section is marked ok and left out of the report.
    ///
    /// # Errors
    ///
    /// Returns error if the ROC curves cannot be computed.
    pub fn evaluate_auc(&mut self, y_true: &[i64], y_score: &[Vec<f64>]) -> Result<()> {
        let mut section = ReportSection::new("auc");
        let roc = Roc::from_raw_data(y_true, y_score)?;

        let mut any_low = false;
        for (i, area) in roc.aucs().into_iter().enumerate() {
            if !AUC_LOW_RANGE.contains(area) {
                continue;
            }
            any_low = true;
            let label = &roc.labels()[i];
            let class_name = label.trim_start_matches('(').trim_end_matches(')');
            section.append_guideline(format!(
                "Area under curve is low for {class_name} ({area:.2})"
            ));
            section.append_guideline(roc.curve(i)?.plot());
            section.append_guideline(Guideline::Html(GUIDE_LINK.to_string()));
        }

        section.set_is_ok(!any_low);
        section.set_include_in_report(any_low);
        self.heuristics.add(section);
        Ok(())
    }

    /// Add the confusion matrix and ROC curves.
    ///
    /// # Errors
    ///
    /// Returns error if either plot cannot be computed.
    pub fn generate_general_stats(
        &mut self,
        y_true: &[i64],
        y_pred: &[i64],
        y_score: &[Vec<f64>],
    ) -> Result<()> {
        let mut section = ReportSection::new("general_stats");
        section.append_guideline(ConfusionMatrix::from_raw_data(y_true, y_pred)?.plot());
        section.append_guideline(Roc::from_raw_data(y_true, y_score)?.plot());
        self.heuristics.add(section);
        Ok(())
    }

    /// Report of every section marked for inclusion.
    #[must_use]
    pub fn create_report(&self, title: &str) -> Report {
        self.heuristics.create_report(title)
    }
}
