//! Side-by-side checks on two models

use std::time::{Duration, Instant};

use super::section::{Heuristics, Report, ReportSection};
use super::Classifier;
use crate::metrics::DEFAULT_N_BINS;
use crate::plot::{CalibrationCurve, ConfusionMatrix, Plot, PrecisionRecall, Roc};
use crate::{Error, Result};

/// Prediction time difference worth calling out.
pub const COMPUTE_TIME_DIFF_THRESHOLD: Duration = Duration::from_secs(1);

const MODEL_NAMES: [&str; 2] = ["Model A", "Model B"];

fn failed(section: &str, model: &str, err: &Error) -> String {
    format!("Failed to calculate {section} for {model}: {err}")
}

/// Compares two classifiers on the same test set.
///
/// Checks that need probabilities record a guideline when a model cannot
/// produce them, so the rest of the report is still built.
pub struct ModelComparer<'a> {
    model_a: &'a dyn Classifier,
    model_b: &'a dyn Classifier,
    heuristics: Heuristics,
}

impl std::fmt::Debug for ModelComparer<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelComparer")
            .field("sections", &self.heuristics.sections().len())
            .finish_non_exhaustive()
    }
}

impl<'a> ModelComparer<'a> {
    /// Compare `model_a` against `model_b`.
    #[must_use]
    pub fn new(model_a: &'a dyn Classifier, model_b: &'a dyn Classifier) -> Self {
        Self {
            model_a,
            model_b,
            heuristics: Heuristics::default(),
        }
    }

    /// Sections added so far.
    #[must_use]
    pub fn sections(&self) -> &[ReportSection] {
        self.heuristics.sections()
    }

    fn models(&self) -> [(&'static str, &'a dyn Classifier); 2] {
        [(MODEL_NAMES[0], self.model_a), (MODEL_NAMES[1], self.model_b)]
    }

    /// Precision-recall curve of each model.
    pub fn precision_and_recall(&mut self, x_test: &[Vec<f64>], y_true: &[i64]) {
        let mut section = ReportSection::new("precision_recall");
        for (name, model) in self.models() {
            let curve = model
                .predict_proba(x_test)
                .and_then(|proba| PrecisionRecall::from_raw_data(y_true, &proba));
            match curve {
                Ok(curve) => section.append_guideline(curve.plot()),
                Err(err) => section.append_guideline(failed("precision_recall", name, &err)),
            }
        }
        self.heuristics.add(section);
    }

    /// ROC AUC of each model.
    pub fn auc(&mut self, x_test: &[Vec<f64>], y_true: &[i64]) {
        let mut section = ReportSection::new("auc");
        for (name, model) in self.models() {
            let aucs = model
                .predict_proba(x_test)
                .and_then(|proba| Roc::from_raw_data(y_true, &proba))
                .map(|roc| roc.aucs());
            match aucs {
                Ok(aucs) if aucs.len() == 1 => {
                    section.append_guideline(format!("{name} AUC (ROC) is {:.4}", aucs[0]));
                }
                Ok(aucs) => {
                    let values: Vec<String> = aucs.iter().map(|a| format!("{a:.4}")).collect();
                    section.append_guideline(format!(
                        "{name} AUC (ROC) are [{}]",
                        values.join(", ")
                    ));
                }
                Err(err) => section.append_guideline(failed("auc", name, &err)),
            }
        }
        self.heuristics.add(section);
    }

    /// Wall-clock `predict` time of each model.
    ///
    /// # Errors
    ///
    /// Returns error if either model fails to predict.
    pub fn computation(&mut self, x_test: &[Vec<f64>]) -> Result<()> {
        let mut section = ReportSection::new("computation");
        let time_a = timed_predict(self.model_a, x_test)?;
        let time_b = timed_predict(self.model_b, x_test)?;
        tracing::debug!(?time_a, ?time_b, "prediction timed");

        let diff = if time_a > time_b { time_a - time_b } else { time_b - time_a };
        if diff >= COMPUTE_TIME_DIFF_THRESHOLD {
            let slower = if time_a > time_b { MODEL_NAMES[0] } else { MODEL_NAMES[1] };
            section.append_guideline(format!("{slower} is a lot more computationally expensive"));
        }
        section.append_guideline(format!(
            "{} compute time is {:.4} (seconds)",
            MODEL_NAMES[0],
            time_a.as_secs_f64()
        ));
        section.append_guideline(format!(
            "{} compute time is {:.4} (seconds)",
            MODEL_NAMES[1],
            time_b.as_secs_f64()
        ));
        self.heuristics.add(section);
        Ok(())
    }

    /// Calibration curve of each model.
    pub fn calibration(&mut self, x_test: &[Vec<f64>], y_true: &[i64]) {
        let mut section = ReportSection::new("calibration");
        for (name, model) in self.models() {
            let curve = model.predict_proba(x_test).and_then(|proba| {
                CalibrationCurve::from_raw_data(
                    &[y_true],
                    &[proba.as_slice()],
                    Some(vec![name.to_string()]),
                    DEFAULT_N_BINS,
                )
            });
            match curve {
                Ok(curve) => section.append_guideline(curve.plot()),
                Err(err) => section.append_guideline(failed("calibration", name, &err)),
            }
        }
        self.heuristics.add(section);
    }

    /// Both confusion matrices side by side.
    ///
    /// # Errors
    ///
    /// Returns error if either model fails to predict or the matrices have
    /// different labels.
    pub fn add_combined_cm(&mut self, x_test: &[Vec<f64>], y_true: &[i64]) -> Result<()> {
        let mut section = ReportSection::new("combined_confusion_matrix");
        let cm_a = ConfusionMatrix::from_raw_data(y_true, &self.model_a.predict(x_test)?)?;
        let cm_b = ConfusionMatrix::from_raw_data(y_true, &self.model_b.predict(x_test)?)?;
        section.append_guideline((cm_a + cm_b)?.plot());
        self.heuristics.add(section);
        Ok(())
    }

    /// Report of every section marked for inclusion.
    #[must_use]
    pub fn create_report(&self, title: &str) -> Report {
        self.heuristics.create_report(title)
    }
}

fn timed_predict(model: &dyn Classifier, x_test: &[Vec<f64>]) -> Result<Duration> {
    let start = Instant::now();
    model.predict(x_test)?;
    Ok(start.elapsed())
}
