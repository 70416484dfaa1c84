//! Handle for logging into one experiment row

use serde_json::{Map, Value};

use super::{Logged, SqliteTracker};
use crate::plot::{ClassificationReport, ConfusionMatrix, Figure, Plot};
use crate::{Error, Result};

const CONFUSION_MATRIX_KEY: &str = "confusion_matrix";
const CLASSIFICATION_REPORT_KEY: &str = "classification_report";

/// A single experiment in a [`SqliteTracker`].
///
/// Every log call is written to the database immediately, so a crash
/// halfway through a run keeps whatever was logged before it.
#[derive(Debug)]
pub struct Experiment<'a> {
    tracker: &'a SqliteTracker,
    uuid: String,
}

impl<'a> Experiment<'a> {
    pub(crate) const fn new(tracker: &'a SqliteTracker, uuid: String) -> Self {
        Self { tracker, uuid }
    }

    /// Experiment ID.
    #[must_use]
    pub fn uuid(&self) -> &str {
        &self.uuid
    }

    /// Log one value, replacing any previous value under `key`.
    ///
    /// # Errors
    ///
    /// Returns error if the value cannot be serialized or stored.
    pub fn log(&self, key: &str, value: impl serde::Serialize) -> Result<()> {
        let mut map = Map::new();
        map.insert(key.to_string(), serde_json::to_value(value)?);
        self.tracker.upsert(&self.uuid, Value::Object(map))
    }

    /// Log every entry of `values`.
    ///
    /// # Errors
    ///
    /// Returns error if storing fails.
    pub fn log_dict(&self, values: Map<String, Value>) -> Result<()> {
        self.tracker.upsert(&self.uuid, Value::Object(values))
    }

    /// Log a rendered figure.
    ///
    /// # Errors
    ///
    /// Returns error if storing fails.
    pub fn log_figure(&self, key: &str, figure: &Figure) -> Result<()> {
        self.log(key, Logged::figure_value(figure))
    }

    /// Log the JSON dump of any plot; [`get`](Self::get) restores confusion
    /// matrices and classification reports as data and renders every other
    /// plot type.
    ///
    /// # Errors
    ///
    /// Returns error if the plot cannot be serialized or stored.
    pub fn log_plot<P: Plot>(&self, key: &str, plot: &P) -> Result<()> {
        self.log(key, plot.to_json()?)
    }

    /// Compute and log a confusion matrix (key defaults to
    /// `confusion_matrix`).
    ///
    /// # Errors
    ///
    /// Returns error if the labels are invalid or storing fails.
    pub fn log_confusion_matrix(
        &self,
        key: Option<&str>,
        y_true: &[i64],
        y_pred: &[i64],
    ) -> Result<ConfusionMatrix> {
        let cm = ConfusionMatrix::from_raw_data(y_true, y_pred)?;
        self.log_plot(key.unwrap_or(CONFUSION_MATRIX_KEY), &cm)?;
        Ok(cm)
    }

    /// Compute and log a classification report (key defaults to
    /// `classification_report`).
    ///
    /// # Errors
    ///
    /// Returns error if the labels are invalid or storing fails.
    pub fn log_classification_report(
        &self,
        key: Option<&str>,
        y_true: &[i64],
        y_pred: &[i64],
    ) -> Result<ClassificationReport> {
        let report = ClassificationReport::from_raw_data(y_true, y_pred)?;
        self.log_plot(key.unwrap_or(CLASSIFICATION_REPORT_KEY), &report)?;
        Ok(report)
    }

    /// Set the experiment comment.
    ///
    /// # Errors
    ///
    /// Returns error if the experiment was deleted.
    pub fn comment(&self, text: &str) -> Result<()> {
        self.tracker.comment(&self.uuid, text)
    }

    /// All logged values.
    ///
    /// # Errors
    ///
    /// Returns error if the experiment was deleted.
    pub fn parameters(&self) -> Result<Map<String, Value>> {
        Ok(self.tracker.get(&self.uuid)?.parameters().clone())
    }

    /// One logged value, with plots restored from their dumps.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if nothing was logged under `key`.
    pub fn get(&self, key: &str) -> Result<Logged> {
        let record = self.tracker.get(&self.uuid)?;
        record
            .get(key)
            .cloned()
            .map(Logged::from_value)
            .ok_or_else(|| Error::NotFound(format!("key '{key}' in experiment '{}'", self.uuid)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_log_and_get() {
        let tracker = SqliteTracker::in_memory().unwrap();
        let exp = tracker.new_experiment().unwrap();
        exp.log("accuracy", 0.9).unwrap();
        exp.log("accuracy", 0.95).unwrap();
        assert_eq!(exp.get("accuracy").unwrap(), Logged::Value(json!(0.95)));
    }

    #[test]
    fn test_missing_key() {
        let tracker = SqliteTracker::in_memory().unwrap();
        let exp = tracker.new_experiment().unwrap();
        assert!(matches!(exp.get("nope"), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_log_confusion_matrix_restores() {
        let tracker = SqliteTracker::in_memory().unwrap();
        let exp = tracker.new_experiment().unwrap();
        let cm = exp
            .log_confusion_matrix(None, &[0, 1, 1], &[0, 1, 0])
            .unwrap();
        assert_eq!(
            exp.get("confusion_matrix").unwrap(),
            Logged::ConfusionMatrix(cm)
        );
    }
}
