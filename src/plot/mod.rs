//! Evaluation plots
//!
//! Each plot type stores the data computed from raw labels and scores, so it
//! can be rendered any number of times, combined with another plot of the
//! same kind, or dumped to JSON and restored later without the raw inputs.
//!
//! ## Example
//!
//! ```rust
//! use skeval::plot::{ConfusionMatrix, Plot};
//!
//! let cm = ConfusionMatrix::from_raw_data(&[0, 1, 1, 0], &[0, 1, 0, 0]).unwrap();
//! let svg = cm.plot().to_svg();
//! assert!(svg.contains("Confusion matrix"));
//!
//! let restored = ConfusionMatrix::from_json(cm.to_json().unwrap()).unwrap();
//! assert_eq!(cm, restored);
//! ```

mod calibration;
mod classification_report;
mod confusion_matrix;
mod cumulative_gain;
mod elbow;
mod figure;
mod grid_search;
mod precision_recall;
mod regression;
mod roc;
mod target_analysis;

use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;

pub use calibration::CalibrationCurve;
pub use classification_report::{
    ClassificationReport, ClassificationReportComparison, ClassificationReportDiff,
};
pub use confusion_matrix::{ConfusionMatrix, ConfusionMatrixComparison, ConfusionMatrixDiff};
pub use cumulative_gain::CumulativeGain;
pub use elbow::ElbowCurve;
pub use figure::{escape, Axes, Figure, FigureConfig, Mark};
pub use grid_search::{GridSearch, GridSearchResult};
pub use precision_recall::PrecisionRecall;
pub use regression::{PredictionError, Residuals};
pub use roc::Roc;
pub use target_analysis::TargetAnalysis;

use crate::metrics::unique_labels;
use crate::{Error, Result};

/// Key holding the plot type in dumps
pub const CLASS_KEY: &str = "class";

/// Common behaviour of every plot type.
pub trait Plot: Serialize + DeserializeOwned {
    /// Type tag written to dumps.
    const CLASS: &'static str;

    /// Render with a custom layout.
    fn plot_with(&self, config: &FigureConfig) -> Figure;

    /// Render with the default layout.
    fn plot(&self) -> Figure {
        self.plot_with(&FigureConfig::default())
    }

    /// Serialize to a JSON object tagged with [`Plot::CLASS`].
    ///
    /// # Errors
    ///
    /// Returns error if serialization fails.
    fn to_json(&self) -> Result<serde_json::Value> {
        let mut value = serde_json::to_value(self)?;
        match value.as_object_mut() {
            Some(object) => {
                object.insert(CLASS_KEY.to_string(), Self::CLASS.into());
                Ok(value)
            }
            None => Err(Error::invalid(format!(
                "{} did not serialize to a JSON object",
                Self::CLASS
            ))),
        }
    }

    /// Restore from a JSON object produced by [`Plot::to_json`].
    ///
    /// # Errors
    ///
    /// Returns error if the class tag is missing or different, or the data
    /// does not match this plot type.
    fn from_json(mut value: serde_json::Value) -> Result<Self> {
        let found = value
            .as_object_mut()
            .and_then(|object| object.remove(CLASS_KEY))
            .and_then(|class| class.as_str().map(str::to_string))
            .unwrap_or_default();
        if found != Self::CLASS {
            return Err(Error::DumpMismatch {
                expected: Self::CLASS.to_string(),
                found,
            });
        }
        Ok(serde_json::from_value(value)?)
    }

    /// Write the JSON dump to `path`.
    ///
    /// # Errors
    ///
    /// Returns error if serialization or writing fails.
    fn dump(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.to_json()?)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load a plot from a JSON dump.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or holds another plot type.
    fn from_dump(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(serde_json::from_str(&contents)?)
    }
}

/// Convert binary labels to booleans.
///
/// With two classes the larger label is positive. With a single class,
/// the label `1` is treated as positive.
pub(crate) fn binary_target(y_true: &[i64]) -> Result<Vec<bool>> {
    let classes = unique_labels(y_true);
    let positive = match classes.as_slice() {
        [] => return Err(Error::invalid("y_true must not be empty")),
        [_] => 1,
        [_, positive] => *positive,
        _ => {
            return Err(Error::invalid(format!(
                "expected a binary target, found {} classes",
                classes.len()
            )))
        }
    };
    Ok(y_true.iter().map(|&y| y == positive).collect())
}

/// Display names for class labels, validated against the label count.
pub(crate) fn class_names(labels: &[i64], target_names: Option<&[String]>) -> Result<Vec<String>> {
    match target_names {
        Some(names) if names.len() != labels.len() => Err(Error::ShapeMismatch {
            expected: format!("{} target names", labels.len()),
            actual: format!("{} target names", names.len()),
        }),
        Some(names) => Ok(names.to_vec()),
        None => Ok(labels.iter().map(ToString::to_string).collect()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binary_target_two_classes() {
        assert_eq!(binary_target(&[3, 7, 7]).unwrap(), vec![false, true, true]);
    }

    #[test]
    fn test_binary_target_single_class() {
        assert_eq!(binary_target(&[1, 1]).unwrap(), vec![true, true]);
        assert_eq!(binary_target(&[0, 0]).unwrap(), vec![false, false]);
    }

    #[test]
    fn test_binary_target_multiclass_rejected() {
        assert!(binary_target(&[0, 1, 2]).is_err());
    }

    #[test]
    fn test_class_names_mismatch() {
        let names = vec!["a".to_string()];
        assert!(class_names(&[0, 1], Some(&names)).is_err());
        assert_eq!(class_names(&[0, 1], None).unwrap(), vec!["0", "1"]);
    }
}
