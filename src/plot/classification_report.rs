//! Classification report heatmap

use std::ops::{Add, Sub};

use serde::{Deserialize, Serialize};

use super::{class_names, Axes, Figure, FigureConfig, Plot};
use crate::metrics::{precision_recall_fscore_support, ClassScores};
use crate::{Error, Result};

const METRICS: [&str; 3] = ["precision", "recall", "f1-score"];

/// Per-class precision, recall and F1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationReport {
    scores: Vec<ClassScores>,
    target_names: Vec<String>,
}

impl ClassificationReport {
    /// Compute from true and predicted labels.
    ///
    /// # Errors
    ///
    /// Returns error if the inputs are empty or differ in length.
    pub fn from_raw_data(y_true: &[i64], y_pred: &[i64]) -> Result<Self> {
        let scores = precision_recall_fscore_support(y_true, y_pred)?;
        let labels: Vec<i64> = scores.iter().map(|s| s.label).collect();
        Ok(Self {
            target_names: class_names(&labels, None)?,
            scores,
        })
    }

    /// Replace the displayed class names.
    ///
    /// # Errors
    ///
    /// Returns error if the number of names differs from the number of classes.
    pub fn with_target_names(mut self, names: &[String]) -> Result<Self> {
        let labels: Vec<i64> = self.scores.iter().map(|s| s.label).collect();
        self.target_names = class_names(&labels, Some(names))?;
        Ok(self)
    }

    /// Per-class scores.
    #[must_use]
    pub fn scores(&self) -> &[ClassScores] {
        &self.scores
    }

    /// Rows of `[precision, recall, f1]`.
    #[must_use]
    pub fn matrix(&self) -> Vec<Vec<f64>> {
        self.scores
            .iter()
            .map(|s| vec![s.precision, s.recall, s.f1])
            .collect()
    }

    fn row_names(&self) -> Vec<String> {
        self.scores
            .iter()
            .zip(&self.target_names)
            .map(|(s, name)| format!("{name} (n={})", s.support))
            .collect()
    }

    fn axes(&self, title: &str) -> Axes {
        let matrix = self.matrix();
        let mut axes = Axes::new(title);
        axes.heatmap(
            self.row_names(),
            METRICS.iter().map(ToString::to_string).collect(),
            matrix.clone(),
            annotate(&matrix),
        );
        axes
    }

    fn check_compatible(&self, other: &Self) -> Result<()> {
        let mine: Vec<i64> = self.scores.iter().map(|s| s.label).collect();
        let theirs: Vec<i64> = other.scores.iter().map(|s| s.label).collect();
        if mine != theirs {
            return Err(Error::ShapeMismatch {
                expected: format!("classes {mine:?}"),
                actual: format!("classes {theirs:?}"),
            });
        }
        Ok(())
    }
}

fn annotate(matrix: &[Vec<f64>]) -> Vec<Vec<String>> {
    matrix
        .iter()
        .map(|row| row.iter().map(|v| format!("{v:.2}")).collect())
        .collect()
}

impl Plot for ClassificationReport {
    const CLASS: &'static str = "ClassificationReport";

    fn plot_with(&self, config: &FigureConfig) -> Figure {
        Figure::single(self.axes("Classification report"), config.clone())
    }
}

/// Two classification reports side by side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationReportComparison {
    a: ClassificationReport,
    b: ClassificationReport,
}

impl Plot for ClassificationReportComparison {
    const CLASS: &'static str = "ClassificationReportAdd";

    fn plot_with(&self, config: &FigureConfig) -> Figure {
        let config = config.clone().width(config.get_width() * 2);
        Figure::row(vec![self.a.axes("First model"), self.b.axes("Second model")], config)
    }
}

/// Difference of two classification reports (first minus second).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationReportDiff {
    target_names: Vec<String>,
    diff: Vec<Vec<f64>>,
}

impl ClassificationReportDiff {
    /// Rows of `[Δprecision, Δrecall, Δf1]`.
    #[must_use]
    pub fn values(&self) -> &[Vec<f64>] {
        &self.diff
    }
}

impl Plot for ClassificationReportDiff {
    const CLASS: &'static str = "ClassificationReportSub";

    fn plot_with(&self, config: &FigureConfig) -> Figure {
        let mut axes = Axes::new("Classification report difference");
        axes.heatmap(
            self.target_names.clone(),
            METRICS.iter().map(ToString::to_string).collect(),
            self.diff.clone(),
            annotate(&self.diff),
        );
        Figure::single(axes, config.clone())
    }
}

impl Add for ClassificationReport {
    type Output = Result<ClassificationReportComparison>;

    fn add(self, other: Self) -> Self::Output {
        self.check_compatible(&other)?;
        Ok(ClassificationReportComparison { a: self, b: other })
    }
}

impl Sub for ClassificationReport {
    type Output = Result<ClassificationReportDiff>;

    fn sub(self, other: Self) -> Self::Output {
        self.check_compatible(&other)?;
        let diff = self
            .matrix()
            .iter()
            .zip(other.matrix())
            .map(|(a, b)| a.iter().zip(b).map(|(x, y)| x - y).collect())
            .collect();
        Ok(ClassificationReportDiff {
            target_names: self.target_names,
            diff,
        })
    }
}
