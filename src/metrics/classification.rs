//! Label-based classification metrics

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

pub(crate) fn check_non_empty(len: usize, what: &str) -> Result<()> {
    if len == 0 {
        return Err(Error::invalid(format!("{what} must not be empty")));
    }
    Ok(())
}

pub(crate) fn check_same_length(expected: usize, actual: usize) -> Result<()> {
    if expected != actual {
        return Err(Error::length_mismatch(expected, actual));
    }
    Ok(())
}

/// Sorted, deduplicated labels.
#[must_use]
pub fn unique_labels(y: &[i64]) -> Vec<i64> {
    let mut labels = y.to_vec();
    labels.sort_unstable();
    labels.dedup();
    labels
}

/// One-hot encode `y` against `classes`.
///
/// Labels absent from `classes` produce an all-zero row.
#[must_use]
pub fn label_binarize(y: &[i64], classes: &[i64]) -> Vec<Vec<u8>> {
    let index = label_index(classes);
    y.iter()
        .map(|label| {
            let mut row = vec![0u8; classes.len()];
            if let Some(&i) = index.get(label) {
                row[i] = 1;
            }
            row
        })
        .collect()
}

/// Count occurrences of each label, ordered by label.
#[must_use]
pub fn class_counts(y: &[i64]) -> Vec<(i64, usize)> {
    let mut counts: FxHashMap<i64, usize> = FxHashMap::default();
    for &label in y {
        *counts.entry(label).or_insert(0) += 1;
    }
    let mut counts: Vec<(i64, usize)> = counts.into_iter().collect();
    counts.sort_unstable_by_key(|&(label, _)| label);
    counts
}

fn label_index(labels: &[i64]) -> FxHashMap<i64, usize> {
    labels.iter().enumerate().map(|(i, &l)| (l, i)).collect()
}

/// Compute the confusion matrix.
///
/// Labels are the sorted union of `y_true` and `y_pred`. Rows are true
/// labels, columns are predicted labels.
///
/// # Errors
///
/// Returns error if the inputs are empty or differ in length.
///
/// # Example
///
/// ```rust
/// use skeval::metrics::confusion_matrix;
///
/// let (labels, cm) = confusion_matrix(&[0, 0, 1, 1], &[0, 1, 1, 1]).unwrap();
/// assert_eq!(labels, vec![0, 1]);
/// assert_eq!(cm, vec![vec![1, 1], vec![0, 2]]);
/// ```
pub fn confusion_matrix(y_true: &[i64], y_pred: &[i64]) -> Result<(Vec<i64>, Vec<Vec<u64>>)> {
    check_non_empty(y_true.len(), "y_true")?;
    check_same_length(y_true.len(), y_pred.len())?;

    let labels = unique_labels(&[y_true, y_pred].concat());
    let index = label_index(&labels);
    let mut cm = vec![vec![0u64; labels.len()]; labels.len()];

    for (t, p) in y_true.iter().zip(y_pred) {
        cm[index[t]][index[p]] += 1;
    }

    Ok((labels, cm))
}

/// Divide each row by its sum. Rows summing to zero stay zero.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn normalize_rows(cm: &[Vec<u64>]) -> Vec<Vec<f64>> {
    cm.iter()
        .map(|row| {
            let total: u64 = row.iter().sum();
            row.iter()
                .map(|&v| if total == 0 { 0.0 } else { v as f64 / total as f64 })
                .collect()
        })
        .collect()
}

/// Fraction of predictions matching the ground truth.
///
/// # Errors
///
/// Returns error if the inputs are empty or differ in length.
#[allow(clippy::cast_precision_loss)]
pub fn accuracy_score(y_true: &[i64], y_pred: &[i64]) -> Result<f64> {
    check_non_empty(y_true.len(), "y_true")?;
    check_same_length(y_true.len(), y_pred.len())?;

    let correct = y_true.iter().zip(y_pred).filter(|(t, p)| t == p).count();
    Ok(correct as f64 / y_true.len() as f64)
}

/// Precision, recall, F1 and support for a single class.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassScores {
    /// Class label
    pub label: i64,
    /// TP / (TP + FP)
    pub precision: f64,
    /// TP / (TP + FN)
    pub recall: f64,
    /// Harmonic mean of precision and recall
    pub f1: f64,
    /// Number of true samples of this class
    pub support: u64,
}

/// Per-class precision, recall, F1 and support.
///
/// Undefined ratios (0/0) are reported as 0.
///
/// # Errors
///
/// Returns error if the inputs are empty or differ in length.
#[allow(clippy::cast_precision_loss)]
pub fn precision_recall_fscore_support(y_true: &[i64], y_pred: &[i64]) -> Result<Vec<ClassScores>> {
    let (labels, cm) = confusion_matrix(y_true, y_pred)?;

    let ratio = |num: u64, den: u64| if den == 0 { 0.0 } else { num as f64 / den as f64 };

    let scores = labels
        .iter()
        .enumerate()
        .map(|(i, &label)| {
            let tp = cm[i][i];
            let predicted: u64 = cm.iter().map(|row| row[i]).sum();
            let support: u64 = cm[i].iter().sum();
            let precision = ratio(tp, predicted);
            let recall = ratio(tp, support);
            let f1 = if precision + recall == 0.0 {
                0.0
            } else {
                2.0 * precision * recall / (precision + recall)
            };
            ClassScores {
                label,
                precision,
                recall,
                f1,
                support,
            }
        })
        .collect();

    Ok(scores)
}

/// Whether the target is balanced.
///
/// A target is balanced when its least frequent class has at least half as
/// many samples as its most frequent class.
///
/// # Errors
///
/// Returns error if `y` is empty.
pub fn check_array_balance(y: &[i64]) -> Result<bool> {
    check_non_empty(y.len(), "y")?;
    let counts = class_counts(y);
    let max = counts.iter().map(|&(_, c)| c).max().unwrap_or(0);
    let min = counts.iter().map(|&(_, c)| c).min().unwrap_or(0);
    Ok(min * 2 >= max)
}

/// Inclusive numeric range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Range {
    /// Lower bound
    pub min: f64,
    /// Upper bound
    pub max: f64,
}

impl Range {
    /// Create a new range.
    #[must_use]
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Check whether `value` falls inside the range (inclusive).
    #[must_use]
    pub fn contains(&self, value: f64) -> bool {
        self.min <= value && value <= self.max
    }
}
