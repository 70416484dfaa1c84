//! Evaluation metrics
//!
//! Pure functions over slices that feed the [`plot`](crate::plot) types and
//! the [`report`](crate::report) heuristics.
//!
//! ## Conventions
//!
//! - Class labels are `i64`.
//! - Binary curves take `&[bool]` ground truth and `&[f64]` scores.
//! - Score matrices are row-major `&[Vec<f64>]` (samples × classes), with
//!   columns ordered by sorted class label.
//!
//! ```rust
//! use skeval::metrics::{auc, roc_curve};
//!
//! let roc = roc_curve(&[false, true, true], &[0.2, 0.7, 0.9]).unwrap();
//! let area = auc(&roc.x, &roc.y).unwrap();
//! assert!((area - 1.0).abs() < 1e-12);
//! ```

mod classification;
mod cluster;
mod curves;
mod regression;

pub use classification::{
    accuracy_score, check_array_balance, class_counts, confusion_matrix, label_binarize,
    normalize_rows, precision_recall_fscore_support, unique_labels, ClassScores, Range,
};
pub use cluster::kmeans_inertia;
pub use curves::{
    auc, average_precision, calibration_curve, cumulative_gain, precision_recall_curve,
    roc_curve, Curve,
};
pub use regression::{mean_absolute_error, mean_squared_error, r2_score};

pub(crate) use classification::{check_non_empty, check_same_length};

/// Default number of bins for calibration curves
pub const DEFAULT_N_BINS: usize = 10;

/// Split a score matrix into the per-class columns used by one-vs-rest curves.
///
/// A single-column matrix is treated as the positive-class score of a binary
/// problem; a two-column matrix keeps only the second column.
///
/// # Errors
///
/// Returns error if the matrix is empty or ragged.
pub fn score_columns(y_score: &[Vec<f64>]) -> crate::Result<Vec<Vec<f64>>> {
    check_non_empty(y_score.len(), "y_score")?;
    let width = y_score[0].len();
    if width == 0 {
        return Err(crate::Error::invalid("y_score must have at least one column"));
    }
    if let Some(row) = y_score.iter().find(|row| row.len() != width) {
        return Err(crate::Error::ShapeMismatch {
            expected: format!("{width} columns"),
            actual: format!("{} columns", row.len()),
        });
    }

    let column = |j: usize| y_score.iter().map(|row| row[j]).collect::<Vec<f64>>();
    Ok(match width {
        1 => vec![column(0)],
        2 => vec![column(1)],
        _ => (0..width).map(column).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_columns_binary() {
        let cols = score_columns(&[vec![0.9, 0.1], vec![0.2, 0.8]]).unwrap();
        assert_eq!(cols, vec![vec![0.1, 0.8]]);
    }

    #[test]
    fn test_score_columns_multiclass() {
        let cols = score_columns(&[vec![0.5, 0.3, 0.2], vec![0.1, 0.1, 0.8]]).unwrap();
        assert_eq!(cols.len(), 3);
        assert_eq!(cols[2], vec![0.2, 0.8]);
    }

    #[test]
    fn test_score_columns_ragged() {
        assert!(score_columns(&[vec![0.5, 0.5], vec![1.0]]).is_err());
    }
}
