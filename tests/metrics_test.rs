//! Metric values checked against hand-computed results

use skeval::metrics::{
    accuracy_score, auc, average_precision, calibration_curve, check_array_balance,
    confusion_matrix, cumulative_gain, kmeans_inertia, mean_absolute_error, mean_squared_error,
    normalize_rows, precision_recall_curve, precision_recall_fscore_support, r2_score, roc_curve,
    Range,
};
use skeval::Error;

const TRUTH: [bool; 4] = [false, false, true, true];
const SCORES: [f64; 4] = [0.1, 0.4, 0.35, 0.8];

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

// =============================================================================
// Curves
// =============================================================================

#[test]
fn test_roc_curve_points() {
    let roc = roc_curve(&TRUTH, &SCORES).unwrap();
    assert_eq!(roc.x, vec![0.0, 0.0, 0.5, 0.5, 1.0]);
    assert_eq!(roc.y, vec![0.0, 0.5, 0.5, 1.0, 1.0]);
    assert!(roc.thresholds[0].is_infinite());
    assert_eq!(&roc.thresholds[1..], &[0.8, 0.4, 0.35, 0.1]);
    assert!(close(auc(&roc.x, &roc.y).unwrap(), 0.75));
}

#[test]
fn test_roc_curve_single_class() {
    let err = roc_curve(&[true, true], &[0.2, 0.9]).unwrap_err();
    assert!(matches!(err, Error::InvalidInput(_)));
}

#[test]
fn test_roc_curve_rejects_nan() {
    assert!(roc_curve(&TRUTH, &[0.1, f64::NAN, 0.3, 0.4]).is_err());
}

#[test]
fn test_auc_decreasing_x() {
    assert!(close(auc(&[1.0, 0.5, 0.0], &[1.0, 1.0, 1.0]).unwrap(), 1.0));
    assert!(auc(&[0.0, 1.0, 0.5], &[0.0, 1.0, 1.0]).is_err());
    assert!(auc(&[0.0], &[0.0]).is_err());
}

#[test]
fn test_precision_recall_curve_and_ap() {
    let pr = precision_recall_curve(&TRUTH, &SCORES).unwrap();
    assert_eq!(pr.x, vec![1.0, 0.5, 0.5, 0.0]);
    assert!(close(pr.y[0], 2.0 / 3.0));
    assert_eq!(pr.y.last(), Some(&1.0));
    assert!(close(average_precision(&TRUTH, &SCORES).unwrap(), 5.0 / 6.0));
}

#[test]
fn test_calibration_curve_skips_empty_bins() {
    let (prob_true, prob_pred) =
        calibration_curve(&TRUTH, &[0.1, 0.15, 0.9, 0.8], 4).unwrap();
    assert_eq!(prob_true, vec![0.0, 1.0]);
    assert!(close(prob_pred[0], 0.125));
    assert!(close(prob_pred[1], 0.85));
    assert!(calibration_curve(&TRUTH, &[0.1, 0.2, 1.5, 0.7], 4).is_err());
    assert!(calibration_curve(&TRUTH, &SCORES, 0).is_err());
}

#[test]
fn test_cumulative_gain() {
    let gain = cumulative_gain(&TRUTH, &SCORES).unwrap();
    assert_eq!(gain.x, vec![0.0, 0.25, 0.5, 0.75, 1.0]);
    assert_eq!(gain.y, vec![0.0, 0.5, 0.5, 1.0, 1.0]);
}

// =============================================================================
// Classification
// =============================================================================

#[test]
fn test_confusion_matrix_union_of_labels() {
    let (labels, cm) = confusion_matrix(&[0, 1, 2, 2], &[0, 2, 2, 1]).unwrap();
    assert_eq!(labels, vec![0, 1, 2]);
    assert_eq!(cm, vec![vec![1, 0, 0], vec![0, 0, 1], vec![0, 1, 1]]);

    let normalized = normalize_rows(&[vec![1, 3], vec![0, 0]]);
    assert_eq!(normalized, vec![vec![0.25, 0.75], vec![0.0, 0.0]]);
}

#[test]
fn test_scores_undefined_ratio_is_zero() {
    let scores = precision_recall_fscore_support(&[0, 0], &[0, 1]).unwrap();
    assert_eq!(scores[1].label, 1);
    assert_eq!(scores[1].precision, 0.0);
    assert_eq!(scores[1].recall, 0.0);
    assert_eq!(scores[1].f1, 0.0);
    assert_eq!(scores[1].support, 0);
    assert!(close(accuracy_score(&[0, 0], &[0, 1]).unwrap(), 0.5));
}

#[test]
fn test_length_mismatch() {
    assert!(matches!(
        confusion_matrix(&[0, 1], &[0]),
        Err(Error::ShapeMismatch { .. })
    ));
    assert!(accuracy_score(&[], &[]).is_err());
}

#[test]
fn test_balance_and_range() {
    assert!(check_array_balance(&[0, 0, 1]).unwrap());
    assert!(!check_array_balance(&[0, 0, 0, 1]).unwrap());
    let low = Range::new(0.0, 0.6);
    assert!(low.contains(0.6));
    assert!(!low.contains(0.61));
}

// =============================================================================
// Regression and clustering
// =============================================================================

#[test]
fn test_regression_errors() {
    let y_true = [3.0, -0.5, 2.0, 7.0];
    let y_pred = [2.5, 0.0, 2.0, 8.0];
    assert!(close(mean_absolute_error(&y_true, &y_pred).unwrap(), 0.5));
    assert!(close(mean_squared_error(&y_true, &y_pred).unwrap(), 0.375));
    assert!(close(r2_score(&y_true, &y_pred).unwrap(), 0.948_608_137_044_967_9));
    assert!(close(r2_score(&[1.0, 1.0], &[1.0, 1.0]).unwrap(), 1.0));
    assert!(close(r2_score(&[1.0, 1.0], &[1.0, 2.0]).unwrap(), 0.0));
}

#[test]
fn test_kmeans_inertia() {
    let x = vec![
        vec![0.0, 0.0],
        vec![0.0, 2.0],
        vec![10.0, 0.0],
        vec![10.0, 2.0],
    ];
    assert!(close(kmeans_inertia(&x, 1, 100).unwrap(), 104.0));
    assert!(close(kmeans_inertia(&x, 2, 100).unwrap(), 4.0));
    assert!(close(kmeans_inertia(&x, 4, 100).unwrap(), 0.0));
    assert!(kmeans_inertia(&x, 5, 100).is_err());
}
