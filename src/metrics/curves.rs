//! Threshold curves for binary scores
//!
//! All curves are built from the same pass: sort samples by decreasing
//! score and accumulate true/false positive counts at every distinct
//! threshold.

use super::classification::{check_non_empty, check_same_length};
use crate::{Error, Result};

/// Points of a threshold curve.
///
/// `thresholds[i]` is the score cutoff producing point `(x[i], y[i])`.
/// Curves that append a synthetic end point carry one threshold fewer than
/// points.
#[derive(Debug, Clone, PartialEq)]
pub struct Curve {
    /// X coordinates
    pub x: Vec<f64>,
    /// Y coordinates
    pub y: Vec<f64>,
    /// Score thresholds
    pub thresholds: Vec<f64>,
}

impl Curve {
    /// Number of points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.x.len()
    }

    /// Whether the curve has no points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }
}

struct Counts {
    fps: Vec<f64>,
    tps: Vec<f64>,
    thresholds: Vec<f64>,
}

fn check_scores(score: &[f64]) -> Result<()> {
    if score.iter().any(|s| s.is_nan()) {
        return Err(Error::invalid("scores must not contain NaN"));
    }
    Ok(())
}

fn sort_desc(score: &[f64]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..score.len()).collect();
    order.sort_by(|&a, &b| score[b].total_cmp(&score[a]));
    order
}

fn binary_clf_counts(y_true: &[bool], score: &[f64]) -> Result<Counts> {
    check_non_empty(y_true.len(), "y_true")?;
    check_same_length(y_true.len(), score.len())?;
    check_scores(score)?;

    let order = sort_desc(score);
    let mut counts = Counts {
        fps: Vec::new(),
        tps: Vec::new(),
        thresholds: Vec::new(),
    };
    let (mut tp, mut fp) = (0.0, 0.0);

    for (pos, &i) in order.iter().enumerate() {
        if y_true[i] {
            tp += 1.0;
        } else {
            fp += 1.0;
        }
        let last_of_threshold = order
            .get(pos + 1)
            .map_or(true, |&next| score[next] != score[i]);
        if last_of_threshold {
            counts.tps.push(tp);
            counts.fps.push(fp);
            counts.thresholds.push(score[i]);
        }
    }

    Ok(counts)
}

/// Receiver operating characteristic curve.
///
/// Returns `x = fpr`, `y = tpr`. The first point is `(0, 0)` with an
/// infinite threshold.
///
/// # Errors
///
/// Returns error if inputs are empty, differ in length, contain NaN, or
/// `y_true` holds a single class.
#[allow(clippy::float_cmp)]
pub fn roc_curve(y_true: &[bool], score: &[f64]) -> Result<Curve> {
    let counts = binary_clf_counts(y_true, score)?;
    let positives = counts.tps.last().copied().unwrap_or(0.0);
    let negatives = counts.fps.last().copied().unwrap_or(0.0);

    if positives == 0.0 || negatives == 0.0 {
        return Err(Error::invalid(
            "ROC curve is undefined when y_true contains a single class",
        ));
    }

    let mut curve = Curve {
        x: vec![0.0],
        y: vec![0.0],
        thresholds: vec![f64::INFINITY],
    };
    curve.x.extend(counts.fps.iter().map(|fp| fp / negatives));
    curve.y.extend(counts.tps.iter().map(|tp| tp / positives));
    curve.thresholds.extend(counts.thresholds);
    Ok(curve)
}

/// Area under a curve using the trapezoidal rule.
///
/// # Errors
///
/// Returns error if fewer than two points are given, the lengths differ,
/// or `x` is not monotonic.
pub fn auc(x: &[f64], y: &[f64]) -> Result<f64> {
    check_same_length(x.len(), y.len())?;
    if x.len() < 2 {
        return Err(Error::invalid(format!(
            "at least 2 points are needed to compute area under curve, got {}",
            x.len()
        )));
    }

    let increasing = x.windows(2).all(|w| w[1] >= w[0]);
    let decreasing = x.windows(2).all(|w| w[1] <= w[0]);
    let direction = match (increasing, decreasing) {
        (true, _) => 1.0,
        (false, true) => -1.0,
        (false, false) => {
            return Err(Error::invalid("x is neither increasing nor decreasing"));
        }
    };

    let area: f64 = x
        .windows(2)
        .zip(y.windows(2))
        .map(|(xs, ys)| (xs[1] - xs[0]) * (ys[0] + ys[1]) / 2.0)
        .sum();

    Ok(direction * area)
}

/// Precision-recall curve.
///
/// Returns `x = recall` (decreasing), `y = precision`. Points past full
/// recall are dropped and the curve ends at recall 0, precision 1.
///
/// # Errors
///
/// Returns error if inputs are invalid or `y_true` has no positives.
#[allow(clippy::float_cmp)]
pub fn precision_recall_curve(y_true: &[bool], score: &[f64]) -> Result<Curve> {
    let counts = binary_clf_counts(y_true, score)?;
    let positives = counts.tps.last().copied().unwrap_or(0.0);
    if positives == 0.0 {
        return Err(Error::invalid(
            "precision-recall curve needs at least one positive sample",
        ));
    }

    let full_recall = counts
        .tps
        .iter()
        .position(|&tp| tp == positives)
        .unwrap_or(counts.tps.len() - 1);

    let mut curve = Curve {
        x: Vec::with_capacity(full_recall + 2),
        y: Vec::with_capacity(full_recall + 2),
        thresholds: Vec::with_capacity(full_recall + 1),
    };
    for i in (0..=full_recall).rev() {
        let tp = counts.tps[i];
        let fp = counts.fps[i];
        curve.x.push(tp / positives);
        curve.y.push(tp / (tp + fp));
        curve.thresholds.push(counts.thresholds[i]);
    }
    curve.x.push(0.0);
    curve.y.push(1.0);
    Ok(curve)
}

/// Average precision: precision weighted by recall increments.
///
/// # Errors
///
/// Same conditions as [`precision_recall_curve`].
pub fn average_precision(y_true: &[bool], score: &[f64]) -> Result<f64> {
    let curve = precision_recall_curve(y_true, score)?;
    let ap = curve
        .x
        .windows(2)
        .zip(&curve.y)
        .map(|(r, p)| (r[0] - r[1]) * p)
        .sum();
    Ok(ap)
}

/// Calibration curve with `n_bins` uniform bins over `[0, 1]`.
///
/// Returns `(prob_true, prob_pred)` for each non-empty bin, in bin order:
/// the observed fraction of positives and the mean predicted probability.
///
/// # Errors
///
/// Returns error if inputs are invalid, `n_bins` is zero, or any
/// probability lies outside `[0, 1]`.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn calibration_curve(
    y_true: &[bool],
    prob: &[f64],
    n_bins: usize,
) -> Result<(Vec<f64>, Vec<f64>)> {
    check_non_empty(y_true.len(), "y_true")?;
    check_same_length(y_true.len(), prob.len())?;
    check_scores(prob)?;
    if n_bins == 0 {
        return Err(Error::invalid("n_bins must be positive"));
    }
    if prob.iter().any(|p| !(0.0..=1.0).contains(p)) {
        return Err(Error::invalid("probabilities must lie in [0, 1]"));
    }

    let mut positives = vec![0.0; n_bins];
    let mut sums = vec![0.0; n_bins];
    let mut totals = vec![0usize; n_bins];

    for (&truth, &p) in y_true.iter().zip(prob) {
        let bin = ((p * n_bins as f64) as usize).min(n_bins - 1);
        totals[bin] += 1;
        sums[bin] += p;
        if truth {
            positives[bin] += 1.0;
        }
    }

    let (prob_true, prob_pred) = (0..n_bins)
        .filter(|&b| totals[b] > 0)
        .map(|b| {
            let n = totals[b] as f64;
            (positives[b] / n, sums[b] / n)
        })
        .unzip();

    Ok((prob_true, prob_pred))
}

/// Cumulative gain curve.
///
/// Returns `x` = fraction of samples targeted (by decreasing score) and
/// `y` = fraction of all positives captured, starting at `(0, 0)`.
///
/// # Errors
///
/// Returns error if inputs are invalid or `y_true` has no positives.
#[allow(clippy::cast_precision_loss)]
pub fn cumulative_gain(y_true: &[bool], score: &[f64]) -> Result<Curve> {
    check_non_empty(y_true.len(), "y_true")?;
    check_same_length(y_true.len(), score.len())?;
    check_scores(score)?;

    let positives = y_true.iter().filter(|&&t| t).count();
    if positives == 0 {
        return Err(Error::invalid("cumulative gain needs at least one positive sample"));
    }

    let n = y_true.len() as f64;
    let order = sort_desc(score);
    let mut curve = Curve {
        x: vec![0.0],
        y: vec![0.0],
        thresholds: vec![f64::INFINITY],
    };
    let mut captured = 0usize;
    for (pos, &i) in order.iter().enumerate() {
        if y_true[i] {
            captured += 1;
        }
        curve.x.push((pos + 1) as f64 / n);
        curve.y.push(captured as f64 / positives as f64);
        curve.thresholds.push(score[i]);
    }
    Ok(curve)
}
