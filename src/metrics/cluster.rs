//! K-means inertia for elbow curves

use super::classification::check_non_empty;
use crate::{Error, Result};

fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y).powi(2)).sum()
}

fn nearest(point: &[f64], centroids: &[Vec<f64>]) -> (usize, f64) {
    centroids
        .iter()
        .enumerate()
        .map(|(i, c)| (i, squared_distance(point, c)))
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .unwrap_or((0, 0.0))
}

/// Within-cluster sum of squared distances after Lloyd's k-means.
///
/// Initial centroids are `k` points spread evenly over the dataset order,
/// so the result is deterministic. A cluster that loses all its points
/// keeps its previous centroid.
///
/// # Errors
///
/// Returns error if `x` is empty, rows differ in width, or `k` is not in
/// `1..=x.len()`.
#[allow(clippy::cast_precision_loss)]
pub fn kmeans_inertia(x: &[Vec<f64>], k: usize, max_iter: usize) -> Result<f64> {
    check_non_empty(x.len(), "x")?;
    let width = x[0].len();
    if let Some(row) = x.iter().find(|row| row.len() != width) {
        return Err(Error::ShapeMismatch {
            expected: format!("{width} columns"),
            actual: format!("{} columns", row.len()),
        });
    }
    if k == 0 || k > x.len() {
        return Err(Error::invalid(format!(
            "k must be between 1 and the number of samples ({}), got {k}",
            x.len()
        )));
    }

    let mut centroids: Vec<Vec<f64>> = (0..k).map(|i| x[i * x.len() / k].clone()).collect();
    let mut assignment = vec![usize::MAX; x.len()];

    for _ in 0..max_iter.max(1) {
        let mut changed = false;
        for (point, slot) in x.iter().zip(assignment.iter_mut()) {
            let (cluster, _) = nearest(point, &centroids);
            if *slot != cluster {
                *slot = cluster;
                changed = true;
            }
        }
        if !changed {
            break;
        }

        let mut sums = vec![vec![0.0; width]; k];
        let mut counts = vec![0usize; k];
        for (point, &cluster) in x.iter().zip(&assignment) {
            counts[cluster] += 1;
            for (s, v) in sums[cluster].iter_mut().zip(point) {
                *s += v;
            }
        }
        for ((centroid, sum), count) in centroids.iter_mut().zip(sums).zip(counts) {
            if count > 0 {
                *centroid = sum.into_iter().map(|s| s / count as f64).collect();
            }
        }
    }

    Ok(x.iter().map(|point| nearest(point, &centroids).1).sum())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_blobs() -> Vec<Vec<f64>> {
        vec![
            vec![0.0, 0.0],
            vec![0.0, 1.0],
            vec![10.0, 10.0],
            vec![10.0, 11.0],
        ]
    }

    #[test]
    fn test_inertia_decreases_with_k() {
        let x = two_blobs();
        let one = kmeans_inertia(&x, 1, 100).unwrap();
        let two = kmeans_inertia(&x, 2, 100).unwrap();
        let four = kmeans_inertia(&x, 4, 100).unwrap();
        assert!(one > two);
        assert!((two - 1.0).abs() < 1e-12);
        assert!(four.abs() < 1e-12);
    }

    #[test]
    fn test_invalid_k() {
        assert!(kmeans_inertia(&two_blobs(), 0, 10).is_err());
        assert!(kmeans_inertia(&two_blobs(), 5, 10).is_err());
    }

    #[test]
    fn test_ragged_rows() {
        let x = vec![vec![0.0], vec![1.0, 2.0]];
        assert!(matches!(
            kmeans_inertia(&x, 1, 10),
            Err(Error::ShapeMismatch { .. })
        ));
    }
}
