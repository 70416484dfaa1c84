//! Elbow curve for choosing the number of clusters

use serde::{Deserialize, Serialize};

use super::{Axes, Figure, FigureConfig, Plot};
use crate::metrics::kmeans_inertia;
use crate::Result;

const MAX_ITER: usize = 300;

/// Within-cluster sum of squares for each candidate `k`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElbowCurve {
    ks: Vec<usize>,
    inertias: Vec<f64>,
}

impl ElbowCurve {
    /// Build from precomputed inertias.
    ///
    /// # Errors
    ///
    /// Returns error if the lists are empty or differ in length.
    pub fn new(ks: Vec<usize>, inertias: Vec<f64>) -> Result<Self> {
        crate::metrics::check_non_empty(ks.len(), "ks")?;
        crate::metrics::check_same_length(ks.len(), inertias.len())?;
        Ok(Self { ks, inertias })
    }

    /// Run k-means on `x` for every `k` in `ks`.
    ///
    /// # Errors
    ///
    /// Returns error if `x` is empty or ragged, or any `k` is out of range.
    pub fn from_raw_data(x: &[Vec<f64>], ks: &[usize]) -> Result<Self> {
        let inertias = ks
            .iter()
            .map(|&k| kmeans_inertia(x, k, MAX_ITER))
            .collect::<Result<Vec<f64>>>()?;
        Self::new(ks.to_vec(), inertias)
    }

    /// Candidate cluster counts.
    #[must_use]
    pub fn ks(&self) -> &[usize] {
        &self.ks
    }

    /// Sum of squared errors per `k`.
    #[must_use]
    pub fn inertias(&self) -> &[f64] {
        &self.inertias
    }
}

impl Plot for ElbowCurve {
    const CLASS: &'static str = "ElbowCurve";

    #[allow(clippy::cast_precision_loss)]
    fn plot_with(&self, config: &FigureConfig) -> Figure {
        let ks: Vec<f64> = self.ks.iter().map(|&k| k as f64).collect();
        let mut axes = Axes::new("Elbow Plot")
            .x_label("Number of clusters")
            .y_label("Sum of squared errors");
        axes.line(&ks, &self.inertias, None);
        axes.scatter(&ks, &self.inertias, None);
        Figure::single(axes, config.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_raw_data() {
        let x = vec![vec![0.0], vec![0.5], vec![10.0], vec![10.5]];
        let elbow = ElbowCurve::from_raw_data(&x, &[1, 2, 3]).unwrap();
        assert_eq!(elbow.ks(), &[1, 2, 3]);
        assert!(elbow.inertias()[0] > elbow.inertias()[1]);
    }

    #[test]
    fn test_new_length_mismatch() {
        assert!(ElbowCurve::new(vec![1, 2], vec![1.0]).is_err());
    }
}
