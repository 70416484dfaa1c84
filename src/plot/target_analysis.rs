//! Target distribution bar chart

use serde::{Deserialize, Serialize};

use super::{Axes, Figure, FigureConfig, Plot};
use crate::metrics::{check_array_balance, class_counts};
use crate::Result;

/// Number of samples per class, with a balance verdict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetAnalysis {
    counts: Vec<(i64, usize)>,
    balanced: bool,
}

impl TargetAnalysis {
    /// Count classes in `y`.
    ///
    /// # Errors
    ///
    /// Returns error if `y` is empty.
    pub fn from_raw_data(y: &[i64]) -> Result<Self> {
        Ok(Self {
            balanced: check_array_balance(y)?,
            counts: class_counts(y),
        })
    }

    /// `(label, count)` pairs ordered by label.
    #[must_use]
    pub fn counts(&self) -> &[(i64, usize)] {
        &self.counts
    }

    /// Whether the classes are balanced.
    #[must_use]
    pub const fn is_balanced(&self) -> bool {
        self.balanced
    }
}

impl Plot for TargetAnalysis {
    const CLASS: &'static str = "TargetAnalysis";

    #[allow(clippy::cast_precision_loss)]
    fn plot_with(&self, config: &FigureConfig) -> Figure {
        let title = if self.balanced {
            "Target distribution"
        } else {
            "Target distribution (imbalanced)"
        };
        let mut axes = Axes::new(title).x_label("Class").y_label("Count");
        axes.bars(
            self.counts.iter().map(|(label, _)| label.to_string()).collect(),
            self.counts.iter().map(|&(_, count)| count as f64).collect(),
        );
        Figure::single(axes, config.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_and_balance() {
        let analysis = TargetAnalysis::from_raw_data(&[1, 0, 0, 0, 0, 0]).unwrap();
        assert_eq!(analysis.counts(), &[(0, 5), (1, 1)]);
        assert!(!analysis.is_balanced());
        assert!(analysis.plot().to_svg().contains("imbalanced"));
    }
}
