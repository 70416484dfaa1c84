//! Grid search results plot

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{Axes, Figure, FigureConfig, Plot};
use crate::{Error, Result};

/// Score of one parameter combination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridSearchResult {
    /// Parameter values of this combination
    pub params: BTreeMap<String, Value>,
    /// Mean cross-validation score
    pub mean_score: f64,
    /// Standard deviation of the cross-validation score
    pub std_score: f64,
}

impl GridSearchResult {
    /// Create a result entry.
    #[must_use]
    pub fn new(params: BTreeMap<String, Value>, mean_score: f64, std_score: f64) -> Self {
        Self {
            params,
            mean_score,
            std_score,
        }
    }
}

/// Score against one varying parameter, one line per combination of the
/// remaining parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridSearch {
    results: Vec<GridSearchResult>,
    change: String,
    subset: BTreeMap<String, Vec<Value>>,
}

impl GridSearch {
    /// Plot how the score changes with parameter `change`.
    ///
    /// # Errors
    ///
    /// Returns error if `results` is empty or some result lacks `change`.
    pub fn new(results: Vec<GridSearchResult>, change: impl Into<String>) -> Result<Self> {
        let change = change.into();
        crate::metrics::check_non_empty(results.len(), "grid search results")?;
        if results.iter().any(|r| !r.params.contains_key(&change)) {
            return Err(Error::NotFound(format!(
                "parameter '{change}' is not present in every grid search result"
            )));
        }
        Ok(Self {
            results,
            change,
            subset: BTreeMap::new(),
        })
    }

    /// Keep only results where `param` takes one of `values`.
    ///
    /// # Errors
    ///
    /// Returns error if `param` is the varying parameter or is unknown.
    pub fn subset(mut self, param: impl Into<String>, values: Vec<Value>) -> Result<Self> {
        let param = param.into();
        if param == self.change {
            return Err(Error::invalid(format!(
                "cannot restrict '{param}': it is the parameter being varied"
            )));
        }
        if !self.results.iter().any(|r| r.params.contains_key(&param)) {
            return Err(Error::NotFound(format!("parameter '{param}'")));
        }
        self.subset.insert(param, values);
        Ok(self)
    }

    /// Varying parameter name.
    #[must_use]
    pub fn change(&self) -> &str {
        &self.change
    }

    fn selected(&self) -> impl Iterator<Item = &GridSearchResult> {
        self.results.iter().filter(|r| {
            self.subset.iter().all(|(param, allowed)| {
                r.params.get(param).is_some_and(|v| allowed.contains(v))
            })
        })
    }

    /// Lines to draw: label → `(x, mean_score)` points sorted by `x`.
    ///
    /// Numeric values of the varying parameter are used as-is; other values
    /// are placed at their index in sorted order.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn series(&self) -> BTreeMap<String, Vec<(f64, f64)>> {
        let mut categories: Vec<String> = self
            .results
            .iter()
            .filter_map(|r| r.params.get(&self.change))
            .filter(|v| !v.is_number())
            .map(Value::to_string)
            .collect();
        categories.sort();
        categories.dedup();

        let mut series: BTreeMap<String, Vec<(f64, f64)>> = BTreeMap::new();
        for result in self.selected() {
            let Some(value) = result.params.get(&self.change) else {
                continue;
            };
            let x = value.as_f64().unwrap_or_else(|| {
                let key = value.to_string();
                categories.iter().position(|c| *c == key).unwrap_or(0) as f64
            });
            let label = result
                .params
                .iter()
                .filter(|(k, _)| **k != self.change)
                .map(|(k, v)| format!("{k}: {}", display(v)))
                .collect::<Vec<_>>()
                .join(", ");
            series.entry(label).or_default().push((x, result.mean_score));
        }
        for points in series.values_mut() {
            points.sort_by(|a, b| a.0.total_cmp(&b.0));
        }
        series
    }
}

fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

impl Plot for GridSearch {
    const CLASS: &'static str = "GridSearch";

    fn plot_with(&self, config: &FigureConfig) -> Figure {
        let mut axes = Axes::new(format!("Grid search results ({})", self.change))
            .x_label(self.change.clone())
            .y_label("Mean score");
        for (label, points) in self.series() {
            let (x, y): (Vec<f64>, Vec<f64>) = points.into_iter().unzip();
            let label = if label.is_empty() { None } else { Some(label) };
            axes.line(&x, &y, label);
        }
        Figure::single(axes, config.clone())
    }
}
