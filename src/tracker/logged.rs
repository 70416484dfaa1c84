//! Values stored by [`Experiment`](super::Experiment) log calls

use serde_json::{json, Value};

use crate::plot::{
    escape, CalibrationCurve, ClassificationReport, ClassificationReportComparison,
    ClassificationReportDiff, ConfusionMatrix, ConfusionMatrixComparison, ConfusionMatrixDiff,
    CumulativeGain, ElbowCurve, Figure, GridSearch, Plot, PrecisionRecall, PredictionError,
    Residuals, Roc, TargetAnalysis, CLASS_KEY,
};

const TYPE_KEY: &str = "type";
const FIGURE_TYPE: &str = "figure";
const SVG_KEY: &str = "svg";

/// A logged parameter, restored to its richest known form.
#[derive(Debug, Clone, PartialEq)]
pub enum Logged {
    /// Plain JSON value
    Value(Value),
    /// Rendered figure (SVG document)
    Figure(String),
    /// Confusion matrix dump
    ConfusionMatrix(ConfusionMatrix),
    /// Classification report dump
    ClassificationReport(ClassificationReport),
    /// Any other plot dump, rendered with the default layout
    Plot {
        /// Class tag of the dump
        class: String,
        /// Rendered plot
        figure: Figure,
    },
}

impl Logged {
    /// JSON stored for a figure.
    #[must_use]
    pub fn figure_value(figure: &Figure) -> Value {
        json!({ TYPE_KEY: FIGURE_TYPE, SVG_KEY: figure.to_svg() })
    }

    /// Classify a stored JSON value.
    ///
    /// Objects tagged as figures or as plot dumps are restored; anything
    /// else, including dumps that fail to load, stays a plain value.
    #[must_use]
    pub fn from_value(value: Value) -> Self {
        let Some(object) = value.as_object() else {
            return Self::Value(value);
        };

        if object.get(TYPE_KEY).and_then(Value::as_str) == Some(FIGURE_TYPE) {
            if let Some(svg) = object.get(SVG_KEY).and_then(Value::as_str) {
                return Self::Figure(svg.to_string());
            }
        }

        match object.get(CLASS_KEY).and_then(Value::as_str) {
            Some(class) if class == ConfusionMatrix::CLASS => {
                ConfusionMatrix::from_json(value.clone())
                    .map_or(Self::Value(value), Self::ConfusionMatrix)
            }
            Some(class) if class == ClassificationReport::CLASS => {
                ClassificationReport::from_json(value.clone())
                    .map_or(Self::Value(value), Self::ClassificationReport)
            }
            Some(class) => {
                let class = class.to_string();
                match render_dump(&class, value.clone()) {
                    Some(figure) => Self::Plot { class, figure },
                    None => Self::Value(value),
                }
            }
            None => Self::Value(value),
        }
    }

    /// HTML for display in query tables.
    #[must_use]
    pub fn to_html(&self) -> String {
        match self {
            Self::Value(v) => escape(&v.to_string()),
            Self::Figure(svg) => svg.clone(),
            Self::ConfusionMatrix(cm) => cm.plot().to_html(),
            Self::ClassificationReport(report) => report.plot().to_html(),
            Self::Plot { figure, .. } => figure.to_html(),
        }
    }
}

fn render<P: Plot>(value: Value) -> Option<Figure> {
    P::from_json(value).ok().map(|plot| plot.plot())
}

/// Load a dump by class tag and render it; `None` for unknown tags.
fn render_dump(class: &str, value: Value) -> Option<Figure> {
    match class {
        Roc::CLASS => render::<Roc>(value),
        PrecisionRecall::CLASS => render::<PrecisionRecall>(value),
        CalibrationCurve::CLASS => render::<CalibrationCurve>(value),
        CumulativeGain::CLASS => render::<CumulativeGain>(value),
        TargetAnalysis::CLASS => render::<TargetAnalysis>(value),
        ElbowCurve::CLASS => render::<ElbowCurve>(value),
        GridSearch::CLASS => render::<GridSearch>(value),
        PredictionError::CLASS => render::<PredictionError>(value),
        Residuals::CLASS => render::<Residuals>(value),
        ConfusionMatrixComparison::CLASS => render::<ConfusionMatrixComparison>(value),
        ConfusionMatrixDiff::CLASS => render::<ConfusionMatrixDiff>(value),
        ClassificationReportComparison::CLASS => {
            render::<ClassificationReportComparison>(value)
        }
        ClassificationReportDiff::CLASS => render::<ClassificationReportDiff>(value),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plot::{Axes, FigureConfig};

    #[test]
    fn test_plain_value() {
        assert_eq!(Logged::from_value(json!(3)), Logged::Value(json!(3)));
        assert_eq!(
            Logged::from_value(json!({"a": 1})),
            Logged::Value(json!({"a": 1}))
        );
    }

    #[test]
    fn test_figure_round_trip() {
        let figure = Figure::single(Axes::new("t"), FigureConfig::default());
        let logged = Logged::from_value(Logged::figure_value(&figure));
        assert_eq!(logged, Logged::Figure(figure.to_svg()));
    }

    #[test]
    fn test_confusion_matrix_restored() {
        let cm = ConfusionMatrix::from_raw_data(&[0, 1], &[0, 0]).unwrap();
        let logged = Logged::from_value(cm.to_json().unwrap());
        assert_eq!(logged, Logged::ConfusionMatrix(cm));
    }

    #[test]
    fn test_other_plots_restored() {
        let y_score = [vec![0.1], vec![0.4], vec![0.35], vec![0.8]];
        let roc = Roc::from_raw_data(&[0, 0, 1, 1], &y_score).unwrap();
        let logged = Logged::from_value(roc.to_json().unwrap());
        assert_eq!(
            logged,
            Logged::Plot {
                class: "ROC".to_string(),
                figure: roc.plot()
            }
        );
        assert!(logged.to_html().contains("<img"));

        let a = ConfusionMatrix::from_raw_data(&[0, 1], &[0, 0]).unwrap();
        let b = ConfusionMatrix::from_raw_data(&[0, 1], &[0, 1]).unwrap();
        let diff = (a - b).unwrap();
        assert!(matches!(
            Logged::from_value(diff.to_json().unwrap()),
            Logged::Plot { class, .. } if class == "ConfusionMatrixSub"
        ));
    }

    #[test]
    fn test_unknown_class_stays_value() {
        let value = json!({"class": "Heatmap", "data": [1, 2]});
        assert_eq!(Logged::from_value(value.clone()), Logged::Value(value));
    }

    #[test]
    fn test_corrupt_dump_stays_value() {
        let value = json!({"class": "ConfusionMatrix", "cm": "nope"});
        assert_eq!(Logged::from_value(value.clone()), Logged::Value(value));
    }
}
