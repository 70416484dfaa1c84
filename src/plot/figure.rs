//! SVG figures
//!
//! A [`Figure`] is a row of [`Axes`] panels. Each panel holds marks (lines,
//! scatter points, bars or a heatmap) in data coordinates and is rendered
//! to a standalone SVG document.

use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::Result;

const PALETTE: [&str; 10] = [
    "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f",
    "#bcbd22", "#17becf",
];

const N_TICKS: usize = 5;

/// Figure size, layout and title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FigureConfig {
    width: u32,
    height: u32,
    margin: u32,
    title: Option<String>,
}

impl Default for FigureConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl FigureConfig {
    /// 640×480 with a 60px margin and no title override.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            width: 640,
            height: 480,
            margin: 60,
            title: None,
        }
    }

    /// Set the total width in pixels.
    #[must_use]
    pub fn width(mut self, width: u32) -> Self {
        self.width = width;
        self
    }

    /// Set the total height in pixels.
    #[must_use]
    pub fn height(mut self, height: u32) -> Self {
        self.height = height;
        self
    }

    /// Set the margin around each panel in pixels.
    #[must_use]
    pub fn margin(mut self, margin: u32) -> Self {
        self.margin = margin;
        self
    }

    /// Title for the whole figure.
    ///
    /// A single-panel figure shows it in place of the panel title; a row of
    /// panels shows it above them.
    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Title override, if set.
    #[must_use]
    pub fn get_title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Total width in pixels.
    #[must_use]
    pub const fn get_width(&self) -> u32 {
        self.width
    }

    /// Total height in pixels.
    #[must_use]
    pub const fn get_height(&self) -> u32 {
        self.height
    }
}

/// A drawable element of an [`Axes`].
#[derive(Debug, Clone, PartialEq)]
pub enum Mark {
    /// Connected line through the points
    Line {
        /// Points in data coordinates
        points: Vec<(f64, f64)>,
        /// Legend entry
        label: Option<String>,
        /// Draw as a dashed reference line
        dashed: bool,
    },
    /// Unconnected points
    Scatter {
        /// Points in data coordinates
        points: Vec<(f64, f64)>,
        /// Legend entry
        label: Option<String>,
    },
    /// Vertical bars over categories
    Bars {
        /// Category names
        categories: Vec<String>,
        /// Bar heights
        values: Vec<f64>,
    },
    /// Annotated colour grid
    Heatmap {
        /// Row names, top to bottom
        rows: Vec<String>,
        /// Column names, left to right
        columns: Vec<String>,
        /// Cell values used for colour intensity
        values: Vec<Vec<f64>>,
        /// Cell text
        annotations: Vec<Vec<String>>,
    },
}

impl Mark {
    fn label(&self) -> Option<&str> {
        match self {
            Self::Line { label, .. } | Self::Scatter { label, .. } => label.as_deref(),
            _ => None,
        }
    }

    fn points(&self) -> &[(f64, f64)] {
        match self {
            Self::Line { points, .. } | Self::Scatter { points, .. } => points,
            _ => &[],
        }
    }
}

/// A single plotting panel.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Axes {
    title: String,
    x_label: String,
    y_label: String,
    x_range: Option<(f64, f64)>,
    y_range: Option<(f64, f64)>,
    marks: Vec<Mark>,
}

impl Axes {
    /// Create an empty panel with a title.
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Set the x axis label.
    #[must_use]
    pub fn x_label(mut self, label: impl Into<String>) -> Self {
        self.x_label = label.into();
        self
    }

    /// Set the y axis label.
    #[must_use]
    pub fn y_label(mut self, label: impl Into<String>) -> Self {
        self.y_label = label.into();
        self
    }

    /// Fix the x axis limits.
    #[must_use]
    pub const fn x_range(mut self, min: f64, max: f64) -> Self {
        self.x_range = Some((min, max));
        self
    }

    /// Fix the y axis limits.
    #[must_use]
    pub const fn y_range(mut self, min: f64, max: f64) -> Self {
        self.y_range = Some((min, max));
        self
    }

    /// Add a solid line.
    pub fn line(&mut self, x: &[f64], y: &[f64], label: Option<String>) {
        self.marks.push(Mark::Line {
            points: x.iter().copied().zip(y.iter().copied()).collect(),
            label,
            dashed: false,
        });
    }

    /// Add a dashed reference line.
    pub fn dashed_line(&mut self, x: &[f64], y: &[f64], label: Option<String>) {
        self.marks.push(Mark::Line {
            points: x.iter().copied().zip(y.iter().copied()).collect(),
            label,
            dashed: true,
        });
    }

    /// Add scatter points.
    pub fn scatter(&mut self, x: &[f64], y: &[f64], label: Option<String>) {
        self.marks.push(Mark::Scatter {
            points: x.iter().copied().zip(y.iter().copied()).collect(),
            label,
        });
    }

    /// Add bars.
    pub fn bars(&mut self, categories: Vec<String>, values: Vec<f64>) {
        self.marks.push(Mark::Bars { categories, values });
    }

    /// Add an annotated heatmap.
    pub fn heatmap(
        &mut self,
        rows: Vec<String>,
        columns: Vec<String>,
        values: Vec<Vec<f64>>,
        annotations: Vec<Vec<String>>,
    ) {
        self.marks.push(Mark::Heatmap {
            rows,
            columns,
            values,
            annotations,
        });
    }

    /// Panel title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Marks in drawing order.
    #[must_use]
    pub fn marks(&self) -> &[Mark] {
        &self.marks
    }

    /// Legend entries in drawing order.
    #[must_use]
    pub fn legend_labels(&self) -> Vec<&str> {
        self.marks.iter().filter_map(Mark::label).collect()
    }

    fn data_range(&self, pick: fn(&(f64, f64)) -> f64) -> (f64, f64) {
        let (min, max) = self
            .marks
            .iter()
            .flat_map(Mark::points)
            .map(pick)
            .filter(|v| v.is_finite())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                (lo.min(v), hi.max(v))
            });
        if min > max {
            (0.0, 1.0)
        } else if (max - min).abs() < f64::EPSILON {
            (min - 0.5, max + 0.5)
        } else {
            let pad = (max - min) * 0.05;
            (min - pad, max + pad)
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn render(&self, out: &mut String, frame: Frame, title: &str) {
        out.push_str(&format!(
            r#"<text x="{:.1}" y="{:.1}" text-anchor="middle" font-size="14">{}</text>"#,
            frame.left + frame.width / 2.0,
            frame.top - 12.0,
            escape(title)
        ));

        if let Some(Mark::Heatmap {
            rows,
            columns,
            values,
            annotations,
        }) = self.marks.iter().find(|m| matches!(m, Mark::Heatmap { .. }))
        {
            render_heatmap(out, frame, rows, columns, values, annotations);
            return;
        }

        out.push_str(&format!(
            r##"<rect x="{:.1}" y="{:.1}" width="{:.1}" height="{:.1}" fill="none" stroke="#333"/>"##,
            frame.left, frame.top, frame.width, frame.height
        ));
        out.push_str(&format!(
            r#"<text x="{:.1}" y="{:.1}" text-anchor="middle" font-size="12">{}</text>"#,
            frame.left + frame.width / 2.0,
            frame.top + frame.height + 40.0,
            escape(&self.x_label)
        ));
        out.push_str(&format!(
            r#"<text x="{x:.1}" y="{y:.1}" text-anchor="middle" font-size="12" transform="rotate(-90 {x:.1} {y:.1})">{}</text>"#,
            escape(&self.y_label),
            x = frame.left - 45.0,
            y = frame.top + frame.height / 2.0,
        ));

        if let Some(Mark::Bars { categories, values }) =
            self.marks.iter().find(|m| matches!(m, Mark::Bars { .. }))
        {
            let top = values.iter().copied().fold(0.0, f64::max).max(1.0) * 1.1;
            render_y_ticks(out, frame, (0.0, top));
            render_bars(out, frame, categories, values, top);
            return;
        }

        let x_range = self.x_range.unwrap_or_else(|| self.data_range(|p| p.0));
        let y_range = self.y_range.unwrap_or_else(|| self.data_range(|p| p.1));
        render_y_ticks(out, frame, y_range);
        for i in 0..N_TICKS {
            let v = x_range.0 + (x_range.1 - x_range.0) * i as f64 / (N_TICKS - 1) as f64;
            let px = frame.map_x(v, x_range);
            out.push_str(&format!(
                r#"<text x="{px:.1}" y="{:.1}" text-anchor="middle" font-size="10">{}</text>"#,
                frame.top + frame.height + 16.0,
                tick(v)
            ));
        }

        let mut color = 0;
        for mark in &self.marks {
            match mark {
                Mark::Line {
                    points, dashed, ..
                } => {
                    let coords: Vec<String> = points
                        .iter()
                        .filter(|(x, y)| x.is_finite() && y.is_finite())
                        .map(|&(x, y)| {
                            format!("{:.2},{:.2}", frame.map_x(x, x_range), frame.map_y(y, y_range))
                        })
                        .collect();
                    if *dashed {
                        out.push_str(&format!(
                            r##"<polyline points="{}" fill="none" stroke="#000" stroke-dasharray="6,4"/>"##,
                            coords.join(" ")
                        ));
                    } else {
                        out.push_str(&format!(
                            r#"<polyline points="{}" fill="none" stroke="{}" stroke-width="2"/>"#,
                            coords.join(" "),
                            PALETTE[color % PALETTE.len()]
                        ));
                        color += 1;
                    }
                }
                Mark::Scatter { points, .. } => {
                    for &(x, y) in points.iter().filter(|(x, y)| x.is_finite() && y.is_finite()) {
                        out.push_str(&format!(
                            r#"<circle cx="{:.2}" cy="{:.2}" r="3" fill="{}" fill-opacity="0.6"/>"#,
                            frame.map_x(x, x_range),
                            frame.map_y(y, y_range),
                            PALETTE[color % PALETTE.len()]
                        ));
                    }
                    color += 1;
                }
                Mark::Bars { .. } | Mark::Heatmap { .. } => {}
            }
        }

        self.render_legend(out, frame);
    }

    #[allow(clippy::cast_precision_loss)]
    fn render_legend(&self, out: &mut String, frame: Frame) {
        let mut color = 0;
        let mut row = 0.0;
        for mark in &self.marks {
            let dashed = matches!(mark, Mark::Line { dashed: true, .. });
            let swatch = if dashed { "#000" } else { PALETTE[color % PALETTE.len()] };
            if !dashed {
                color += 1;
            }
            let Some(label) = mark.label() else { continue };
            let y = frame.top + 14.0 + row * 16.0;
            out.push_str(&format!(
                r#"<rect x="{:.1}" y="{:.1}" width="10" height="10" fill="{swatch}"/><text x="{:.1}" y="{:.1}" font-size="10">{}</text>"#,
                frame.left + 8.0,
                y - 9.0,
                frame.left + 22.0,
                y,
                escape(label)
            ));
            row += 1.0;
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Frame {
    left: f64,
    top: f64,
    width: f64,
    height: f64,
}

impl Frame {
    fn map_x(&self, v: f64, range: (f64, f64)) -> f64 {
        self.left + (v - range.0) / (range.1 - range.0) * self.width
    }

    fn map_y(&self, v: f64, range: (f64, f64)) -> f64 {
        self.top + self.height - (v - range.0) / (range.1 - range.0) * self.height
    }
}

#[allow(clippy::cast_precision_loss)]
fn render_y_ticks(out: &mut String, frame: Frame, range: (f64, f64)) {
    for i in 0..N_TICKS {
        let v = range.0 + (range.1 - range.0) * i as f64 / (N_TICKS - 1) as f64;
        out.push_str(&format!(
            r#"<text x="{:.1}" y="{:.1}" text-anchor="end" font-size="10">{}</text>"#,
            frame.left - 6.0,
            frame.map_y(v, range) + 3.0,
            tick(v)
        ));
    }
}

#[allow(clippy::cast_precision_loss)]
fn render_bars(out: &mut String, frame: Frame, categories: &[String], values: &[f64], top: f64) {
    let slot = frame.width / categories.len().max(1) as f64;
    for (i, (name, &value)) in categories.iter().zip(values).enumerate() {
        let x = frame.left + slot * i as f64 + slot * 0.15;
        let y = frame.map_y(value, (0.0, top));
        out.push_str(&format!(
            r#"<rect x="{x:.1}" y="{y:.1}" width="{:.1}" height="{:.1}" fill="{}"/>"#,
            slot * 0.7,
            frame.top + frame.height - y,
            PALETTE[0]
        ));
        out.push_str(&format!(
            r#"<text x="{:.1}" y="{:.1}" text-anchor="middle" font-size="10">{}</text>"#,
            x + slot * 0.35,
            frame.top + frame.height + 16.0,
            escape(name)
        ));
        out.push_str(&format!(
            r#"<text x="{:.1}" y="{:.1}" text-anchor="middle" font-size="10">{}</text>"#,
            x + slot * 0.35,
            y - 4.0,
            tick(value)
        ));
    }
}

#[allow(clippy::cast_precision_loss)]
fn render_heatmap(
    out: &mut String,
    frame: Frame,
    rows: &[String],
    columns: &[String],
    values: &[Vec<f64>],
    annotations: &[Vec<String>],
) {
    let cell_w = frame.width / columns.len().max(1) as f64;
    let cell_h = frame.height / rows.len().max(1) as f64;
    let max = values
        .iter()
        .flatten()
        .map(|v| v.abs())
        .fold(0.0, f64::max);

    for (r, row) in values.iter().enumerate() {
        for (c, &v) in row.iter().enumerate() {
            let intensity = if max > 0.0 { v.abs() / max } else { 0.0 };
            let x = frame.left + cell_w * c as f64;
            let y = frame.top + cell_h * r as f64;
            out.push_str(&format!(
                r##"<rect x="{x:.1}" y="{y:.1}" width="{cell_w:.1}" height="{cell_h:.1}" fill="{}" stroke="#fff"/>"##,
                blend(intensity, v < 0.0)
            ));
            let text = annotations
                .get(r)
                .and_then(|a| a.get(c))
                .map_or_else(|| tick(v), Clone::clone);
            let ink = if intensity > 0.6 { "#fff" } else { "#000" };
            out.push_str(&format!(
                r#"<text x="{:.1}" y="{:.1}" text-anchor="middle" font-size="12" fill="{ink}">{}</text>"#,
                x + cell_w / 2.0,
                y + cell_h / 2.0 + 4.0,
                escape(&text)
            ));
        }
    }
    for (r, name) in rows.iter().enumerate() {
        out.push_str(&format!(
            r#"<text x="{:.1}" y="{:.1}" text-anchor="end" font-size="11">{}</text>"#,
            frame.left - 6.0,
            frame.top + cell_h * (r as f64 + 0.5) + 4.0,
            escape(name)
        ));
    }
    for (c, name) in columns.iter().enumerate() {
        out.push_str(&format!(
            r#"<text x="{:.1}" y="{:.1}" text-anchor="middle" font-size="11">{}</text>"#,
            frame.left + cell_w * (c as f64 + 0.5),
            frame.top + frame.height + 16.0,
            escape(name)
        ));
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn blend(intensity: f64, negative: bool) -> String {
    let fade = (255.0 * (1.0 - intensity.clamp(0.0, 1.0))).round() as u8;
    if negative {
        format!("#ff{fade:02x}{fade:02x}")
    } else {
        format!("#{fade:02x}{fade:02x}ff")
    }
}

fn tick(v: f64) -> String {
    if (v - v.round()).abs() < 1e-9 && v.abs() < 1e9 {
        format!("{v:.0}")
    } else {
        format!("{v:.2}")
    }
}

/// Escape text for inclusion in XML/HTML.
#[must_use]
pub fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// A rendered chart made of one or more side-by-side panels.
#[derive(Debug, Clone, PartialEq)]
pub struct Figure {
    config: FigureConfig,
    axes: Vec<Axes>,
}

impl Figure {
    /// A figure with a single panel.
    #[must_use]
    pub fn single(axes: Axes, config: FigureConfig) -> Self {
        Self {
            config,
            axes: vec![axes],
        }
    }

    /// A figure with panels laid out left to right.
    #[must_use]
    pub fn row(axes: Vec<Axes>, config: FigureConfig) -> Self {
        Self { config, axes }
    }

    /// Panels, left to right.
    #[must_use]
    pub fn axes(&self) -> &[Axes] {
        &self.axes
    }

    /// Layout configuration.
    #[must_use]
    pub const fn config(&self) -> &FigureConfig {
        &self.config
    }

    /// Render to a standalone SVG document.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn to_svg(&self) -> String {
        let width = f64::from(self.config.width);
        let height = f64::from(self.config.height);
        let margin = f64::from(self.config.margin);
        let panel_width = width / self.axes.len().max(1) as f64;

        let mut out = format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{}" height="{}" viewBox="0 0 {} {}" font-family="sans-serif">"#,
            self.config.width, self.config.height, self.config.width, self.config.height
        );
        out.push_str(r#"<rect width="100%" height="100%" fill="white"/>"#);
        let single = self.axes.len() == 1;
        if let (Some(title), false) = (&self.config.title, single) {
            out.push_str(&format!(
                r#"<text x="{:.1}" y="{:.1}" text-anchor="middle" font-size="16">{}</text>"#,
                width / 2.0,
                margin / 3.0,
                escape(title)
            ));
        }
        for (i, axes) in self.axes.iter().enumerate() {
            let frame = Frame {
                left: panel_width * i as f64 + margin,
                top: margin,
                width: (panel_width - 1.5 * margin).max(10.0),
                height: (height - 2.0 * margin).max(10.0),
            };
            let title = match &self.config.title {
                Some(title) if single => title.as_str(),
                _ => axes.title.as_str(),
            };
            axes.render(&mut out, frame, title);
        }
        out.push_str("</svg>");
        out
    }

    /// Base64 data URI of the SVG.
    #[must_use]
    pub fn to_data_uri(&self) -> String {
        format!(
            "data:image/svg+xml;base64,{}",
            STANDARD.encode(self.to_svg())
        )
    }

    /// `<img>` tag embedding the figure.
    #[must_use]
    pub fn to_html(&self) -> String {
        format!(r#"<img src="{}"/>"#, self.to_data_uri())
    }

    /// Write the SVG to `path`.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be written.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, self.to_svg())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_svg_contains_title_and_legend() {
        let mut axes = Axes::new("ROC").x_label("FPR").y_label("TPR");
        axes.line(&[0.0, 1.0], &[0.0, 1.0], Some("model <a>".to_string()));
        axes.dashed_line(&[0.0, 1.0], &[0.0, 1.0], None);
        let svg = Figure::single(axes, FigureConfig::default()).to_svg();

        assert!(svg.starts_with("<svg"));
        assert!(svg.ends_with("</svg>"));
        assert!(svg.contains(">ROC<"));
        assert!(svg.contains("model &lt;a&gt;"));
        assert!(svg.contains("stroke-dasharray"));
    }

    #[test]
    fn test_heatmap_annotations() {
        let mut axes = Axes::new("CM");
        axes.heatmap(
            vec!["0".into(), "1".into()],
            vec!["0".into(), "1".into()],
            vec![vec![3.0, 1.0], vec![0.0, 4.0]],
            vec![vec!["3".into(), "1".into()], vec!["0".into(), "4".into()]],
        );
        let svg = Figure::single(axes, FigureConfig::default()).to_svg();
        assert_eq!(svg.matches("<rect").count(), 1 + 4);
        assert!(svg.contains(">4<"));
    }

    #[test]
    fn test_data_uri_prefix() {
        let fig = Figure::single(Axes::new("empty"), FigureConfig::new().width(100).height(100));
        assert!(fig.to_data_uri().starts_with("data:image/svg+xml;base64,"));
        assert!(fig.to_html().starts_with("<img src=\"data:image/svg+xml;base64,"));
    }

    #[test]
    fn test_config_title_override() {
        let config = FigureConfig::new().title("Validation <set>");
        assert_eq!(config.get_title(), Some("Validation <set>"));

        let svg = Figure::single(Axes::new("ROC"), config.clone()).to_svg();
        assert!(svg.contains(">Validation &lt;set&gt;<"));
        assert!(!svg.contains(">ROC<"));

        let svg = Figure::row(vec![Axes::new("a"), Axes::new("b")], config).to_svg();
        assert!(svg.contains(">Validation &lt;set&gt;<"));
        assert!(svg.contains(">a<"));
    }

    #[test]
    fn test_legend_labels_order() {
        let mut axes = Axes::new("t");
        axes.line(&[0.0], &[0.0], Some("a".into()));
        axes.scatter(&[0.0], &[0.0], None);
        axes.line(&[0.0], &[0.0], Some("b".into()));
        assert_eq!(axes.legend_labels(), vec!["a", "b"]);
    }

    #[test]
    fn test_blend_extremes() {
        assert_eq!(blend(0.0, false), "#ffffff");
        assert_eq!(blend(1.0, false), "#0000ff");
        assert_eq!(blend(1.0, true), "#ff0000");
    }
}
