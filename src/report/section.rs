//! Report sections and HTML rendering

use std::path::Path;

use minijinja::{context, Environment};

use crate::plot::Figure;
use crate::Result;

const REPORT_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>{{ title }}</title>
<style>
body { font-family: sans-serif; max-width: 960px; margin: 2em auto; color: #222; }
.section { border-left: 4px solid #d62728; padding: 0 1em; margin-bottom: 1.5em; }
.section.ok { border-left-color: #2ca02c; }
.section img { max-width: 100%; }
</style>
</head>
<body>
<h1>{{ title }}</h1>
{% for section in sections %}<div class="section{% if section.is_ok %} ok{% endif %}" id="{{ section.key }}">
<h2>{{ section.title }}</h2>
{% for guideline in section.guidelines %}<div class="guideline">{{ guideline }}</div>
{% endfor %}</div>
{% endfor %}</body>
</html>
"#;

/// One entry of a report section.
#[derive(Debug, Clone, PartialEq)]
pub enum Guideline {
    /// Plain text, escaped when rendered
    Text(String),
    /// Trusted HTML fragment
    Html(String),
    /// Embedded figure
    Figure(Figure),
}

impl Guideline {
    /// HTML for this guideline.
    #[must_use]
    pub fn to_html(&self) -> String {
        match self {
            Self::Text(text) => format!("<p>{}</p>", crate::plot::escape(text)),
            Self::Html(html) => html.clone(),
            Self::Figure(figure) => figure.to_html(),
        }
    }
}

impl From<&str> for Guideline {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for Guideline {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<Figure> for Guideline {
    fn from(figure: Figure) -> Self {
        Self::Figure(figure)
    }
}

/// A titled group of findings.
///
/// Sections start out not ok and included in the report.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportSection {
    key: String,
    title: String,
    guidelines: Vec<Guideline>,
    include_in_report: bool,
    is_ok: bool,
}

impl ReportSection {
    /// New section; the title is `key` with underscores replaced by spaces.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            title: key.replace('_', " "),
            key,
            guidelines: Vec::new(),
            include_in_report: true,
            is_ok: false,
        }
    }

    /// Add a guideline.
    pub fn append_guideline(&mut self, guideline: impl Into<Guideline>) {
        self.guidelines.push(guideline.into());
    }

    /// Mark whether the check passed.
    pub fn set_is_ok(&mut self, is_ok: bool) {
        self.is_ok = is_ok;
    }

    /// Mark whether the section is shown.
    pub fn set_include_in_report(&mut self, include: bool) {
        self.include_in_report = include;
    }

    /// Section key.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Display title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Guidelines in insertion order.
    #[must_use]
    pub fn guidelines(&self) -> &[Guideline] {
        &self.guidelines
    }

    /// Whether the section is shown.
    #[must_use]
    pub const fn include_in_report(&self) -> bool {
        self.include_in_report
    }

    /// Whether the check passed.
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        self.is_ok
    }

    /// Text guidelines, for assertions and plain-text output.
    #[must_use]
    pub fn texts(&self) -> Vec<&str> {
        self.guidelines
            .iter()
            .filter_map(|g| match g {
                Guideline::Text(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }
}

/// Sections collected by an evaluator, keyed and kept in insertion order.
///
/// Adding a section with an existing key replaces it in place.
#[derive(Debug, Clone, Default)]
pub(crate) struct Heuristics {
    sections: Vec<ReportSection>,
}

impl Heuristics {
    pub(crate) fn add(&mut self, section: ReportSection) {
        match self.sections.iter_mut().find(|s| s.key == section.key) {
            Some(existing) => *existing = section,
            None => self.sections.push(section),
        }
    }

    pub(crate) fn get(&self, key: &str) -> Option<&ReportSection> {
        self.sections.iter().find(|s| s.key == key)
    }

    pub(crate) fn sections(&self) -> &[ReportSection] {
        &self.sections
    }

    pub(crate) fn create_report(&self, title: &str) -> Report {
        Report {
            title: title.to_string(),
            sections: self
                .sections
                .iter()
                .filter(|s| s.include_in_report)
                .cloned()
                .collect(),
        }
    }
}

/// Rendered evaluation report.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    title: String,
    sections: Vec<ReportSection>,
}

impl Report {
    /// Build a report from sections; hidden sections are dropped.
    #[must_use]
    pub fn new(title: impl Into<String>, sections: Vec<ReportSection>) -> Self {
        Self {
            title: title.into(),
            sections: sections.into_iter().filter(|s| s.include_in_report).collect(),
        }
    }

    /// Report title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Sections shown in the report.
    #[must_use]
    pub fn sections(&self) -> &[ReportSection] {
        &self.sections
    }

    /// Section by key.
    #[must_use]
    pub fn section(&self, key: &str) -> Option<&ReportSection> {
        self.sections.iter().find(|s| s.key == key)
    }

    /// Standalone HTML document.
    ///
    /// # Errors
    ///
    /// Returns error if the template fails to render.
    pub fn to_html(&self) -> Result<String> {
        let sections: Vec<minijinja::Value> = self
            .sections
            .iter()
            .map(|section| {
                let guidelines: Vec<minijinja::Value> = section
                    .guidelines
                    .iter()
                    .map(|g| minijinja::Value::from_safe_string(g.to_html()))
                    .collect();
                context! {
                    key => &section.key,
                    title => &section.title,
                    is_ok => section.is_ok,
                    guidelines => guidelines,
                }
            })
            .collect();

        let mut env = Environment::new();
        env.add_template("report.html", REPORT_TEMPLATE)?;
        let html = env
            .get_template("report.html")?
            .render(context! { title => &self.title, sections => sections })?;
        Ok(html)
    }

    /// Write the HTML document to `path`.
    ///
    /// # Errors
    ///
    /// Returns error if rendering or writing fails.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        std::fs::write(path, self.to_html()?)?;
        tracing::info!(path = %path.display(), "report saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_section_title_from_key() {
        let section = ReportSection::new("general_stats");
        assert_eq!(section.title(), "general stats");
        assert!(!section.is_ok());
        assert!(section.include_in_report());
    }

    #[test]
    fn test_heuristics_replace_and_hide() {
        let mut heuristics = Heuristics::default();
        heuristics.add(ReportSection::new("a"));
        let mut hidden = ReportSection::new("b");
        hidden.set_include_in_report(false);
        heuristics.add(hidden);
        let mut replaced = ReportSection::new("a");
        replaced.append_guideline("second");
        heuristics.add(replaced);

        assert_eq!(heuristics.sections().len(), 2);
        assert_eq!(heuristics.get("a").unwrap().texts(), vec!["second"]);
        let report = heuristics.create_report("r");
        assert_eq!(report.sections().len(), 1);
    }

    #[test]
    fn test_html_escapes_text_keeps_html() {
        let mut section = ReportSection::new("balance");
        section.set_is_ok(true);
        section.append_guideline("a < b");
        section.append_guideline(Guideline::Html("<a href='#'>guide</a>".into()));
        let html = Report::new("Model <evaluation>", vec![section]).to_html().unwrap();

        assert!(html.contains("<p>a &lt; b</p>"));
        assert!(html.contains("<a href='#'>guide</a>"));
        assert!(html.contains("Model &lt;evaluation&gt;"));
        assert!(html.contains(r#"class="section ok""#));
    }
}
