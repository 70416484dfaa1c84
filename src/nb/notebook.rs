//! Jupyter notebook model (nbformat 4)

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::literal::parse_literal;
use crate::plot::escape;

/// Text stored either as one string or as a list of lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MultilineText {
    /// Single string
    One(String),
    /// Lines, each keeping its trailing newline
    Lines(Vec<String>),
}

impl Default for MultilineText {
    fn default() -> Self {
        Self::One(String::new())
    }
}

impl MultilineText {
    /// Join into a single string.
    #[must_use]
    pub fn text(&self) -> String {
        match self {
            Self::One(s) => s.clone(),
            Self::Lines(lines) => lines.concat(),
        }
    }
}

/// Cell metadata; only `tags` is interpreted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CellMetadata {
    /// Cell tags
    #[serde(default)]
    pub tags: Vec<String>,
    /// Remaining metadata
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

/// Raw cell output as stored in the notebook file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "output_type", rename_all = "snake_case")]
pub enum RawOutput {
    /// Text written to stdout or stderr
    Stream {
        /// Stream name
        #[serde(default)]
        name: String,
        /// Written text
        text: MultilineText,
    },
    /// Rich display output
    DisplayData {
        /// Representations keyed by MIME type
        #[serde(default)]
        data: BTreeMap<String, Value>,
    },
    /// Value of the last expression in a cell
    ExecuteResult {
        /// Representations keyed by MIME type
        #[serde(default)]
        data: BTreeMap<String, Value>,
    },
    /// Raised exception
    Error {
        /// Exception name
        ename: String,
        /// Exception message
        evalue: String,
    },
}

/// One notebook cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    /// `code`, `markdown` or `raw`
    pub cell_type: String,
    /// Cell source
    #[serde(default)]
    pub source: MultilineText,
    /// Cell metadata
    #[serde(default)]
    pub metadata: CellMetadata,
    /// Outputs (code cells only)
    #[serde(default)]
    pub outputs: Vec<RawOutput>,
}

impl Cell {
    /// Whether the cell carries `tag`.
    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        self.metadata.tags.iter().any(|t| t == tag)
    }
}

/// A parsed notebook.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notebook {
    /// Cells in order
    pub cells: Vec<Cell>,
    /// Notebook metadata
    #[serde(default)]
    pub metadata: Map<String, Value>,
    /// Major format version
    #[serde(default)]
    pub nbformat: u32,
    /// Minor format version
    #[serde(default)]
    pub nbformat_minor: u32,
}

const MIME_PREFERENCE: [&str; 6] = [
    "image/png",
    "image/jpeg",
    "image/svg+xml",
    "text/html",
    "application/json",
    "text/plain",
];

/// A cell output reduced to its richest representation.
#[derive(Debug, Clone, PartialEq)]
pub enum Output {
    /// Plain text
    Text(String),
    /// HTML fragment
    Html(String),
    /// Base64-encoded raster image
    Image {
        /// MIME type (`image/png` or `image/jpeg`)
        mime: String,
        /// Base64 payload
        data: String,
    },
    /// SVG document
    Svg(String),
    /// JSON value
    Json(Value),
}

fn mime_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(lines) => lines.iter().filter_map(Value::as_str).collect(),
        other => other.to_string(),
    }
}

impl Output {
    /// Pick the preferred representation of a raw output.
    ///
    /// Preference: image, SVG, HTML, JSON, then plain text. Returns `None`
    /// for display data with no known MIME type.
    #[must_use]
    pub fn from_raw(raw: &RawOutput) -> Option<Self> {
        match raw {
            RawOutput::Stream { text, .. } => Some(Self::Text(text.text())),
            RawOutput::Error { ename, evalue } => Some(Self::Text(format!("{ename}: {evalue}"))),
            RawOutput::DisplayData { data } | RawOutput::ExecuteResult { data } => {
                let (mime, value) = MIME_PREFERENCE
                    .iter()
                    .find_map(|mime| data.get(*mime).map(|v| (*mime, v)))?;
                Some(match mime {
                    "image/png" | "image/jpeg" => Self::Image {
                        mime: mime.to_string(),
                        data: mime_text(value).replace('\n', ""),
                    },
                    "image/svg+xml" => Self::Svg(mime_text(value)),
                    "text/html" => Self::Html(mime_text(value)),
                    "application/json" => Self::Json(value.clone()),
                    _ => Self::Text(mime_text(value)),
                })
            }
        }
    }

    /// HTML fragment for display.
    #[must_use]
    pub fn to_html(&self) -> String {
        match self {
            Self::Text(text) => format!("<pre>{}</pre>", escape(text)),
            Self::Html(html) | Self::Svg(html) => html.clone(),
            Self::Image { mime, data } => format!(r#"<img src="data:{mime};base64,{data}"/>"#),
            Self::Json(value) => format!(
                "<pre>{}</pre>",
                escape(&serde_json::to_string_pretty(value).unwrap_or_default())
            ),
        }
    }

    /// JSON value of a text, HTML or JSON output.
    ///
    /// Plain text that reads as a Python literal (the repr of a number,
    /// list or dict) is decoded. Images and SVG return `None`.
    #[must_use]
    pub fn to_value(&self) -> Option<Value> {
        match self {
            Self::Text(text) => Some(
                parse_literal(text.trim()).unwrap_or_else(|_| Value::String(text.clone())),
            ),
            Self::Html(html) => Some(Value::String(html.clone())),
            Self::Json(value) => Some(value.clone()),
            Self::Image { .. } | Self::Svg(_) => None,
        }
    }
}
