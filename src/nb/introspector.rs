//! Read tagged outputs and parameters from an executed notebook

use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;

use serde_json::{Map, Value};

use super::literal::parse_assignments;
use super::notebook::{Notebook, Output};
use crate::{Error, Result};

/// Tag papermill puts on the cell it injects.
pub const INJECTED_PARAMETERS_TAG: &str = "injected-parameters";

/// Tag on the cell holding default parameters.
pub const PARAMETERS_TAG: &str = "parameters";

/// Outputs of an executed notebook, indexed by cell tag.
///
/// When several cells share a tag, the last one wins.
#[derive(Debug, Clone)]
pub struct NotebookIntrospector {
    notebook: Notebook,
    tagged: BTreeMap<String, Vec<Output>>,
}

impl NotebookIntrospector {
    /// Load a notebook file.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or is not a notebook.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        contents.parse().map_err(|e| match e {
            Error::Serde(inner) => {
                Error::ParseError(format!("{} is not a valid notebook: {inner}", path.display()))
            }
            other => other,
        })
    }

    /// Wrap an already parsed notebook.
    #[must_use]
    pub fn new(notebook: Notebook) -> Self {
        let mut tagged = BTreeMap::new();
        for cell in &notebook.cells {
            let outputs: Vec<Output> = cell.outputs.iter().filter_map(Output::from_raw).collect();
            for tag in &cell.metadata.tags {
                tagged.insert(tag.clone(), outputs.clone());
            }
        }
        Self { notebook, tagged }
    }

    /// The parsed notebook.
    #[must_use]
    pub const fn notebook(&self) -> &Notebook {
        &self.notebook
    }

    /// Tags of cells that produced output, sorted.
    #[must_use]
    pub fn tags(&self) -> Vec<&str> {
        self.tagged
            .iter()
            .filter(|(_, outputs)| !outputs.is_empty())
            .map(|(tag, _)| tag.as_str())
            .collect()
    }

    /// Last output of the cell tagged `tag`.
    #[must_use]
    pub fn get(&self, tag: &str) -> Option<&Output> {
        self.tagged.get(tag).and_then(|outputs| outputs.last())
    }

    /// Every output of the cell tagged `tag`.
    #[must_use]
    pub fn outputs(&self, tag: &str) -> Option<&[Output]> {
        self.tagged.get(tag).map(Vec::as_slice)
    }

    /// Parameters the notebook ran with.
    ///
    /// Reads the cell tagged `injected-parameters`, or the `parameters`
    /// cell when nothing was injected. Returns an empty map if neither
    /// exists.
    #[must_use]
    pub fn get_injected_parameters(&self) -> Map<String, Value> {
        let cell = [INJECTED_PARAMETERS_TAG, PARAMETERS_TAG]
            .iter()
            .find_map(|tag| self.notebook.cells.iter().rev().find(|c| c.has_tag(tag)));
        cell.map(|c| parse_assignments(&c.source.text()))
            .unwrap_or_default()
    }

    /// Tagged outputs as JSON, skipping images and SVG.
    #[must_use]
    pub fn to_json_serializable(&self) -> Map<String, Value> {
        self.tagged
            .iter()
            .filter_map(|(tag, outputs)| {
                let value = outputs.last()?.to_value()?;
                Some((tag.clone(), value))
            })
            .collect()
    }
}

impl FromStr for NotebookIntrospector {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let notebook: Notebook = serde_json::from_str(s)?;
        Ok(Self::new(notebook))
    }
}
