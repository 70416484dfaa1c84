//! Side-by-side view of the same tag across several notebooks

use std::collections::BTreeSet;
use std::path::Path;

use minijinja::{context, Environment};
use serde_json::Value;

#[cfg(feature = "rayon")]
use rayon::prelude::*;

use super::introspector::NotebookIntrospector;
use super::notebook::Output;
use crate::{Error, Result};

const COMPARE_TAB: &str = "Compare";

const TABS_TEMPLATE: &str = r#"<div class="skeval-tabs" id="{{ group }}">
<style>
#{{ group }} { display: flex; flex-wrap: wrap; }
#{{ group }} > input { display: none; }
#{{ group }} > label { order: 1; padding: 6px 12px; cursor: pointer; border-bottom: 2px solid transparent; }
#{{ group }} > div { order: 2; width: 100%; display: none; padding-top: 8px; }
#{{ group }} > input:checked + label { border-bottom-color: #1f77b4; font-weight: bold; }
#{{ group }} > input:checked + label + div { display: block; }
</style>
{% for tab in tabs %}<input type="radio" name="{{ group }}" id="{{ group }}-{{ loop.index }}"{% if loop.first %} checked{% endif %}>
<label for="{{ group }}-{{ loop.index }}">{{ tab.name }}</label>
<div>{{ tab.content }}</div>
{% endfor %}</div>"#;

const SUMMARY_TEMPLATE: &str = r#"<table class="skeval-compare">
<thead><tr><th></th>{% for key in keys %}<th>{{ key }}</th>{% endfor %}</tr></thead>
<tbody>
{% for row in rows %}<tr><th>{{ row.id }}</th>{% for cell in row.cells %}<td>{{ cell }}</td>{% endfor %}</tr>
{% endfor %}</tbody>
</table>"#;

/// Outputs for one tag, in collection order.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionView<'a> {
    entries: Vec<(&'a str, &'a Output)>,
}

impl<'a> CollectionView<'a> {
    /// `(notebook id, output)` pairs; notebooks without the tag are left out.
    #[must_use]
    pub fn entries(&self) -> &[(&'a str, &'a Output)] {
        &self.entries
    }

    /// Output of one notebook.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&'a Output> {
        self.entries
            .iter()
            .find_map(|(key, output)| (*key == id).then_some(*output))
    }

    /// Number of notebooks with output for the tag.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no notebook has output for the tag.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Several executed notebooks, each identified by an ID.
#[derive(Debug, Clone)]
pub struct NotebookCollection {
    ids: Vec<String>,
    notebooks: Vec<NotebookIntrospector>,
}

#[cfg(feature = "rayon")]
fn load_all<P: AsRef<Path> + Sync>(paths: &[P]) -> Result<Vec<NotebookIntrospector>> {
    paths.par_iter().map(NotebookIntrospector::from_path).collect()
}

#[cfg(not(feature = "rayon"))]
fn load_all<P: AsRef<Path> + Sync>(paths: &[P]) -> Result<Vec<NotebookIntrospector>> {
    paths.iter().map(NotebookIntrospector::from_path).collect()
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map_or_else(|| path.display().to_string(), |s| s.to_string_lossy().into_owned())
}

impl NotebookCollection {
    /// Load notebooks from `paths`.
    ///
    /// IDs default to the file stems.
    ///
    /// # Errors
    ///
    /// Returns error if `ids` has a different length than `paths`, IDs
    /// repeat, or any notebook fails to load.
    pub fn from_paths<P: AsRef<Path> + Sync>(paths: &[P], ids: Option<Vec<String>>) -> Result<Self> {
        let ids = match ids {
            Some(ids) if ids.len() != paths.len() => {
                return Err(Error::ShapeMismatch {
                    expected: format!("{} ids", paths.len()),
                    actual: format!("{} ids", ids.len()),
                })
            }
            Some(ids) => ids,
            None => paths.iter().map(|p| file_stem(p.as_ref())).collect(),
        };
        let unique: BTreeSet<&String> = ids.iter().collect();
        if unique.len() != ids.len() {
            return Err(Error::invalid("notebook ids must be unique"));
        }

        let notebooks = load_all(paths)?;
        tracing::debug!(count = notebooks.len(), "notebook collection loaded");
        Ok(Self { ids, notebooks })
    }

    /// Build from notebooks already in memory.
    ///
    /// # Errors
    ///
    /// Returns error if the lengths differ.
    pub fn new(ids: Vec<String>, notebooks: Vec<NotebookIntrospector>) -> Result<Self> {
        if ids.len() != notebooks.len() {
            return Err(Error::length_mismatch(ids.len(), notebooks.len()));
        }
        Ok(Self { ids, notebooks })
    }

    /// Notebook IDs in order.
    #[must_use]
    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    /// One notebook by ID.
    #[must_use]
    pub fn notebook(&self, id: &str) -> Option<&NotebookIntrospector> {
        self.ids
            .iter()
            .position(|i| i == id)
            .map(|index| &self.notebooks[index])
    }

    /// Output tagged `tag` in every notebook that has it.
    #[must_use]
    pub fn get(&self, tag: &str) -> CollectionView<'_> {
        let entries = self
            .ids
            .iter()
            .zip(&self.notebooks)
            .filter_map(|(id, nb)| nb.get(tag).map(|output| (id.as_str(), output)))
            .collect();
        CollectionView { entries }
    }

    /// Tabbed HTML with one tab per notebook.
    ///
    /// When every output is a flat object of numbers (a dict of metrics,
    /// say), a "Compare" tab with one row per notebook comes first.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if no notebook has the tag, or the
    /// render error.
    pub fn to_html(&self, tag: &str) -> Result<String> {
        let view = self.get(tag);
        if view.is_empty() {
            return Err(Error::NotFound(format!("tag '{tag}' in any notebook")));
        }

        let mut env = Environment::new();
        env.add_template("tabs.html", TABS_TEMPLATE)?;
        env.add_template("summary.html", SUMMARY_TEMPLATE)?;

        let mut tabs = Vec::with_capacity(view.len() + 1);
        if let Some(summary) = summary_table(&view) {
            let table = env.get_template("summary.html")?.render(summary)?;
            tabs.push(context! {
                name => COMPARE_TAB,
                content => minijinja::Value::from_safe_string(table),
            });
        }
        for (id, output) in view.entries() {
            tabs.push(context! {
                name => *id,
                content => minijinja::Value::from_safe_string(output.to_html()),
            });
        }

        let group = format!("skeval-{}", uuid::Uuid::new_v4().simple());
        let html = env
            .get_template("tabs.html")?
            .render(context! { group => group, tabs => tabs })?;
        Ok(html)
    }
}

/// Template context for the table comparing numeric dicts, or `None` if
/// any output is not one.
fn summary_table(view: &CollectionView<'_>) -> Option<minijinja::Value> {
    let mut maps = Vec::with_capacity(view.len());
    let mut keys = BTreeSet::new();
    for (id, output) in view.entries() {
        let Some(Value::Object(map)) = output.to_value() else {
            return None;
        };
        if map.is_empty() || !map.values().all(Value::is_number) {
            return None;
        }
        keys.extend(map.keys().cloned());
        maps.push((*id, map));
    }

    let rows: Vec<minijinja::Value> = maps
        .iter()
        .map(|(id, map)| {
            let cells: Vec<String> = keys
                .iter()
                .map(|key| map.get(key).map(ToString::to_string).unwrap_or_default())
                .collect();
            context! { id => *id, cells => cells }
        })
        .collect();
    Some(context! { keys => keys, rows => rows })
}
