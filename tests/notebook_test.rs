//! Notebook introspection, collections and the SQLite notebook index

use std::path::{Path, PathBuf};

use serde_json::json;
use skeval::nb::{NotebookCollection, NotebookDatabase, NotebookIntrospector, Output};
use skeval::Error;
use tempfile::TempDir;

fn executed_notebook(model: &str, accuracy: f64) -> serde_json::Value {
    json!({
        "nbformat": 4,
        "nbformat_minor": 5,
        "metadata": {"kernelspec": {"name": "python3"}},
        "cells": [
            {"cell_type": "code", "metadata": {"tags": ["parameters"]},
             "source": "model = None\n", "outputs": [], "execution_count": 1},
            {"cell_type": "code", "metadata": {"tags": ["injected-parameters"]},
             "source": format!("# Parameters\nmodel = \"{model}\"\nparams = {{'n': 10}}\n"),
             "outputs": [], "execution_count": 2},
            {"cell_type": "code", "metadata": {"tags": ["metrics"]}, "source": "metrics",
             "execution_count": 3,
             "outputs": [{"output_type": "execute_result", "execution_count": 3, "metadata": {},
                          "data": {"text/plain": format!("{{'accuracy': {accuracy}}}")}}]},
            {"cell_type": "code", "metadata": {"tags": ["plot"]}, "source": "plot()",
             "execution_count": 4,
             "outputs": [{"output_type": "display_data", "metadata": {},
                          "data": {"image/png": "iVBORw0KGgo=", "text/plain": "<Figure>"}}]}
        ]
    })
}

fn write_notebook(dir: &Path, name: &str, model: &str, accuracy: f64) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, executed_notebook(model, accuracy).to_string()).unwrap();
    path
}

// =============================================================================
// NotebookIntrospector
// =============================================================================

#[test]
fn test_introspector_from_path() {
    let dir = TempDir::new().unwrap();
    let path = write_notebook(dir.path(), "svc.ipynb", "svc", 0.8);

    let nb = NotebookIntrospector::from_path(&path).unwrap();
    assert_eq!(nb.tags(), vec!["metrics", "plot"]);
    assert_eq!(
        nb.get("metrics"),
        Some(&Output::Text("{'accuracy': 0.8}".to_string()))
    );

    let params = nb.get_injected_parameters();
    assert_eq!(params.get("model"), Some(&json!("svc")));
    assert_eq!(params.get("params"), Some(&json!({"n": 10})));

    let data = nb.to_json_serializable();
    assert_eq!(data.get("metrics"), Some(&json!({"accuracy": 0.8})));
    assert!(!data.contains_key("plot"));
}

#[test]
fn test_introspector_invalid_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.ipynb");
    std::fs::write(&path, "{\"cells\": 3}").unwrap();
    assert!(matches!(
        NotebookIntrospector::from_path(&path),
        Err(Error::ParseError(_))
    ));
    assert!(matches!(
        NotebookIntrospector::from_path(dir.path().join("missing.ipynb")),
        Err(Error::Io(_))
    ));
}

// =============================================================================
// NotebookCollection
// =============================================================================

#[test]
fn test_collection_default_ids_and_compare() {
    let dir = TempDir::new().unwrap();
    let paths = vec![
        write_notebook(dir.path(), "svc.ipynb", "svc", 0.8),
        write_notebook(dir.path(), "rf.ipynb", "rf", 0.9),
    ];

    let collection = NotebookCollection::from_paths(&paths, None).unwrap();
    assert_eq!(collection.ids(), &["svc", "rf"]);

    let view = collection.get("metrics");
    assert_eq!(view.len(), 2);

    let html = collection.to_html("metrics").unwrap();
    assert!(html.contains(">Compare</label>"));
    assert!(html.contains(">svc</label>"));
    assert!(html.contains("<th>accuracy</th>"));

    let images = collection.to_html("plot").unwrap();
    assert!(!images.contains(">Compare</label>"));
    assert!(images.contains("data:image/png;base64,iVBORw0KGgo="));
}

#[test]
fn test_collection_custom_ids() {
    let dir = TempDir::new().unwrap();
    let paths = vec![write_notebook(dir.path(), "a.ipynb", "svc", 0.8)];
    let collection =
        NotebookCollection::from_paths(&paths, Some(vec!["baseline".to_string()])).unwrap();
    assert!(collection.notebook("baseline").is_some());
}

// =============================================================================
// NotebookDatabase
// =============================================================================

#[test]
fn test_database_index_and_query() {
    let dir = TempDir::new().unwrap();
    let root = dir.path().join("output");
    write_notebook(&root, "svc.ipynb", "svc", 0.8);
    write_notebook(&root, "nested/rf.ipynb", "rf", 0.9);
    std::fs::write(root.join("notes.txt"), "not a notebook").unwrap();

    let pattern = format!("{}/**/*.ipynb", root.display());
    let db = NotebookDatabase::open(dir.path().join("nbs.db"), pattern).unwrap();

    let summary = db.index(false).unwrap();
    assert_eq!(summary.indexed, 2);
    assert_eq!(summary.failed, 0);

    let result = db
        .query(
            "SELECT json_extract(c, '$.parameters.model') AS model,
                    json_extract(c, '$.metrics.accuracy') AS accuracy
             FROM nbs ORDER BY accuracy DESC",
        )
        .unwrap();
    assert_eq!(result.rows()[0], vec![json!("rf"), json!(0.9)]);
    assert_eq!(result.rows()[1], vec![json!("svc"), json!(0.8)]);
}

#[test]
fn test_database_skips_indexed_unless_update() {
    let dir = TempDir::new().unwrap();
    let root = dir.path().join("output");
    write_notebook(&root, "svc.ipynb", "svc", 0.8);
    let pattern = format!("{}/*.ipynb", root.display());
    let db = NotebookDatabase::open(dir.path().join("nbs.db"), pattern).unwrap();

    assert_eq!(db.index(false).unwrap().indexed, 1);

    let second = db.index(false).unwrap();
    assert_eq!(second.indexed, 0);
    assert_eq!(second.skipped, 1);

    write_notebook(&root, "svc.ipynb", "svc", 0.95);
    assert_eq!(db.index(true).unwrap().indexed, 1);
    let result = db
        .query("SELECT json_extract(c, '$.metrics.accuracy') AS acc FROM nbs")
        .unwrap();
    assert_eq!(result.rows()[0][0], json!(0.95));
    assert_eq!(db.len().unwrap(), 1);
}

#[test]
fn test_database_pattern_with_current_dir_segment() {
    let dir = TempDir::new().unwrap();
    let root = dir.path().join("out");
    write_notebook(&root, "svc.ipynb", "svc", 0.8);

    let pattern = format!("{}/./out/*.ipynb", dir.path().display());
    let db = NotebookDatabase::open(dir.path().join("nbs.db"), pattern).unwrap();
    assert_eq!(db.matching_paths().unwrap().len(), 1);
    assert_eq!(db.index(false).unwrap().indexed, 1);
}

#[test]
fn test_database_corrupt_notebook_is_skipped() {
    let dir = TempDir::new().unwrap();
    let root = dir.path().join("output");
    write_notebook(&root, "good.ipynb", "svc", 0.8);
    std::fs::write(root.join("bad.ipynb"), "{ not json").unwrap();

    let pattern = format!("{}/*.ipynb", root.display());
    let db = NotebookDatabase::open(dir.path().join("nbs.db"), pattern).unwrap();
    let summary = db.index(false).unwrap();
    assert_eq!(summary.indexed, 1);
    assert_eq!(summary.failed, 1);
}

#[test]
fn test_database_tag_filter() {
    let dir = TempDir::new().unwrap();
    let root = dir.path().join("output");
    write_notebook(&root, "svc.ipynb", "svc", 0.8);

    let pattern = format!("{}/*.ipynb", root.display());
    let db = NotebookDatabase::builder(dir.path().join("nbs.db"), pattern)
        .table("runs")
        .tags(vec!["nothing".to_string()])
        .build()
        .unwrap();
    db.index(false).unwrap();

    let result = db
        .query("SELECT json_extract(c, '$.metrics') AS m, json_extract(c, '$.parameters.model') AS p FROM runs")
        .unwrap();
    assert_eq!(result.rows()[0], vec![serde_json::Value::Null, json!("svc")]);
}

#[test]
fn test_database_query_is_read_only() {
    let dir = TempDir::new().unwrap();
    let db = NotebookDatabase::open(dir.path().join("nbs.db"), "*.ipynb").unwrap();
    assert!(matches!(db.query("DELETE FROM nbs"), Err(Error::ReadOnlyQuery(_))));
}
