//! Executed Jupyter notebooks as experiment records
//!
//! Tag the cells whose output matters (`metrics`, `plot`, ...), execute the
//! notebook with different parameters, then:
//!
//! - [`NotebookIntrospector`] reads one notebook's tagged outputs and the
//!   parameters it ran with
//! - [`NotebookCollection`] lays the same tag out side by side across runs
//! - [`NotebookDatabase`] indexes a directory of runs into SQLite for SQL
//!   queries
//!
//! ## Example
//!
//! ```rust
//! use skeval::nb::{NotebookIntrospector, Output};
//!
//! let source = r#"{
//!   "nbformat": 4, "nbformat_minor": 5, "metadata": {},
//!   "cells": [{
//!     "cell_type": "code", "source": "acc", "metadata": {"tags": ["acc"]},
//!     "outputs": [{"output_type": "execute_result", "metadata": {},
//!                  "data": {"text/plain": "0.93"}}]
//!   }]
//! }"#;
//! let nb: NotebookIntrospector = source.parse().unwrap();
//! assert_eq!(nb.get("acc"), Some(&Output::Text("0.93".into())));
//! ```

mod collection;
mod database;
mod introspector;
mod literal;
mod notebook;

pub use collection::{CollectionView, NotebookCollection};
pub use database::{IndexSummary, NotebookDatabase, NotebookDatabaseBuilder, PARAMETERS_KEY};
pub use introspector::{NotebookIntrospector, INJECTED_PARAMETERS_TAG, PARAMETERS_TAG};
pub use literal::{parse_assignments, parse_literal};
pub use notebook::{Cell, CellMetadata, MultilineText, Notebook, Output, RawOutput};
