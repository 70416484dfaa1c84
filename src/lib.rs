//! # skeval: Machine Learning Model Evaluation
//!
//! **Version**: 0.1.0
//!
//! skeval computes evaluation metrics for fitted models, renders them as
//! SVG plots, and keeps a record of experiments in SQLite so they can be
//! compared with plain SQL.
//!
//! ## Modules
//!
//! - [`metrics`]: confusion matrices, ROC/PR curves, AUC, calibration,
//!   regression and clustering scores
//! - [`plot`]: plot types built from raw labels and scores; each renders to
//!   SVG, combines with another of its kind, and dumps to JSON
//! - [`tracker`]: experiment tracker backed by a local SQLite file
//! - [`nb`]: tagged outputs and parameters of executed Jupyter notebooks,
//!   side-by-side comparison and a queryable index
//! - [`report`]: heuristic evaluation and comparison reports in HTML
//! - [`query`]: read-only SQL shared by the tracker and the notebook index
//!
//! ## Example Usage
//!
//! ```rust
//! use skeval::plot::{Plot, Roc};
//! use skeval::tracker::SqliteTracker;
//!
//! let y_true = [0, 0, 1, 1];
//! let y_score = vec![vec![0.1], vec![0.4], vec![0.35], vec![0.8]];
//!
//! let roc = Roc::from_raw_data(&y_true, &y_score)?;
//! assert!((roc.aucs()[0] - 0.75).abs() < 1e-12);
//!
//! let tracker = SqliteTracker::in_memory()?;
//! let experiment = tracker.new_experiment()?;
//! experiment.log("auc", roc.aucs()[0])?;
//! experiment.log_figure("roc", &roc.plot())?;
//! # Ok::<(), skeval::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod error;
pub mod metrics;
pub mod nb;
pub mod plot;
pub mod query;
pub mod report;
pub mod tracker;

pub use error::{Error, Result};
