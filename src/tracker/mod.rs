//! Experiment tracking in a local SQLite file
//!
//! Each experiment is one row holding a JSON object of parameters. Values
//! are logged through an [`Experiment`] handle and read back with plain SQL:
//!
//! ```rust
//! use skeval::tracker::SqliteTracker;
//!
//! let tracker = SqliteTracker::in_memory().unwrap();
//! let exp = tracker.new_experiment().unwrap();
//! exp.log("model", "random-forest").unwrap();
//! exp.log("accuracy", 0.91).unwrap();
//! exp.log_confusion_matrix(None, &[0, 1, 1, 0], &[0, 1, 0, 0]).unwrap();
//!
//! let sql = "SELECT uuid, json_extract(parameters, '$.accuracy') AS acc FROM experiments";
//! let result = tracker.query(sql).unwrap();
//! assert_eq!(result.columns(), &["uuid", "acc"]);
//! ```
//!
//! Only a single `SELECT` is accepted by [`SqliteTracker::query`]; writes go
//! through the typed methods.

mod experiment;
mod logged;
mod record;
mod store;

pub use experiment::Experiment;
pub use logged::Logged;
pub use record::{ExperimentRecord, ExperimentRecordBuilder};
pub use store::{SqliteTracker, SqliteTrackerBuilder, DEFAULT_ID_LENGTH, DEFAULT_TABLE};

pub(crate) use store::{check_identifier, now_text};
