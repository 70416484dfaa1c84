//! SQLite experiment tracker
//!
//! One table, one row per experiment:
//!
//! ```text
//! uuid TEXT PRIMARY KEY | created TEXT (RFC 3339) | parameters TEXT (JSON) | comment TEXT
//! ```
//!
//! Identifiers are always bound as text parameters, so IDs made only of
//! digits are never coerced to integers by SQLite.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};
use serde_json::{Map, Value};
use uuid::Uuid;

use super::{Experiment, ExperimentRecord};
use crate::query::{self, QueryResult};
use crate::{Error, Result};

/// Default length of generated experiment IDs
pub const DEFAULT_ID_LENGTH: usize = 8;

/// Default table name
pub const DEFAULT_TABLE: &str = "experiments";

const MAX_ID_ATTEMPTS: usize = 100;

pub(crate) fn check_identifier(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(Error::invalid(format!(
            "'{name}' is not a valid table name (letters, digits and underscores only)"
        )))
    }
}

pub(crate) fn now_text() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn parse_time(idx: usize, text: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .map(|d| d.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}

fn parse_parameters(idx: usize, text: Option<String>) -> rusqlite::Result<Map<String, Value>> {
    match text {
        None => Ok(Map::new()),
        Some(text) => serde_json::from_str(&text).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        }),
    }
}

fn row_to_record(row: &Row<'_>) -> rusqlite::Result<ExperimentRecord> {
    let uuid: String = row.get(0)?;
    let created: String = row.get(1)?;
    let parameters = parse_parameters(2, row.get(2)?)?;
    let comment: Option<String> = row.get(3)?;

    let mut builder = ExperimentRecord::builder(uuid)
        .created(parse_time(1, &created)?)
        .parameters(parameters);
    if let Some(comment) = comment {
        builder = builder.comment(comment);
    }
    Ok(builder.build())
}

fn as_object(parameters: Value) -> Result<Map<String, Value>> {
    match parameters {
        Value::Object(map) => Ok(map),
        other => Err(Error::invalid(format!(
            "parameters must be a JSON object, got {other}"
        ))),
    }
}

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(err, rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation)
}

/// Leaf paths of `map`, one segment per nesting level.
fn collect_paths(prefix: &[String], map: &Map<String, Value>, paths: &mut BTreeSet<Vec<String>>) {
    for (key, value) in map {
        let mut path = prefix.to_vec();
        path.push(key.clone());
        match value {
            Value::Object(inner) if !inner.is_empty() => collect_paths(&path, inner, paths),
            _ => {
                paths.insert(path);
            }
        }
    }
}

/// SQLite JSON path for `segments`; segments other than plain words are
/// double-quoted so dots inside a key are not read as nesting.
fn json_path(segments: &[String]) -> String {
    let mut path = String::from("$");
    for segment in segments {
        let plain = !segment.is_empty()
            && segment.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
        if plain {
            path.push('.');
            path.push_str(segment);
        } else {
            path.push_str(&format!(".\"{segment}\""));
        }
    }
    path
}

fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Builder for [`SqliteTracker`].
#[derive(Debug, Clone)]
pub struct SqliteTrackerBuilder {
    path: Option<PathBuf>,
    table: String,
    id_length: usize,
}

impl SqliteTrackerBuilder {
    /// Set the table name.
    #[must_use]
    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    /// Set the length of generated IDs (4 to 32 hex characters).
    #[must_use]
    pub const fn id_length(mut self, id_length: usize) -> Self {
        self.id_length = id_length;
        self
    }

    /// Open the database and create the table if needed.
    ///
    /// # Errors
    ///
    /// Returns error if the table name or ID length is invalid, or SQLite
    /// cannot open the file.
    pub fn build(self) -> Result<SqliteTracker> {
        check_identifier(&self.table)?;
        if !(4..=32).contains(&self.id_length) {
            return Err(Error::invalid(format!(
                "id_length must be between 4 and 32, got {}",
                self.id_length
            )));
        }

        let conn = match &self.path {
            Some(path) => Connection::open(path)?,
            None => Connection::open_in_memory()?,
        };
        conn.execute(
            &format!(
                "CREATE TABLE IF NOT EXISTS {} (
                    uuid TEXT NOT NULL PRIMARY KEY,
                    created TEXT NOT NULL,
                    parameters TEXT,
                    comment TEXT
                )",
                self.table
            ),
            [],
        )?;

        tracing::debug!(table = %self.table, path = ?self.path, "tracker opened");
        Ok(SqliteTracker {
            conn,
            table: self.table,
            id_length: self.id_length,
        })
    }
}

/// Experiment tracker backed by a local SQLite file.
///
/// ## Example
///
/// ```rust
/// use skeval::tracker::SqliteTracker;
/// use serde_json::json;
///
/// let tracker = SqliteTracker::in_memory().unwrap();
/// let uuid = tracker.new(json!({"model": "svc", "C": 1.0})).unwrap();
///
/// let result = tracker
///     .query("SELECT uuid, json_extract(parameters, '$.C') AS C FROM experiments")
///     .unwrap();
/// assert_eq!(result.len(), 1);
/// assert_eq!(tracker.get(&uuid).unwrap().get("model"), Some(&json!("svc")));
/// ```
#[derive(Debug)]
pub struct SqliteTracker {
    conn: Connection,
    table: String,
    id_length: usize,
}

impl SqliteTracker {
    /// Create a builder for a tracker stored at `path`.
    #[must_use]
    pub fn builder(path: impl AsRef<Path>) -> SqliteTrackerBuilder {
        SqliteTrackerBuilder {
            path: Some(path.as_ref().to_path_buf()),
            table: DEFAULT_TABLE.to_string(),
            id_length: DEFAULT_ID_LENGTH,
        }
    }

    /// Open (or create) a tracker at `path` with default settings.
    ///
    /// # Errors
    ///
    /// Returns error if SQLite cannot open the file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::builder(path).build()
    }

    /// Tracker held in memory; contents are lost when dropped.
    ///
    /// # Errors
    ///
    /// Returns error if SQLite fails to initialize.
    pub fn in_memory() -> Result<Self> {
        SqliteTrackerBuilder {
            path: None,
            table: DEFAULT_TABLE.to_string(),
            id_length: DEFAULT_ID_LENGTH,
        }
        .build()
    }

    /// Table name.
    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Number of experiments.
    ///
    /// # Errors
    ///
    /// Returns error if the count query fails.
    pub fn len(&self) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", self.table),
            [],
            |row| row.get(0),
        )?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    /// Whether the tracker holds no experiments.
    ///
    /// # Errors
    ///
    /// Returns error if the count query fails.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Whether an experiment with `uuid` exists.
    ///
    /// # Errors
    ///
    /// Returns error if the lookup fails.
    pub fn exists(&self, uuid: &str) -> Result<bool> {
        let found: Option<i64> = self
            .conn
            .query_row(
                &format!("SELECT 1 FROM {} WHERE uuid = ?1", self.table),
                params![uuid],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    fn generate_id(&self) -> Result<String> {
        for _ in 0..MAX_ID_ATTEMPTS {
            let mut id = Uuid::new_v4().simple().to_string();
            id.truncate(self.id_length);
            if !self.exists(&id)? {
                return Ok(id);
            }
        }
        Err(Error::invalid(format!(
            "could not generate a free ID of length {} after {MAX_ID_ATTEMPTS} attempts",
            self.id_length
        )))
    }

    fn insert_on(conn: &Connection, table: &str, uuid: &str, parameters: &Map<String, Value>) -> Result<()> {
        let json = serde_json::to_string(parameters)?;
        conn.execute(
            &format!("INSERT INTO {table} (uuid, created, parameters) VALUES (?1, ?2, ?3)"),
            params![uuid, now_text(), json],
        )
        .map_err(|e| {
            if is_constraint_violation(&e) {
                Error::AlreadyExists(format!("experiment '{uuid}'"))
            } else {
                e.into()
            }
        })?;
        Ok(())
    }

    fn write_parameters(&self, uuid: &str, parameters: &Map<String, Value>) -> Result<()> {
        let json = serde_json::to_string(parameters)?;
        self.conn.execute(
            &format!("UPDATE {} SET parameters = ?1 WHERE uuid = ?2", self.table),
            params![json, uuid],
        )?;
        Ok(())
    }

    /// Insert an empty experiment and return a handle for logging to it.
    ///
    /// # Errors
    ///
    /// Returns error if the insert fails.
    pub fn new_experiment(&self) -> Result<Experiment<'_>> {
        let uuid = self.new(Value::Object(Map::new()))?;
        Ok(Experiment::new(self, uuid))
    }

    /// Handle for an existing experiment.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if `uuid` does not exist.
    pub fn get_experiment(&self, uuid: &str) -> Result<Experiment<'_>> {
        if !self.exists(uuid)? {
            return Err(Error::NotFound(format!("experiment '{uuid}'")));
        }
        Ok(Experiment::new(self, uuid.to_string()))
    }

    /// Insert `parameters` under a freshly generated ID and return the ID.
    ///
    /// # Errors
    ///
    /// Returns error if `parameters` is not an object or the insert fails.
    pub fn new(&self, parameters: Value) -> Result<String> {
        let parameters = as_object(parameters)?;
        let uuid = self.generate_id()?;
        Self::insert_on(&self.conn, &self.table, &uuid, &parameters)?;
        tracing::debug!(%uuid, "experiment created");
        Ok(uuid)
    }

    /// Insert an experiment with a caller-chosen ID.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AlreadyExists`] if `uuid` is taken.
    pub fn insert(&self, uuid: &str, parameters: Value) -> Result<()> {
        let parameters = as_object(parameters)?;
        Self::insert_on(&self.conn, &self.table, uuid, &parameters)?;
        tracing::debug!(%uuid, "experiment inserted");
        Ok(())
    }

    /// Insert several experiments in one transaction.
    ///
    /// Either every record is inserted or none is.
    ///
    /// # Errors
    ///
    /// Returns error if any ID is taken or any parameters are not objects.
    pub fn insert_many(&self, records: Vec<(String, Value)>) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        let count = records.len();
        for (uuid, parameters) in records {
            let parameters = as_object(parameters)?;
            Self::insert_on(&tx, &self.table, &uuid, &parameters)?;
        }
        tx.commit()?;
        tracing::info!(count, "experiments inserted");
        Ok(())
    }

    /// Merge `parameters` into an existing experiment.
    ///
    /// Keys already present are only replaced when `allow_overwrite` is set.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for an unknown ID and
    /// [`Error::InvalidInput`] when a key would be overwritten without
    /// permission.
    pub fn update(&self, uuid: &str, parameters: Value, allow_overwrite: bool) -> Result<()> {
        let updates = as_object(parameters)?;
        let mut current = self.get(uuid)?.parameters().clone();

        if !allow_overwrite {
            if let Some(key) = updates.keys().find(|k| current.contains_key(*k)) {
                return Err(Error::invalid(format!(
                    "key '{key}' already exists in experiment '{uuid}'; pass allow_overwrite to replace it"
                )));
            }
        }
        current.extend(updates);
        self.write_parameters(uuid, &current)?;
        tracing::debug!(%uuid, "experiment updated");
        Ok(())
    }

    /// Insert the experiment, or merge into it (overwriting keys) if it exists.
    ///
    /// # Errors
    ///
    /// Returns error if `parameters` is not an object or SQLite fails.
    pub fn upsert(&self, uuid: &str, parameters: Value) -> Result<()> {
        if self.exists(uuid)? {
            self.update(uuid, parameters, true)
        } else {
            self.insert(uuid, parameters)
        }
    }

    /// Like [`upsert`](Self::upsert), but existing keys accumulate values.
    ///
    /// A key already holding a list gets the new value appended; a key
    /// holding a scalar becomes a two-element list. New keys are stored as
    /// given.
    ///
    /// # Errors
    ///
    /// Returns error if `parameters` is not an object or SQLite fails.
    pub fn upsert_append(&self, uuid: &str, parameters: Value) -> Result<()> {
        if !self.exists(uuid)? {
            return self.insert(uuid, parameters);
        }
        let updates = as_object(parameters)?;
        let mut current = self.get(uuid)?.parameters().clone();
        for (key, value) in updates {
            let merged = match current.remove(&key) {
                None => value,
                Some(Value::Array(mut items)) => {
                    items.push(value);
                    Value::Array(items)
                }
                Some(existing) => Value::Array(vec![existing, value]),
            };
            current.insert(key, merged);
        }
        self.write_parameters(uuid, &current)?;
        Ok(())
    }

    /// Fetch one experiment.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if `uuid` does not exist.
    pub fn get(&self, uuid: &str) -> Result<ExperimentRecord> {
        self.conn
            .query_row(
                &format!(
                    "SELECT uuid, created, parameters, comment FROM {} WHERE uuid = ?1",
                    self.table
                ),
                params![uuid],
                row_to_record,
            )
            .optional()?
            .ok_or_else(|| Error::NotFound(format!("experiment '{uuid}'")))
    }

    /// Attach a comment to an experiment.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if `uuid` does not exist.
    pub fn comment(&self, uuid: &str, comment: &str) -> Result<()> {
        let changed = self.conn.execute(
            &format!("UPDATE {} SET comment = ?1 WHERE uuid = ?2", self.table),
            params![comment, uuid],
        )?;
        if changed == 0 {
            return Err(Error::NotFound(format!("experiment '{uuid}'")));
        }
        Ok(())
    }

    /// Delete an experiment.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if `uuid` does not exist.
    pub fn delete(&self, uuid: &str) -> Result<()> {
        let changed = self.conn.execute(
            &format!("DELETE FROM {} WHERE uuid = ?1", self.table),
            params![uuid],
        )?;
        if changed == 0 {
            return Err(Error::NotFound(format!("experiment '{uuid}'")));
        }
        tracing::debug!(%uuid, "experiment deleted");
        Ok(())
    }

    /// The `n` most recently created experiments, newest first.
    ///
    /// # Errors
    ///
    /// Returns error if the query fails.
    pub fn recent(&self, n: usize) -> Result<Vec<ExperimentRecord>> {
        let limit = i64::try_from(n).unwrap_or(i64::MAX);
        let mut stmt = self.conn.prepare(&format!(
            "SELECT uuid, created, parameters, comment FROM {}
             ORDER BY created DESC, rowid DESC LIMIT ?1",
            self.table
        ))?;
        let records = stmt
            .query_map(params![limit], row_to_record)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(records)
    }

    /// Run a read-only `SELECT`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ReadOnlyQuery`] for anything other than a single
    /// `SELECT`, or the SQLite error.
    pub fn query(&self, sql: &str) -> Result<QueryResult> {
        query::run(&self.conn, sql)
    }

    /// Parameter paths used by the `limit` most recent experiments.
    ///
    /// Nested objects are flattened into dot-separated paths; the result is
    /// sorted.
    ///
    /// # Errors
    ///
    /// Returns error if the query fails.
    pub fn get_parameters_keys(&self, limit: usize) -> Result<Vec<String>> {
        let keys: BTreeSet<String> = self
            .parameter_paths(limit)?
            .iter()
            .map(|path| path.join("."))
            .collect();
        Ok(keys.into_iter().collect())
    }

    fn parameter_paths(&self, limit: usize) -> Result<BTreeSet<Vec<String>>> {
        let mut paths = BTreeSet::new();
        for record in self.recent(limit)? {
            collect_paths(&[], record.parameters(), &mut paths);
        }
        Ok(paths)
    }

    /// A ready-to-edit `SELECT` extracting every known parameter.
    ///
    /// Each column is aliased with its dot-joined path as a quoted
    /// identifier; repeated aliases get a numeric suffix.
    ///
    /// # Errors
    ///
    /// Returns error if the parameter keys cannot be read.
    pub fn get_sample_query(&self, limit: usize) -> Result<String> {
        let mut columns = vec!["uuid".to_string()];
        let mut aliases = BTreeSet::new();
        for path in self.parameter_paths(limit)? {
            let base = path.join(".");
            let mut alias = base.clone();
            let mut n = 2;
            while !aliases.insert(alias.clone()) {
                alias = format!("{base}_{n}");
                n += 1;
            }
            columns.push(format!(
                "json_extract(parameters, '{}') AS {}",
                json_path(&path).replace('\'', "''"),
                quote_identifier(&alias)
            ));
        }
        Ok(format!(
            "SELECT {}\nFROM {}\nORDER BY created DESC\nLIMIT {limit}",
            columns.join(",\n       "),
            self.table
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_generated_id_length() {
        let tracker = SqliteTracker::in_memory().unwrap();
        let uuid = tracker.new(json!({})).unwrap();
        assert_eq!(uuid.len(), DEFAULT_ID_LENGTH);
        assert!(uuid.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_invalid_table_name() {
        let err = SqliteTracker::builder(":memory:")
            .table("drop table; --")
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn test_invalid_id_length() {
        assert!(SqliteTracker::builder(":memory:").id_length(2).build().is_err());
    }

    #[test]
    fn test_collect_paths_nested() {
        let map = as_object(json!({"a": 1, "b": {"c": 2, "d": {"e": 3}}, "f": {}})).unwrap();
        let mut paths = BTreeSet::new();
        collect_paths(&[], &map, &mut paths);
        let keys: Vec<_> = paths.iter().map(|p| p.join(".")).collect();
        assert_eq!(keys, vec!["a", "b.c", "b.d.e", "f"]);
    }

    #[test]
    fn test_json_path_quotes_segments() {
        let path = |s: &[&str]| json_path(&s.iter().map(ToString::to_string).collect::<Vec<_>>());
        assert_eq!(path(&["b", "c"]), "$.b.c");
        assert_eq!(path(&["lr.decay"]), "$.\"lr.decay\"");
        assert_eq!(path(&["a-b"]), "$.\"a-b\"");
        assert_eq!(quote_identifier("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn test_parameters_must_be_object() {
        let tracker = SqliteTracker::in_memory().unwrap();
        assert!(tracker.new(json!([1, 2])).is_err());
    }
}
