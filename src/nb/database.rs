//! Index executed notebooks into SQLite for querying
//!
//! Every notebook matching a glob pattern becomes one row: its path, a JSON
//! column `c` with tagged outputs and injected parameters, and the time it
//! was indexed. Outputs are then queried with `json_extract`:
//!
//! ```sql
//! SELECT path,
//!        json_extract(c, '$.parameters.model') AS model,
//!        json_extract(c, '$.metrics.acc') AS acc
//! FROM nbs
//! ORDER BY acc DESC
//! ```

use std::path::{Component, Path, PathBuf};

use globset::{GlobBuilder, GlobMatcher};
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::{Map, Value};
use walkdir::WalkDir;

#[cfg(feature = "rayon")]
use rayon::prelude::*;

use super::introspector::NotebookIntrospector;
use crate::query::{self, QueryResult};
use crate::tracker::{check_identifier, now_text};
use crate::Result;

/// Default table name
pub const DEFAULT_TABLE: &str = "nbs";

/// Key holding injected parameters inside the `c` column
pub const PARAMETERS_KEY: &str = "parameters";

/// Counts from one [`NotebookDatabase::index`] run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndexSummary {
    /// Notebooks written to the table
    pub indexed: usize,
    /// Notebooks already present and left alone
    pub skipped: usize,
    /// Notebooks that could not be read
    pub failed: usize,
}

/// Builder for [`NotebookDatabase`].
#[derive(Debug, Clone)]
pub struct NotebookDatabaseBuilder {
    path: PathBuf,
    pattern: String,
    table: String,
    tags: Option<Vec<String>>,
}

impl NotebookDatabaseBuilder {
    /// Set the table name.
    #[must_use]
    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    /// Only store outputs for these tags.
    #[must_use]
    pub fn tags(mut self, tags: Vec<String>) -> Self {
        self.tags = Some(tags);
        self
    }

    /// Open the database and create the table if needed.
    ///
    /// # Errors
    ///
    /// Returns error if the table name or pattern is invalid, or SQLite
    /// cannot open the file.
    pub fn build(self) -> Result<NotebookDatabase> {
        check_identifier(&self.table)?;
        let pattern = normalized_pattern(&self.pattern);
        let matcher = GlobBuilder::new(&pattern)
            .literal_separator(true)
            .build()?
            .compile_matcher();
        let root = glob_root(&pattern);

        let conn = Connection::open(&self.path)?;
        conn.execute(
            &format!(
                "CREATE TABLE IF NOT EXISTS {} (
                    path TEXT NOT NULL PRIMARY KEY,
                    c TEXT NOT NULL,
                    indexed TEXT NOT NULL
                )",
                self.table
            ),
            [],
        )?;

        Ok(NotebookDatabase {
            conn,
            table: self.table,
            root,
            matcher,
            tags: self.tags,
        })
    }
}

/// Leading directories of `pattern` that hold no glob syntax.
fn glob_root(pattern: &str) -> PathBuf {
    let mut root = PathBuf::new();
    for component in Path::new(pattern).components() {
        let text = component.as_os_str().to_string_lossy();
        if text.contains(['*', '?', '[', '{']) {
            break;
        }
        root.push(component);
    }
    // The loop may have consumed a literal file name; walk its parent.
    if root.as_os_str() == pattern {
        root.pop();
    }
    if root.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        root
    }
}

/// `path` without a leading `./`, as written in glob patterns.
fn normalized(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}

/// `pattern` with `.` segments dropped, so it matches [`normalized`] paths.
fn normalized_pattern(pattern: &str) -> String {
    let kept: Vec<&str> = pattern.split('/').filter(|segment| *segment != ".").collect();
    if kept.is_empty() {
        pattern.to_string()
    } else {
        kept.join("/")
    }
}

/// Executed notebooks indexed into a SQLite table.
#[derive(Debug)]
pub struct NotebookDatabase {
    conn: Connection,
    table: String,
    root: PathBuf,
    matcher: GlobMatcher,
    tags: Option<Vec<String>>,
}

impl NotebookDatabase {
    /// Builder for a database at `path` indexing files matching `pattern`
    /// (for example `output/**/*.ipynb`).
    #[must_use]
    pub fn builder(path: impl AsRef<Path>, pattern: impl Into<String>) -> NotebookDatabaseBuilder {
        NotebookDatabaseBuilder {
            path: path.as_ref().to_path_buf(),
            pattern: pattern.into(),
            table: DEFAULT_TABLE.to_string(),
            tags: None,
        }
    }

    /// Open with default settings.
    ///
    /// # Errors
    ///
    /// Returns error if the pattern is invalid or SQLite cannot open the file.
    pub fn open(path: impl AsRef<Path>, pattern: impl Into<String>) -> Result<Self> {
        Self::builder(path, pattern).build()
    }

    /// Table name.
    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Files currently matching the pattern, sorted.
    ///
    /// # Errors
    ///
    /// Returns error if a directory cannot be read.
    pub fn matching_paths(&self) -> Result<Vec<PathBuf>> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }
        let mut paths = Vec::new();
        for entry in WalkDir::new(&self.root).sort_by_file_name() {
            let entry = entry?;
            if entry.file_type().is_file() && self.matcher.is_match(normalized(entry.path())) {
                paths.push(normalized(entry.path()));
            }
        }
        Ok(paths)
    }

    fn is_indexed(&self, path: &str) -> Result<bool> {
        let found: Option<i64> = self
            .conn
            .query_row(
                &format!("SELECT 1 FROM {} WHERE path = ?1", self.table),
                params![path],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    fn record(&self, notebook: &NotebookIntrospector) -> Map<String, Value> {
        let mut data = notebook.to_json_serializable();
        if let Some(tags) = &self.tags {
            data.retain(|tag, _| tags.contains(tag));
        }
        data.insert(
            PARAMETERS_KEY.to_string(),
            Value::Object(notebook.get_injected_parameters()),
        );
        data
    }

    /// Index matching notebooks.
    ///
    /// Paths already in the table are skipped unless `update` is set.
    /// Notebooks that fail to load are logged and counted, never fatal.
    ///
    /// # Errors
    ///
    /// Returns error if the directory walk or a SQLite write fails.
    pub fn index(&self, update: bool) -> Result<IndexSummary> {
        let mut summary = IndexSummary::default();
        let mut pending = Vec::new();
        for path in self.matching_paths()? {
            let key = path.display().to_string();
            if !update && self.is_indexed(&key)? {
                summary.skipped += 1;
            } else {
                pending.push((key, path));
            }
        }

        #[cfg(feature = "rayon")]
        let loaded: Vec<_> = pending
            .into_par_iter()
            .map(|(key, path)| (key, NotebookIntrospector::from_path(&path)))
            .collect();
        #[cfg(not(feature = "rayon"))]
        let loaded: Vec<_> = pending
            .into_iter()
            .map(|(key, path)| (key, NotebookIntrospector::from_path(&path)))
            .collect();

        let tx = self.conn.unchecked_transaction()?;
        for (key, notebook) in loaded {
            match notebook {
                Ok(notebook) => {
                    let json = serde_json::to_string(&self.record(&notebook))?;
                    tx.execute(
                        &format!(
                            "INSERT OR REPLACE INTO {} (path, c, indexed) VALUES (?1, ?2, ?3)",
                            self.table
                        ),
                        params![key, json, now_text()],
                    )?;
                    summary.indexed += 1;
                }
                Err(err) => {
                    tracing::warn!(path = %key, error = %err, "skipping notebook");
                    summary.failed += 1;
                }
            }
        }
        tx.commit()?;

        tracing::info!(
            indexed = summary.indexed,
            skipped = summary.skipped,
            failed = summary.failed,
            "notebook index updated"
        );
        Ok(summary)
    }

    /// Number of indexed notebooks.
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

    /// Whether nothing has been indexed.
    ///
    /// # Errors
    ///
    /// Returns error if the count query fails.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Run a read-only `SELECT` over the index.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ReadOnlyQuery`](crate::Error::ReadOnlyQuery) for anything but a single `SELECT`.
    pub fn query(&self, sql: &str) -> Result<QueryResult> {
        query::run(&self.conn, sql)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn test_glob_root() {
        assert_eq!(glob_root("output/**/*.ipynb"), PathBuf::from("output"));
        assert_eq!(glob_root("*.ipynb"), PathBuf::from("."));
        assert_eq!(glob_root("a/b/nb.ipynb"), PathBuf::from("a/b"));
    }

    #[test]
    fn test_normalized_strips_cur_dir() {
        assert_eq!(normalized(Path::new("./a/b.ipynb")), PathBuf::from("a/b.ipynb"));
    }

    #[test]
    fn test_normalized_pattern() {
        assert_eq!(normalized_pattern("./out/*.ipynb"), "out/*.ipynb");
        assert_eq!(normalized_pattern("/tmp/./out/**/*.ipynb"), "/tmp/out/**/*.ipynb");
        assert_eq!(normalized_pattern("*.ipynb"), "*.ipynb");
        assert_eq!(glob_root(&normalized_pattern("./out/*.ipynb")), PathBuf::from("out"));
    }

    #[test]
    fn test_invalid_pattern() {
        let dir = tempfile::tempdir().unwrap();
        let result = NotebookDatabase::open(dir.path().join("db.sqlite"), "[");
        assert!(matches!(result, Err(Error::Glob(_))));
    }
}
