//! Error types for skeval
//!
//! Clear error messages with actionable guidance: every variant says what
//! went wrong and, where it helps, what to do about it.

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// skeval error types
#[derive(Error, Debug)]
pub enum Error {
    /// Input data is empty, contains NaN, or is otherwise unusable
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Two inputs that must line up do not
    #[error("Shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch {
        /// Expected shape or length
        expected: String,
        /// Actual shape or length
        actual: String,
    },

    /// Experiment, notebook or tag does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Insert attempted on an identifier that is already taken
    #[error("Already exists: {0}\nUse update or upsert to modify an existing record")]
    AlreadyExists(String),

    /// Query is not a single read-only SELECT statement
    #[error("Only a single SELECT statement is allowed, got: {0}")]
    ReadOnlyQuery(String),

    /// SQL or notebook parameter parse error
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Dump file holds a different plot type than requested
    #[error("Dump class mismatch: expected {expected}, found {found}")]
    DumpMismatch {
        /// Plot class requested by the caller
        expected: String,
        /// Plot class stored in the dump
        found: String,
    },

    /// Model could not produce the requested predictions
    #[error("Model error: {0}")]
    Model(String),

    /// HTML rendering error
    #[error("Render error: {0}")]
    Render(#[from] minijinja::Error),

    /// SQL parser error
    #[error("SQL parse error: {0}")]
    Sql(#[from] sqlparser::parser::ParserError),

    /// SQLite error
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// JSON serialization error
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Directory traversal error
    #[error("Directory walk error: {0}")]
    Walk(#[from] walkdir::Error),

    /// Glob pattern error
    #[error("Invalid glob pattern: {0}")]
    Glob(#[from] globset::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Shorthand for [`Error::InvalidInput`].
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Build a [`Error::ShapeMismatch`] for two lengths.
    #[must_use]
    pub fn length_mismatch(expected: usize, actual: usize) -> Self {
        Self::ShapeMismatch {
            expected: format!("length {expected}"),
            actual: format!("length {actual}"),
        }
    }
}
