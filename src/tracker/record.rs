//! Experiment Record - one row of the tracker table

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Experiment Record represents a tracked experiment.
///
/// Parameters are a JSON object, so nested values can be queried with
/// SQLite's `json_extract`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExperimentRecord {
    uuid: String,
    created: DateTime<Utc>,
    parameters: Map<String, Value>,
    comment: Option<String>,
}

impl ExperimentRecord {
    /// Create a new record with empty parameters.
    ///
    /// # Arguments
    ///
    /// * `uuid` - Unique identifier for the experiment
    ///
    /// # Returns
    ///
    /// A new `ExperimentRecord` with the current timestamp.
    #[must_use]
    pub fn new(uuid: impl Into<String>) -> Self {
        Self {
            uuid: uuid.into(),
            created: Utc::now(),
            parameters: Map::new(),
            comment: None,
        }
    }

    /// Create a builder for constructing a record with optional fields.
    #[must_use]
    pub fn builder(uuid: impl Into<String>) -> ExperimentRecordBuilder {
        ExperimentRecordBuilder::new(uuid)
    }

    /// Get the experiment ID.
    #[must_use]
    pub fn uuid(&self) -> &str {
        &self.uuid
    }

    /// Get the creation timestamp.
    #[must_use]
    pub const fn created(&self) -> DateTime<Utc> {
        self.created
    }

    /// Get the logged parameters.
    #[must_use]
    pub const fn parameters(&self) -> &Map<String, Value> {
        &self.parameters
    }

    /// Get a single parameter.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.parameters.get(key)
    }

    /// Get the comment, if any.
    #[must_use]
    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }
}

/// Builder for `ExperimentRecord`.
#[derive(Debug)]
pub struct ExperimentRecordBuilder {
    uuid: String,
    created: DateTime<Utc>,
    parameters: Map<String, Value>,
    comment: Option<String>,
}

impl ExperimentRecordBuilder {
    /// Create a new builder with the required ID.
    #[must_use]
    pub fn new(uuid: impl Into<String>) -> Self {
        Self {
            uuid: uuid.into(),
            created: Utc::now(),
            parameters: Map::new(),
            comment: None,
        }
    }

    /// Set the parameters.
    #[must_use]
    pub fn parameters(mut self, parameters: Map<String, Value>) -> Self {
        self.parameters = parameters;
        self
    }

    /// Set the comment.
    #[must_use]
    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Set a custom creation timestamp (used when loading from the database).
    #[must_use]
    pub const fn created(mut self, created: DateTime<Utc>) -> Self {
        self.created = created;
        self
    }

    /// Build the `ExperimentRecord`.
    #[must_use]
    pub fn build(self) -> ExperimentRecord {
        ExperimentRecord {
            uuid: self.uuid,
            created: self.created,
            parameters: self.parameters,
            comment: self.comment,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_experiment_record_new() {
        let record = ExperimentRecord::new("abc12345");
        assert_eq!(record.uuid(), "abc12345");
        assert!(record.parameters().is_empty());
        assert!(record.comment().is_none());
    }

    #[test]
    fn test_experiment_record_builder() {
        let mut params = Map::new();
        params.insert("lr".into(), serde_json::json!(0.01));
        let record = ExperimentRecord::builder("abc12345")
            .parameters(params)
            .comment("baseline")
            .build();

        assert_eq!(record.get("lr"), Some(&serde_json::json!(0.01)));
        assert_eq!(record.comment(), Some("baseline"));
    }
}
