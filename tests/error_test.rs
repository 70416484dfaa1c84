//! Tests for error types

use skeval::Error;

#[test]
fn test_invalid_input_error() {
    let error = Error::InvalidInput("y_true must not be empty".to_string());
    let error_str = format!("{error}");
    assert!(error_str.contains("Invalid input"));
    assert!(error_str.contains("y_true must not be empty"));
}

#[test]
fn test_shape_mismatch_error() {
    let error = Error::ShapeMismatch {
        expected: "3 samples".to_string(),
        actual: "4 samples".to_string(),
    };
    let error_str = format!("{error}");
    assert!(error_str.contains("Shape mismatch"));
    assert!(error_str.contains("3 samples"));
    assert!(error_str.contains("4 samples"));
}

#[test]
fn test_length_mismatch_helper() {
    let error = Error::length_mismatch(3, 4);
    assert!(matches!(error, Error::ShapeMismatch { .. }));
}

#[test]
fn test_already_exists_suggests_upsert() {
    let error = Error::AlreadyExists("experiment 'abc'".to_string());
    let error_str = format!("{error}");
    assert!(error_str.contains("Already exists"));
    assert!(error_str.contains("upsert"));
}

#[test]
fn test_read_only_query_error() {
    let error = Error::ReadOnlyQuery("DELETE FROM experiments".to_string());
    let error_str = format!("{error}");
    assert!(error_str.contains("Only a single SELECT"));
    assert!(error_str.contains("DELETE FROM experiments"));
}

#[test]
fn test_dump_mismatch_error() {
    let error = Error::DumpMismatch {
        expected: "ROC".to_string(),
        found: "ConfusionMatrix".to_string(),
    };
    let error_str = format!("{error}");
    assert!(error_str.contains("expected ROC"));
    assert!(error_str.contains("found ConfusionMatrix"));
}

#[test]
fn test_not_found_error() {
    let error = Error::NotFound("experiment 'abc'".to_string());
    assert!(format!("{error}").contains("Not found"));
}

#[test]
fn test_model_error() {
    let error = Error::Model("no predict_proba".to_string());
    assert!(format!("{error}").contains("Model error"));
}

#[test]
fn test_io_error_conversion() {
    let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "missing.ipynb");
    let error: Error = io_error.into();
    let error_str = format!("{error}");
    assert!(error_str.contains("IO error"));
    assert!(error_str.contains("missing.ipynb"));
}

#[test]
fn test_serde_error_conversion() {
    let serde_error = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
    let error: Error = serde_error.into();
    assert!(matches!(error, Error::Serde(_)));
}

#[test]
fn test_error_debug() {
    let error = Error::ParseError("bad literal".to_string());
    let debug_str = format!("{error:?}");
    assert!(debug_str.contains("ParseError"));
}
