//! Experiment tracker tests against on-disk SQLite files

use serde_json::json;
use skeval::plot::{Axes, Figure, FigureConfig, Plot, Roc};
use skeval::tracker::{Logged, SqliteTracker};
use skeval::Error;
use tempfile::TempDir;

fn tracker() -> (TempDir, SqliteTracker) {
    let dir = TempDir::new().unwrap();
    let tracker = SqliteTracker::open(dir.path().join("experiments.db")).unwrap();
    (dir, tracker)
}

// =============================================================================
// Insert / Get
// =============================================================================

#[test]
fn test_insert_and_get() {
    let (_dir, tracker) = tracker();
    tracker
        .insert("run-1", json!({"model": "svc", "params": {"C": 1.0}}))
        .unwrap();

    let record = tracker.get("run-1").unwrap();
    assert_eq!(record.uuid(), "run-1");
    assert_eq!(record.get("model"), Some(&json!("svc")));
    assert!(record.comment().is_none());
}

#[test]
fn test_insert_duplicate_fails() {
    let (_dir, tracker) = tracker();
    tracker.insert("run-1", json!({})).unwrap();
    let err = tracker.insert("run-1", json!({})).unwrap_err();
    assert!(matches!(err, Error::AlreadyExists(_)));
}

#[test]
fn test_get_missing() {
    let (_dir, tracker) = tracker();
    assert!(matches!(tracker.get("nope"), Err(Error::NotFound(_))));
}

#[test]
fn test_numeric_uuid_stays_text() {
    let (_dir, tracker) = tracker();
    tracker.insert("0123", json!({"a": 1})).unwrap();
    tracker.insert("123", json!({"a": 2})).unwrap();

    assert_eq!(tracker.get("0123").unwrap().get("a"), Some(&json!(1)));
    assert_eq!(tracker.get("123").unwrap().get("a"), Some(&json!(2)));

    let result = tracker
        .query("SELECT uuid FROM experiments ORDER BY uuid")
        .unwrap();
    assert_eq!(result.column("uuid").unwrap(), vec![&json!("0123"), &json!("123")]);
}

#[test]
fn test_insert_many_is_atomic() {
    let (_dir, tracker) = tracker();
    tracker.insert("b", json!({})).unwrap();

    let err = tracker
        .insert_many(vec![
            ("a".to_string(), json!({"x": 1})),
            ("b".to_string(), json!({"x": 2})),
        ])
        .unwrap_err();
    assert!(matches!(err, Error::AlreadyExists(_)));
    assert!(!tracker.exists("a").unwrap());
    assert_eq!(tracker.len().unwrap(), 1);

    tracker
        .insert_many(vec![
            ("a".to_string(), json!({"x": 1})),
            ("c".to_string(), json!({"x": 3})),
        ])
        .unwrap();
    assert_eq!(tracker.len().unwrap(), 3);
}

// =============================================================================
// Update / Upsert
// =============================================================================

#[test]
fn test_update_requires_overwrite_flag() {
    let (_dir, tracker) = tracker();
    tracker.insert("run", json!({"a": 1})).unwrap();

    tracker.update("run", json!({"b": 2}), false).unwrap();
    let err = tracker.update("run", json!({"a": 3}), false).unwrap_err();
    assert!(matches!(err, Error::InvalidInput(_)));

    tracker.update("run", json!({"a": 3}), true).unwrap();
    let record = tracker.get("run").unwrap();
    assert_eq!(record.get("a"), Some(&json!(3)));
    assert_eq!(record.get("b"), Some(&json!(2)));
}

#[test]
fn test_update_missing() {
    let (_dir, tracker) = tracker();
    let err = tracker.update("ghost", json!({"a": 1}), true).unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

#[test]
fn test_upsert() {
    let (_dir, tracker) = tracker();
    tracker.upsert("run", json!({"a": 1})).unwrap();
    tracker.upsert("run", json!({"a": 2, "b": 1})).unwrap();
    let record = tracker.get("run").unwrap();
    assert_eq!(record.get("a"), Some(&json!(2)));
    assert_eq!(record.get("b"), Some(&json!(1)));
}

#[test]
fn test_upsert_append_accumulates() {
    let (_dir, tracker) = tracker();
    tracker.upsert_append("run", json!({"loss": 0.9})).unwrap();
    tracker.upsert_append("run", json!({"loss": 0.5, "epoch": 2})).unwrap();
    tracker.upsert_append("run", json!({"loss": 0.3})).unwrap();

    let record = tracker.get("run").unwrap();
    assert_eq!(record.get("loss"), Some(&json!([0.9, 0.5, 0.3])));
    assert_eq!(record.get("epoch"), Some(&json!(2)));
}

// =============================================================================
// Comment / Delete / Recent
// =============================================================================

#[test]
fn test_comment_and_delete() {
    let (_dir, tracker) = tracker();
    let uuid = tracker.new(json!({})).unwrap();
    tracker.comment(&uuid, "baseline").unwrap();
    assert_eq!(tracker.get(&uuid).unwrap().comment(), Some("baseline"));

    tracker.delete(&uuid).unwrap();
    assert!(tracker.is_empty().unwrap());
    assert!(matches!(tracker.delete(&uuid), Err(Error::NotFound(_))));
    assert!(matches!(tracker.comment(&uuid, "x"), Err(Error::NotFound(_))));
}

#[test]
fn test_recent_newest_first() {
    let (_dir, tracker) = tracker();
    for i in 0..5 {
        tracker.insert(&format!("run-{i}"), json!({"i": i})).unwrap();
    }
    let recent = tracker.recent(2).unwrap();
    let ids: Vec<_> = recent.iter().map(|r| r.uuid()).collect();
    assert_eq!(ids, vec!["run-4", "run-3"]);
}

#[test]
fn test_persists_across_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("experiments.db");
    let uuid = {
        let tracker = SqliteTracker::open(&path).unwrap();
        tracker.new(json!({"kept": true})).unwrap()
    };
    let tracker = SqliteTracker::open(&path).unwrap();
    assert_eq!(tracker.get(&uuid).unwrap().get("kept"), Some(&json!(true)));
}

#[test]
fn test_custom_table_and_id_length() {
    let dir = TempDir::new().unwrap();
    let tracker = SqliteTracker::builder(dir.path().join("t.db"))
        .table("runs")
        .id_length(12)
        .build()
        .unwrap();
    let uuid = tracker.new(json!({})).unwrap();
    assert_eq!(uuid.len(), 12);
    assert_eq!(tracker.query("SELECT COUNT(*) AS n FROM runs").unwrap().rows()[0][0], json!(1));
}

// =============================================================================
// Queries
// =============================================================================

#[test]
fn test_query_json_extract() {
    let (_dir, tracker) = tracker();
    tracker.insert("a", json!({"model": "svc", "metrics": {"acc": 0.8}})).unwrap();
    tracker.insert("b", json!({"model": "rf", "metrics": {"acc": 0.9}})).unwrap();

    let result = tracker
        .query(
            "SELECT uuid, json_extract(parameters, '$.metrics.acc') AS acc
             FROM experiments ORDER BY acc DESC",
        )
        .unwrap();
    assert_eq!(result.columns(), &["uuid", "acc"]);
    assert_eq!(result.rows()[0], vec![json!("b"), json!(0.9)]);
}

#[test]
fn test_query_rejects_writes() {
    let (_dir, tracker) = tracker();
    for sql in [
        "DELETE FROM experiments",
        "UPDATE experiments SET comment = 'x'",
        "DROP TABLE experiments",
        "SELECT 1; DROP TABLE experiments",
    ] {
        assert!(
            matches!(tracker.query(sql), Err(Error::ReadOnlyQuery(_))),
            "{sql} should be rejected"
        );
    }
}

#[test]
fn test_query_rejects_writes_inside_cte() {
    let (_dir, tracker) = tracker();
    tracker.insert("abc", json!({})).unwrap();

    for sql in [
        "WITH x AS (SELECT 1) UPDATE experiments SET comment = 'changed'",
        "WITH x AS (SELECT 1) INSERT INTO experiments (uuid, parameters) VALUES ('new', '{}')",
    ] {
        assert!(
            matches!(tracker.query(sql), Err(Error::ReadOnlyQuery(_))),
            "{sql} should be rejected"
        );
    }
    assert!(tracker.get("abc").unwrap().comment().is_none());
    assert_eq!(tracker.len().unwrap(), 1);
}

#[test]
fn test_parameters_keys_and_sample_query() {
    let (_dir, tracker) = tracker();
    tracker.insert("a", json!({"model": "svc", "params": {"C": 1.0}})).unwrap();
    tracker.insert("b", json!({"model": "rf", "params": {"depth": 3}})).unwrap();

    let keys = tracker.get_parameters_keys(10).unwrap();
    assert_eq!(keys, vec!["model", "params.C", "params.depth"]);

    let sql = tracker.get_sample_query(10).unwrap();
    assert!(sql.contains("json_extract(parameters, '$.params.C') AS \"params.C\""));
    let result = tracker.query(&sql).unwrap();
    assert_eq!(result.len(), 2);
    assert_eq!(result.columns().len(), 4);
}

#[test]
fn test_sample_query_runs_on_awkward_keys() {
    let (_dir, tracker) = tracker();
    tracker
        .insert(
            "a",
            json!({"1st": 1, "select": 3, "lr.decay": 0.5, "a-b": "dash", "a_b": "under"}),
        )
        .unwrap();

    let sql = tracker.get_sample_query(10).unwrap();
    let result = tracker.query(&sql).unwrap();
    assert_eq!(
        result.columns(),
        &["uuid", "1st", "a-b", "a_b", "lr.decay", "select"]
    );
    assert_eq!(
        result.rows()[0],
        vec![json!("a"), json!(1), json!("dash"), json!("under"), json!(0.5), json!(3)]
    );
}

#[test]
fn test_sample_query_literal_dot_and_nesting() {
    let (_dir, tracker) = tracker();
    tracker
        .insert("a", json!({"lr.decay": 0.5, "lr": {"decay": 0.9}}))
        .unwrap();

    let result = tracker.query(&tracker.get_sample_query(10).unwrap()).unwrap();
    assert_eq!(result.columns(), &["uuid", "lr.decay", "lr.decay_2"]);
    assert_eq!(result.rows()[0], vec![json!("a"), json!(0.9), json!(0.5)]);
}

// =============================================================================
// Experiment handle
// =============================================================================

#[test]
fn test_experiment_logging() {
    let (_dir, tracker) = tracker();
    let experiment = tracker.new_experiment().unwrap();
    experiment.log("accuracy", 0.91).unwrap();
    experiment
        .log_dict(
            json!({"model": "svc", "C": 10})
                .as_object()
                .cloned()
                .unwrap(),
        )
        .unwrap();
    experiment.comment("tuned").unwrap();

    let params = experiment.parameters().unwrap();
    assert_eq!(params.len(), 3);
    assert_eq!(tracker.get(experiment.uuid()).unwrap().comment(), Some("tuned"));
}

#[test]
fn test_logged_plots_restore() {
    let (_dir, tracker) = tracker();
    let experiment = tracker.new_experiment().unwrap();

    let figure = Figure::single(Axes::new("loss"), FigureConfig::default());
    experiment.log_figure("loss_plot", &figure).unwrap();
    let report = experiment
        .log_classification_report(Some("report"), &[0, 1, 1], &[0, 1, 0])
        .unwrap();

    assert_eq!(experiment.get("loss_plot").unwrap(), Logged::Figure(figure.to_svg()));
    assert_eq!(
        experiment.get("report").unwrap(),
        Logged::ClassificationReport(report)
    );

    let reopened = tracker.get_experiment(experiment.uuid()).unwrap();
    assert!(matches!(reopened.get("loss_plot"), Ok(Logged::Figure(_))));
}

#[test]
fn test_logged_roc_renders_back() {
    let (_dir, tracker) = tracker();
    let experiment = tracker.new_experiment().unwrap();
    let y_score = [vec![0.1], vec![0.4], vec![0.35], vec![0.8]];
    let roc = Roc::from_raw_data(&[0, 0, 1, 1], &y_score).unwrap();
    experiment.log_plot("roc", &roc).unwrap();

    match experiment.get("roc").unwrap() {
        Logged::Plot { class, figure } => {
            assert_eq!(class, "ROC");
            assert_eq!(figure, roc.plot());
        }
        other => panic!("expected a restored plot, got {other:?}"),
    }

    let result = tracker
        .query("SELECT json_extract(parameters, '$.roc') AS roc FROM experiments")
        .unwrap();
    assert!(result.to_html(true).unwrap().contains("<img"));
}

#[test]
fn test_query_html_renders_plots() {
    let (_dir, tracker) = tracker();
    let experiment = tracker.new_experiment().unwrap();
    experiment
        .log_confusion_matrix(None, &[0, 1, 1, 0], &[0, 1, 0, 0])
        .unwrap();

    let result = tracker
        .query("SELECT json_extract(parameters, '$.confusion_matrix') AS cm FROM experiments")
        .unwrap();
    let with_plots = result.to_html(true).unwrap();
    let without_plots = result.to_html(false).unwrap();
    assert!(with_plots.contains("<img src=\"data:image/svg+xml;base64,"));
    assert!(!without_plots.contains("<img"));
}

#[test]
fn test_get_experiment_missing() {
    let (_dir, tracker) = tracker();
    assert!(matches!(tracker.get_experiment("nope"), Err(Error::NotFound(_))));
}
