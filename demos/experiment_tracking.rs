//! Experiment tracking demo
//!
//! Logs a small grid of runs to a SQLite file and queries them back.
//!
//! Run with: cargo run --example experiment_tracking

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::json;
use skeval::plot::{Plot, Roc};
use skeval::tracker::SqliteTracker;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let dir = tempfile::tempdir()?;
    let tracker = SqliteTracker::open(dir.path().join("experiments.db"))?;
    let mut rng = StdRng::seed_from_u64(0);

    let y_true: Vec<i64> = (0..200).map(|i| i64::from(i % 3 == 0)).collect();
    for noise in [0.2, 0.4, 0.6] {
        let y_score: Vec<Vec<f64>> = y_true
            .iter()
            .map(|&y| {
                let p = (0.5 + (y as f64 - 0.5) * (1.0 - noise) + rng.gen_range(-noise..noise))
                    .clamp(0.0, 1.0);
                vec![1.0 - p, p]
            })
            .collect();
        let y_pred: Vec<i64> = y_score.iter().map(|p| i64::from(p[1] >= 0.5)).collect();

        let roc = Roc::from_raw_data(&y_true, &y_score)?;
        let experiment = tracker.new_experiment()?;
        experiment.log("noise", noise)?;
        experiment.log("auc", roc.aucs()[0])?;
        experiment.log_figure("roc", &roc.plot())?;
        experiment.log_confusion_matrix(None, &y_true, &y_pred)?;
        println!("run {} noise={noise} auc={:.3}", experiment.uuid(), roc.aucs()[0]);
    }

    println!("\nparameter keys: {:?}", tracker.get_parameters_keys(10)?);
    let result = tracker.query(
        "SELECT uuid,
                json_extract(parameters, '$.noise') AS noise,
                json_extract(parameters, '$.auc') AS auc
         FROM experiments
         ORDER BY auc DESC",
    )?;
    for row in result.rows() {
        println!("{row:?}");
    }

    let best = &result.rows()[0][0];
    if let Some(uuid) = best.as_str() {
        tracker.comment(uuid, "best run")?;
        tracker.upsert_append(uuid, json!({"reviewed_by": "demo"}))?;
    }

    std::fs::write(dir.path().join("runs.html"), result.to_html(true)?)?;
    println!("\nsample query:\n{}", tracker.get_sample_query(10)?);
    Ok(())
}
