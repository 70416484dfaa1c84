//! Model evaluation and comparison reports
//!
//! Run with: cargo run --example evaluate_classifier

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use skeval::report::{compare_models, evaluate_model, Classifier};
use tracing_subscriber::EnvFilter;

/// Threshold on a weighted sum of the features
struct Linear {
    weights: Vec<f64>,
}

impl Classifier for Linear {
    fn predict(&self, x: &[Vec<f64>]) -> skeval::Result<Vec<i64>> {
        Ok(self
            .predict_proba(x)?
            .iter()
            .map(|p| i64::from(p[1] >= 0.5))
            .collect())
    }

    fn predict_proba(&self, x: &[Vec<f64>]) -> skeval::Result<Vec<Vec<f64>>> {
        Ok(x.iter()
            .map(|row| {
                let z: f64 = row.iter().zip(&self.weights).map(|(a, w)| a * w).sum();
                let p = 1.0 / (1.0 + (-z).exp());
                vec![1.0 - p, p]
            })
            .collect())
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let mut rng = StdRng::seed_from_u64(1);
    let x: Vec<Vec<f64>> = (0..500)
        .map(|_| vec![rng.gen_range(-3.0..3.0), rng.gen_range(-3.0..3.0)])
        .collect();
    let y: Vec<i64> = x.iter().map(|row| i64::from(row[0] + 0.5 * row[1] > 0.0)).collect();

    let good = Linear { weights: vec![2.0, 1.0] };
    let weak = Linear { weights: vec![0.3, -1.0] };

    let y_score = good.predict_proba(&x)?;
    let y_pred = good.predict(&x)?;
    let report = evaluate_model(&y, &y_pred, &y_score)?;
    for section in report.sections() {
        println!("[{}] {}", section.title(), section.texts().join(" / "));
    }

    let dir = tempfile::tempdir()?;
    report.save(dir.path().join("evaluation.html"))?;
    compare_models(&good, &weak, &x, &y)?.save(dir.path().join("comparison.html"))?;
    Ok(())
}
