//! Index executed notebooks and compare their tagged outputs
//!
//! Run with: cargo run --example notebook_index -- 'output/**/*.ipynb'

use skeval::nb::{NotebookCollection, NotebookDatabase};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let pattern = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "output/**/*.ipynb".to_string());

    let dir = tempfile::tempdir()?;
    let db = NotebookDatabase::open(dir.path().join("nbs.db"), pattern)?;
    let summary = db.index(false)?;
    println!(
        "indexed {} notebooks ({} skipped, {} failed)",
        summary.indexed, summary.skipped, summary.failed
    );

    let result = db.query(
        "SELECT path, json_extract(c, '$.parameters') AS parameters FROM nbs ORDER BY path",
    )?;
    for row in result.rows() {
        println!("{row:?}");
    }

    let paths = db.matching_paths()?;
    if paths.is_empty() {
        return Ok(());
    }
    let collection = NotebookCollection::from_paths(&paths, None)?;
    let first = collection.ids()[0].clone();
    if let Some(nb) = collection.notebook(&first) {
        for tag in nb.tags() {
            let html = collection.to_html(&tag)?;
            std::fs::write(dir.path().join(format!("{tag}.html")), html)?;
            println!("wrote comparison for tag {tag}");
        }
    }
    Ok(())
}
