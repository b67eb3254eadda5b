use anyhow::{Context, Result};
use std::path::PathBuf;

use isomesh::query::ColumnarReader;
use isomesh::store::{load_schema, CacheLayout};

/// Print rows of a cached dataset as JSON lines
pub fn run(cache: PathBuf, dataset: String, ids: Vec<u32>, columns: Vec<String>) -> Result<()> {
    let dataset = CacheLayout::new(&cache).dataset(&dataset);
    let columns = if columns.is_empty() {
        load_schema(&dataset)?.columns().to_vec()
    } else {
        columns
    };

    let mut reader = ColumnarReader::open(&dataset, columns.as_slice())
        .with_context(|| format!("Failed to open columns of {}", dataset.name()))?;
    let rows = reader.read_rows(&ids).context("Row query failed")?;

    for row in &rows {
        println!("{}", row.to_json(&columns));
    }
    Ok(())
}
