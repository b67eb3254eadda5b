use anyhow::{Context, Result};
use log::info;
use std::path::PathBuf;

use isomesh::store::{CacheLayout, ColumnStore};

use super::config::PipelineConfig;
use super::IngestArgs;

/// Ingest a delimited source file into the cache
pub fn run(
    cache: PathBuf,
    input: PathBuf,
    ingest: IngestArgs,
    settings: &PipelineConfig,
) -> Result<()> {
    if !input.is_file() {
        anyhow::bail!("Input file does not exist: {}", input.display());
    }
    let options = settings.ingest_options(&ingest)?;

    info!("Ingesting {} into {}", input.display(), cache.display());
    info!(
        "Delimiter: {:?}, trailing columns dropped: {}",
        options.delimiter as char, options.trailing_columns
    );

    let summary = ColumnStore::with_options(CacheLayout::new(&cache), options)
        .ingest(&input)
        .with_context(|| format!("Failed to ingest {}", input.display()))?;

    println!("Dataset: {}", summary.dataset);
    println!("Rows:    {}", summary.row_count);
    println!("Columns:");
    for column in &summary.columns {
        println!(
            "  {:<20} min {:>14} max {:>14}",
            column.name, column.range.min, column.range.max
        );
    }
    println!("Elapsed: {:.2}s", summary.elapsed_seconds);

    Ok(())
}
