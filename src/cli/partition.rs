use anyhow::{Context, Result};
use log::{info, warn};
use std::path::PathBuf;

use isomesh::partition::RangePartitioner;
use isomesh::store::CacheLayout;

use super::config::PipelineConfig;

/// Partition columns of a cached dataset
pub fn run(
    cache: PathBuf,
    dataset: String,
    columns: Vec<String>,
    divisions: Option<usize>,
    threads: Option<usize>,
    settings: &PipelineConfig,
) -> Result<()> {
    let divisions = settings.divisions(divisions);
    let threads = settings.partition_threads(threads);
    if divisions == 0 {
        anyhow::bail!("Division count must be at least 1");
    }

    let dataset = CacheLayout::new(&cache).dataset(&dataset);
    dataset.require()?;
    let partitioner = RangePartitioner::new(dataset);
    let columns = if columns.is_empty() {
        partitioner.all_columns()?
    } else {
        columns
    };

    info!(
        "Partitioning {} columns into {} ranges on {} threads",
        columns.len(),
        divisions,
        threads
    );
    let report = partitioner
        .split_columns(&columns, divisions, threads)
        .context("Partitioning failed")?;

    for column in &report.columns {
        println!(
            "{}: {} files (width {}), {} small buckets dropped ({} records)",
            column.column,
            column.files.len(),
            column.divider,
            column.discarded_buckets,
            column.discarded_records
        );
        for file in &column.files {
            println!("  {:>10} records  {}", file.records, file.path.display());
        }
    }
    for failure in &report.failures {
        warn!("Column {} failed: {}", failure.column, failure.message);
    }
    println!(
        "{} files written in {:.2}s",
        report.files_written(),
        report.elapsed_seconds
    );

    if !report.is_complete() {
        anyhow::bail!("{} of {} columns failed", report.failures.len(), columns.len());
    }
    Ok(())
}
