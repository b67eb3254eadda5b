use anyhow::{Context, Result};
use log::{info, warn};
use std::path::PathBuf;

use isomesh::pipeline::{BuildRequest, Pipeline};
use isomesh::store::CacheLayout;

use super::config::PipelineConfig;
use super::{IngestArgs, MeshArgs};

/// Positional arguments of `isomesh build`.
pub struct BuildArgs {
    pub input: PathBuf,
    pub divisions: usize,
    pub attribute: String,
    pub resolution: usize,
    pub threads: usize,
    pub axes: [String; 3],
    pub iso_level: f32,
    pub split: Vec<String>,
    pub partition_threads: Option<usize>,
}

/// Ingest, partition and mesh a source file
pub fn run(
    cache: PathBuf,
    args: BuildArgs,
    ingest: IngestArgs,
    mesh: MeshArgs,
    settings: &PipelineConfig,
) -> Result<()> {
    let options = settings.pipeline_options(&ingest, &mesh, args.partition_threads)?;
    let request = BuildRequest {
        source: args.input,
        divisions: args.divisions,
        attribute: args.attribute,
        resolution: args.resolution,
        threads: args.threads,
        axes: args.axes,
        iso_level: args.iso_level,
        split_columns: args.split,
    };
    request.validate().context("Invalid build arguments")?;

    info!("isomesh build");
    info!("=============");
    info!("Input:      {}", request.source.display());
    info!("Cache:      {}", cache.display());
    info!("Attribute:  {}", request.attribute);
    info!("Divisions:  {}", request.divisions);
    info!("Resolution: {}", request.resolution);
    info!("Threads:    {}", request.threads);
    info!("Axes:       {}", request.axes.join(", "));
    info!("Iso-level:  {}", request.iso_level);

    let pipeline = Pipeline::with_options(CacheLayout::new(&cache), options);
    let summary = pipeline.run(&request).context("Build failed")?;

    for failure in &summary.partition.failures {
        warn!("Column {} was not partitioned: {}", failure.column, failure.message);
    }
    for failure in &summary.meshes.failures {
        warn!("No mesh for {}: {}", failure.partition.display(), failure.message);
    }

    println!("Dataset:    {}", summary.ingest.dataset);
    println!("Rows:       {}", summary.ingest.row_count);
    println!(
        "Partitions: {} files over {} columns",
        summary.partition.files_written(),
        summary.partition.columns.len()
    );
    println!(
        "Meshes:     {} written, {} failed, {} skipped",
        summary.meshes.meshes.len(),
        summary.meshes.failures.len(),
        summary.meshes.skipped.len()
    );
    println!("Output:     {}", summary.meshes.output_dir.display());
    println!("Elapsed:    {:.2}s", summary.elapsed_seconds);

    Ok(())
}
