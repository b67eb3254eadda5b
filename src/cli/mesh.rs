use anyhow::{Context, Result};
use log::{info, warn};
use std::path::PathBuf;

use isomesh::pipeline::{MeshBuildConfig, MeshBuildOrchestrator};
use isomesh::store::CacheLayout;

use super::config::PipelineConfig;
use super::MeshArgs;

/// What to mesh, before config-file defaults are applied.
pub struct MeshRequest {
    pub attribute: String,
    pub axes: Vec<String>,
    pub resolution: Option<usize>,
    pub threads: Option<usize>,
    pub iso_level: Option<f32>,
}

/// Build meshes for one partitioned attribute
pub fn run(
    cache: PathBuf,
    dataset: String,
    request: MeshRequest,
    mesh: MeshArgs,
    settings: &PipelineConfig,
) -> Result<()> {
    let [x, y, z] = match request.axes.as_slice() {
        [x, y, z] => [x.as_str(), y.as_str(), z.as_str()],
        _ => anyhow::bail!("Expected three axis columns, got {}", request.axes.len()),
    };
    let config = MeshBuildConfig::new(request.attribute.as_str())
        .with_axes(x, y, z)
        .with_resolution(settings.resolution(request.resolution))
        .with_threads(settings.threads(request.threads))
        .with_iso_level(settings.iso_level(request.iso_level))
        .with_split_cap(settings.split_cap(&mesh))
        .with_min_partition_bytes(settings.min_partition_bytes(&mesh))
        .with_debug_grids(mesh.debug_grids);
    config.validate().context("Invalid mesh arguments")?;

    let dataset = CacheLayout::new(&cache).dataset(&dataset);
    info!(
        "Meshing {} of {} at resolution {} (iso-level {})",
        config.attribute,
        dataset.name(),
        config.resolution,
        config.iso_level
    );

    let report = MeshBuildOrchestrator::new(dataset, config)
        .build()
        .context("Mesh build failed")?;

    for mesh in &report.meshes {
        println!(
            "{:>8} vertices {:>8} triangles  {}",
            mesh.vertices,
            mesh.triangles,
            mesh.path.display()
        );
    }
    for failure in &report.failures {
        warn!("No mesh for {}: {}", failure.partition.display(), failure.message);
    }
    println!(
        "{} meshes in {} ({} failed, {} skipped) in {:.2}s",
        report.meshes.len(),
        report.output_dir.display(),
        report.failures.len(),
        report.skipped.len(),
        report.elapsed_seconds
    );

    Ok(())
}
