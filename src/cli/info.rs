use anyhow::{Context, Result};
use std::path::PathBuf;

use isomesh::format::{has_extension, MESH_EXTENSION};
use isomesh::store::{load_range, CacheLayout, DatasetManifest};

/// Display information about a cached dataset, or list the cache
pub fn run(cache: PathBuf, dataset: Option<String>) -> Result<()> {
    let layout = CacheLayout::new(&cache);
    let Some(name) = dataset else {
        println!("Datasets in {}:", cache.display());
        for name in layout.datasets().context("Failed to list cache")? {
            println!("  {}", name);
        }
        return Ok(());
    };

    let dataset = layout.dataset(&name);
    dataset.require()?;

    println!("isomesh Dataset Information");
    println!("===========================");
    println!("Dataset: {}", dataset.name());
    println!("Path:    {}", dataset.dir().display());
    println!();

    let manifest_path = dataset.manifest_path();
    if manifest_path.is_file() {
        let manifest = DatasetManifest::read(&manifest_path)?;
        println!("Manifest:");
        println!("  Version:  {}", manifest.format_version);
        println!("  Source:   {}", manifest.source.display());
        println!("  Ingested: {}", manifest.ingested_at);
        println!("  Rows:     {}", manifest.row_count);
        println!();
    }

    println!("Columns:");
    for column in dataset.columns_on_disk()? {
        let range = load_range(&dataset, &column)?;
        let partitions = dataset.partition_files(&column)?;
        println!(
            "  {:<20} [{}, {}]  {} partitions",
            column,
            range.min,
            range.max,
            partitions.len()
        );
    }

    let meshes_dir = dataset.meshes_dir();
    if meshes_dir.is_dir() {
        println!();
        println!("Meshes:");
        for attribute in std::fs::read_dir(&meshes_dir)? {
            let attribute = attribute?.path();
            if !attribute.is_dir() {
                continue;
            }
            for resolution in std::fs::read_dir(&attribute)? {
                let resolution = resolution?.path();
                if !resolution.is_dir() {
                    continue;
                }
                let count = std::fs::read_dir(&resolution)?
                    .filter_map(|e| e.ok())
                    .filter(|e| has_extension(&e.path(), MESH_EXTENSION))
                    .count();
                println!(
                    "  {}/{}: {} mesh files",
                    attribute.file_name().unwrap_or_default().to_string_lossy(),
                    resolution.file_name().unwrap_or_default().to_string_lossy(),
                    count
                );
            }
        }
    }

    Ok(())
}
