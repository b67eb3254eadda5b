//! Phase driver: ingest, partition, then mesh.

use std::path::PathBuf;
use std::time::Instant;

use log::info;

use crate::mesh::DEFAULT_SPLIT_CAP;
use crate::partition::{PartitionReport, RangePartitioner, DEFAULT_PARTITION_THREADS};
use crate::progress::ProgressTracker;
use crate::store::{CacheLayout, ColumnStore, IngestOptions, IngestSummary};

use super::error::PipelineError;
use super::orchestrator::{MeshBuildConfig, MeshBuildOrchestrator, MeshBuildReport};

/// Everything needed to go from a source file to meshes.
#[derive(Debug, Clone)]
pub struct BuildRequest {
    /// Delimited source file
    pub source: PathBuf,
    /// Number of value-range partitions per column
    pub divisions: usize,
    /// Attribute whose partitions are meshed
    pub attribute: String,
    /// Approximate voxel bins per partition
    pub resolution: usize,
    /// Mesh worker threads
    pub threads: usize,
    /// Axis columns (x, y, z)
    pub axes: [String; 3],
    /// Iso-level in the normalized density field
    pub iso_level: f32,
    /// Columns to partition; empty means every column
    pub split_columns: Vec<String>,
}

impl BuildRequest {
    /// Reject a request that cannot run, before touching the cache.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if !self.source.is_file() {
            return Err(PipelineError::SourceNotFound(self.source.clone()));
        }
        if self.divisions == 0 {
            return Err(PipelineError::InvalidConfig(
                "division count must be at least 1".to_string(),
            ));
        }
        if self.attribute.is_empty() {
            return Err(PipelineError::InvalidConfig(
                "attribute name is empty".to_string(),
            ));
        }
        if !self.split_columns.is_empty() && !self.split_columns.contains(&self.attribute) {
            return Err(PipelineError::InvalidConfig(format!(
                "attribute {} is not among the columns to split",
                self.attribute
            )));
        }
        Ok(())
    }
}

/// Tunables shared by every run of a [`Pipeline`].
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Source parsing options
    pub ingest: IngestOptions,
    /// Columns partitioned concurrently
    pub partition_threads: usize,
    /// Vertex cap per mesh file
    pub split_cap: usize,
    /// Partition files smaller than this are not meshed
    pub min_partition_bytes: u64,
    /// Write `.fara` / `.vox` debug grids next to the meshes
    pub write_debug_grids: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            ingest: IngestOptions::default(),
            partition_threads: DEFAULT_PARTITION_THREADS,
            split_cap: DEFAULT_SPLIT_CAP,
            min_partition_bytes: 0,
            write_debug_grids: false,
        }
    }
}

/// Outcome of a full run.
#[derive(Debug, Clone)]
pub struct PipelineSummary {
    /// Ingest statistics
    pub ingest: IngestSummary,
    /// Partitioning outcome
    pub partition: PartitionReport,
    /// Mesh build outcome
    pub meshes: MeshBuildReport,
    /// Wall-clock time for all phases
    pub elapsed_seconds: f64,
}

/// Runs ingest, partitioning and mesh building in order against one cache.
///
/// Each phase finishes completely before the next starts.
pub struct Pipeline {
    cache: CacheLayout,
    options: PipelineOptions,
    progress: ProgressTracker,
}

impl Pipeline {
    /// Pipeline over `cache` with default options.
    pub fn new(cache: CacheLayout) -> Self {
        Self::with_options(cache, PipelineOptions::default())
    }

    /// Pipeline over `cache` with custom options.
    pub fn with_options(cache: CacheLayout, options: PipelineOptions) -> Self {
        Self {
            cache,
            options,
            progress: ProgressTracker::new(),
        }
    }

    /// Shared progress map, updated by every phase
    pub fn progress(&self) -> &ProgressTracker {
        &self.progress
    }

    /// Mesh settings for `request` under this pipeline's options.
    pub fn mesh_config(&self, request: &BuildRequest) -> MeshBuildConfig {
        let [x, y, z] = &request.axes;
        MeshBuildConfig::new(request.attribute.as_str())
            .with_axes(x, y, z)
            .with_resolution(request.resolution)
            .with_threads(request.threads)
            .with_iso_level(request.iso_level)
            .with_split_cap(self.options.split_cap)
            .with_min_partition_bytes(self.options.min_partition_bytes)
            .with_debug_grids(self.options.write_debug_grids)
    }

    /// Run every phase for `request`.
    pub fn run(&self, request: &BuildRequest) -> Result<PipelineSummary, PipelineError> {
        request.validate()?;
        let mesh_config = self.mesh_config(request);
        mesh_config.validate()?;
        let start = Instant::now();

        let store = ColumnStore::with_options(self.cache.clone(), self.options.ingest.clone())
            .with_progress(self.progress.clone());

        // Column names come from the header alone, so a typo fails before
        // the existing cache entry is replaced.
        let schema = store.read_schema(&request.source)?;
        for column in std::iter::once(&request.attribute)
            .chain(request.axes.iter())
            .chain(request.split_columns.iter())
        {
            if !schema.contains(column) {
                return Err(PipelineError::InvalidConfig(format!(
                    "column {column} is not in {} (columns: {})",
                    request.source.display(),
                    schema.columns().join(", ")
                )));
            }
        }

        let ingest = store.ingest(&request.source)?;
        let dataset = self.cache.dataset(&ingest.dataset);

        let partitioner =
            RangePartitioner::new(dataset.clone()).with_progress(self.progress.clone());
        let columns = if request.split_columns.is_empty() {
            partitioner.all_columns()?
        } else {
            request.split_columns.clone()
        };
        let partition = partitioner.split_columns(
            &columns,
            request.divisions,
            self.options.partition_threads,
        )?;

        let meshes = MeshBuildOrchestrator::new(dataset, mesh_config)
            .with_progress(self.progress.clone())
            .build()?;

        let elapsed_seconds = start.elapsed().as_secs_f64();
        info!(
            "Pipeline finished: {} rows, {} partition files, {} meshes in {:.2}s",
            ingest.row_count,
            partition.files_written(),
            meshes.meshes.len(),
            elapsed_seconds
        );

        Ok(PipelineSummary {
            ingest,
            partition,
            meshes,
            elapsed_seconds,
        })
    }
}
