//! Concurrent mesh building over the partition files of one attribute.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crossbeam_channel::unbounded;
use log::{debug, info, warn};

use crate::format::{has_extension, FIELD_EXTENSION, MESH_EXTENSION, VOXEL_LIST_EXTENSION};
use crate::mesh::{CuberilleExtractor, IsosurfaceExtractor, MeshError, DEFAULT_SPLIT_CAP};
use crate::progress::{ProgressTracker, PHASE_MESHING};
use crate::store::DatasetLayout;
use crate::voxel::{write_voxels, BoundingBox};
use crate::work_stack::{catch_panic, drain_with_pool, WorkStack};

use super::assembler::PointCloudAssembler;
use super::error::PipelineError;

/// Number of worker threads when none is configured.
pub fn default_threads() -> usize {
    std::thread::available_parallelism()
        .map(|p| p.get())
        .unwrap_or(4)
}

/// Settings for one mesh build.
#[derive(Debug, Clone)]
pub struct MeshBuildConfig {
    /// Attribute whose partitions are meshed
    pub attribute: String,
    /// Axis columns (x, y, z)
    pub axes: [String; 3],
    /// Approximate number of voxel bins per partition
    pub resolution: usize,
    /// Worker threads
    pub threads: usize,
    /// Iso-level in the normalized `[0, 1]` density field
    pub iso_level: f32,
    /// Vertex cap per written mesh
    pub split_cap: usize,
    /// Partition files smaller than this are skipped
    pub min_partition_bytes: u64,
    /// Also write each partition's `.fara` grid and `.vox` list
    pub write_debug_grids: bool,
}

impl MeshBuildConfig {
    /// Mesh `attribute` with default settings and axes `X`, `Y`, `Z`.
    pub fn new(attribute: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
            axes: ["X".to_string(), "Y".to_string(), "Z".to_string()],
            resolution: 100_000,
            threads: default_threads(),
            iso_level: 0.0,
            split_cap: DEFAULT_SPLIT_CAP,
            min_partition_bytes: 0,
            write_debug_grids: false,
        }
    }

    /// Set the axis columns.
    pub fn with_axes(mut self, x: &str, y: &str, z: &str) -> Self {
        self.axes = [x.to_string(), y.to_string(), z.to_string()];
        self
    }

    /// Set the voxel resolution.
    pub fn with_resolution(mut self, resolution: usize) -> Self {
        self.resolution = resolution;
        self
    }

    /// Set the worker thread count.
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    /// Set the iso-level.
    pub fn with_iso_level(mut self, iso_level: f32) -> Self {
        self.iso_level = iso_level;
        self
    }

    /// Set the vertex cap per mesh file.
    pub fn with_split_cap(mut self, split_cap: usize) -> Self {
        self.split_cap = split_cap;
        self
    }

    /// Skip partition files below `bytes`.
    pub fn with_min_partition_bytes(mut self, bytes: u64) -> Self {
        self.min_partition_bytes = bytes;
        self
    }

    /// Write debug grids next to the meshes.
    pub fn with_debug_grids(mut self, enabled: bool) -> Self {
        self.write_debug_grids = enabled;
        self
    }

    /// Reject settings that cannot produce meshes.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.resolution == 0 {
            return Err(PipelineError::InvalidConfig(
                "resolution must be at least 1".to_string(),
            ));
        }
        if self.threads == 0 {
            return Err(PipelineError::InvalidConfig(
                "thread count must be at least 1".to_string(),
            ));
        }
        if !self.iso_level.is_finite() || self.iso_level < 0.0 {
            return Err(PipelineError::InvalidConfig(format!(
                "iso-level must be a non-negative number, got {}",
                self.iso_level
            )));
        }
        if self.split_cap < 3 {
            return Err(PipelineError::InvalidConfig(format!(
                "split cap must be at least 3, got {}",
                self.split_cap
            )));
        }
        Ok(())
    }
}

/// One mesh file written.
#[derive(Debug, Clone)]
pub struct MeshFile {
    /// Path of the `.imf` file
    pub path: PathBuf,
    /// Vertices after welding
    pub vertices: usize,
    /// Triangles
    pub triangles: usize,
}

/// A partition file whose mesh could not be built.
#[derive(Debug, Clone)]
pub struct MeshFailure {
    /// Partition file
    pub partition: PathBuf,
    /// Error description
    pub message: String,
}

/// Outcome of a mesh build.
#[derive(Debug, Clone, Default)]
pub struct MeshBuildReport {
    /// Attribute that was meshed
    pub attribute: String,
    /// Output directory
    pub output_dir: PathBuf,
    /// Mesh files written, sorted by path
    pub meshes: Vec<MeshFile>,
    /// Partition files that failed, sorted by path
    pub failures: Vec<MeshFailure>,
    /// Partition files skipped for size
    pub skipped: Vec<PathBuf>,
    /// Wall-clock time for the build
    pub elapsed_seconds: f64,
}

impl MeshBuildReport {
    /// Whether every partition produced a mesh.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Drives point-cloud assembly, binning, extraction and mesh writing for
/// every partition file of one attribute on a fixed worker pool.
pub struct MeshBuildOrchestrator {
    dataset: DatasetLayout,
    config: MeshBuildConfig,
    extractor: Arc<dyn IsosurfaceExtractor>,
    progress: ProgressTracker,
}

impl MeshBuildOrchestrator {
    /// Build meshes for `dataset` with the built-in extractor.
    pub fn new(dataset: DatasetLayout, config: MeshBuildConfig) -> Self {
        Self {
            dataset,
            config,
            extractor: Arc::new(CuberilleExtractor),
            progress: ProgressTracker::new(),
        }
    }

    /// Use a different isosurface extractor.
    pub fn with_extractor<E: IsosurfaceExtractor + 'static>(mut self, extractor: E) -> Self {
        self.extractor = Arc::new(extractor);
        self
    }

    /// Report progress into `progress`.
    pub fn with_progress(mut self, progress: ProgressTracker) -> Self {
        self.progress = progress;
        self
    }

    /// Build settings
    pub fn config(&self) -> &MeshBuildConfig {
        &self.config
    }

    /// Mesh every partition file of the attribute.
    ///
    /// Returns once all workers have drained the stack. A partition that
    /// fails (or panics) is logged and listed in the report; it does not
    /// fail the call.
    pub fn build(&self) -> Result<MeshBuildReport, PipelineError> {
        self.config.validate()?;
        self.dataset.require()?;
        let start = Instant::now();
        let attribute = self.config.attribute.as_str();

        let partitions = self.dataset.partition_files(attribute)?;
        if partitions.is_empty() {
            return Err(PipelineError::NotPartitioned {
                column: attribute.to_string(),
                dir: self.dataset.column_dir(attribute),
            });
        }

        let mut report = MeshBuildReport {
            attribute: attribute.to_string(),
            ..Default::default()
        };
        let mut work = Vec::with_capacity(partitions.len());
        for partition in partitions {
            if fs::metadata(&partition)?.len() < self.config.min_partition_bytes {
                debug!("Skipping small partition {}", partition.display());
                report.skipped.push(partition);
            } else {
                work.push(partition);
            }
        }

        let [x, y, z] = &self.config.axes;
        let bbox = BoundingBox::from_columns(&self.dataset, [x.as_str(), y.as_str(), z.as_str()])?;
        let output_dir = self.dataset.mesh_dir(attribute, self.config.resolution);
        prepare_output_dir(&output_dir)?;
        report.output_dir = output_dir.clone();

        let total = work.len();
        info!(
            "Building meshes for {} partitions of {} on {} threads",
            total, attribute, self.config.threads
        );
        self.progress.update(PHASE_MESHING, 0.0);

        let stack = WorkStack::new(work);
        let finished = AtomicUsize::new(0);
        let (tx, rx) = unbounded();

        drain_with_pool(self.config.threads, &stack, |partition: PathBuf| {
            let outcome = catch_panic(|| self.build_one(&partition, bbox, &output_dir))
                .and_then(|result| result.map_err(|e| e.to_string()));
            let done = finished.fetch_add(1, Ordering::Relaxed) + 1;
            self.progress.update_fraction(PHASE_MESHING, done, total);
            let _ = tx.send((partition, outcome));
        })?;
        drop(tx);

        for (partition, outcome) in rx.try_iter() {
            match outcome {
                Ok(files) => report.meshes.extend(files),
                Err(message) => {
                    warn!("Failed to mesh {}: {}", partition.display(), message);
                    report.failures.push(MeshFailure { partition, message });
                }
            }
        }
        report.meshes.sort_by(|a, b| a.path.cmp(&b.path));
        report.failures.sort_by(|a, b| a.partition.cmp(&b.partition));
        report.elapsed_seconds = start.elapsed().as_secs_f64();

        info!(
            "Wrote {} meshes to {} ({} failed, {} skipped) in {:.2}s",
            report.meshes.len(),
            output_dir.display(),
            report.failures.len(),
            report.skipped.len(),
            report.elapsed_seconds
        );
        Ok(report)
    }

    fn build_one(
        &self,
        partition: &Path,
        bbox: BoundingBox,
        output_dir: &Path,
    ) -> Result<Vec<MeshFile>, PipelineError> {
        let stem = partition
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| {
                PipelineError::InvalidConfig(format!(
                    "partition file {} has no usable name",
                    partition.display()
                ))
            })?;

        let [x, y, z] = &self.config.axes;
        let mut assembler =
            PointCloudAssembler::open(&self.dataset, [x.as_str(), y.as_str(), z.as_str()])?;
        let grid = assembler.voxelize(partition, self.config.resolution, bbox)?;
        debug!(
            "{}: {} points in {} bins, ~{} bytes",
            stem,
            grid.len(),
            grid.occupied_bins(),
            grid.approx_bytes()
        );

        let field = grid.to_float_array();
        if self.config.write_debug_grids {
            field.write(&output_dir.join(format!("{stem}.{FIELD_EXTENSION}")))?;
            write_voxels(
                &output_dir.join(format!("{stem}.{VOXEL_LIST_EXTENSION}")),
                &grid.to_voxels(),
            )?;
        }
        drop(grid);

        let soup = self.extractor.extract(&field, self.config.iso_level)?;
        if soup.is_empty() {
            return Err(MeshError::EmptyMesh.into());
        }

        // Split the raw soup, then weld each piece on its own.
        let pieces = soup.divide_into_small(self.config.split_cap)?;
        let split = pieces.len() > 1;
        let mut files = Vec::with_capacity(pieces.len());
        for (n, mut piece) in pieces.into_iter().enumerate() {
            piece.make_unique();
            let name = if split {
                format!("{stem}_{n}.{MESH_EXTENSION}")
            } else {
                format!("{stem}.{MESH_EXTENSION}")
            };
            let path = output_dir.join(name);
            piece.write(&path)?;
            debug!(
                "Wrote {} ({} vertices, {} triangles)",
                path.display(),
                piece.vertex_count(),
                piece.triangle_count()
            );
            files.push(MeshFile {
                path,
                vertices: piece.vertex_count(),
                triangles: piece.triangle_count(),
            });
        }
        Ok(files)
    }
}

/// Create the output directory and clear meshes from an earlier build.
fn prepare_output_dir(dir: &Path) -> Result<(), PipelineError> {
    fs::create_dir_all(dir)?;
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let stale = [MESH_EXTENSION, FIELD_EXTENSION, VOXEL_LIST_EXTENSION]
            .iter()
            .any(|&ext| has_extension(&path, ext));
        if path.is_file() && stale {
            fs::remove_file(&path)?;
        }
    }
    Ok(())
}
