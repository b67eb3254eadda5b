//! # isomesh - Iso-surface meshes from large point datasets
//!
//! `isomesh` turns flat scientific datasets (rows are numbered cells, columns
//! are named scalar attributes including three coordinate columns) into
//! triangulated iso-surfaces, one per value range of a chosen attribute.
//! Datasets may be far larger than memory, and meshes are split to stay under
//! renderer vertex limits.
//!
//! ## Key Features
//!
//! - **Disk-backed columns**: A delimited source is streamed once into one
//!   little-endian `f32` file per column plus a min/max index.
//!
//! - **Value-range partitions**: An attribute is split into `N` equal-width
//!   value buckets, each a file of `(cell id, value)` records sorted by value.
//!
//! - **Adaptive voxel grids**: A partition's point cloud is binned into a
//!   sparse grid whose step counts follow the bounding box's aspect ratio, then
//!   normalized into a `[0, 1]` density field.
//!
//! - **Pluggable extraction**: Any [`mesh::IsosurfaceExtractor`] can turn the
//!   density field into triangles; a face-based extractor ships built in.
//!
//! - **Size-bounded meshes**: Oversized meshes are cut into pieces below a
//!   vertex cap and each piece is welded by exact vertex value.
//!
//! - **Concurrent phases**: Columns are partitioned and partitions are meshed
//!   on fixed worker pools draining a shared stack; one failing file never
//!   stops the batch.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use isomesh::partition::RangePartitioner;
//! use isomesh::pipeline::{MeshBuildConfig, MeshBuildOrchestrator};
//! use isomesh::store::{CacheLayout, ColumnStore};
//!
//! let cache = CacheLayout::new("cache");
//! let ingest = ColumnStore::new(cache.clone()).ingest("cells.csv")?;
//! let dataset = cache.dataset(&ingest.dataset);
//!
//! RangePartitioner::new(dataset.clone()).split_column("Temperature", 10)?;
//!
//! let config = MeshBuildConfig::new("Temperature")
//!     .with_resolution(100_000)
//!     .with_iso_level(0.1);
//! let report = MeshBuildOrchestrator::new(dataset, config).build()?;
//! println!("Wrote {} meshes", report.meshes.len());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! This creates a cache directory:
//! ```text
//! cache/cells/
//! ├── manifest.json
//! ├── fields/<column>/{full.bnf, minmax.bin, <lo>_<hi>.divf}
//! └── meshes/<attribute>/<resolution>/<lo>_<hi>[_<n>].imf
//! ```
//!
//! ## Modules
//!
//! - [`store`]: source ingest, cache layout and manifest
//! - [`query`]: random-access row reads over column files
//! - [`partition`]: value-range partitioning
//! - [`voxel`]: bounding boxes, voxel grids and density fields
//! - [`mesh`]: intermediate meshes and the extractor seam
//! - [`pipeline`]: point-cloud assembly, mesh orchestration and the phase driver

#![deny(missing_docs)]
#![deny(rustdoc::missing_crate_level_docs)]

pub mod format;
pub mod mesh;
pub mod partition;
pub mod pipeline;
pub mod point;
pub mod progress;
pub mod query;
pub mod store;
pub mod voxel;
pub mod work_stack;

/// Zero-based row index into the source dataset; the join key across every
/// file the crate writes.
pub type CellId = u32;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::mesh::{CuberilleExtractor, IntermediateMesh, IsosurfaceExtractor, MeshError};
    pub use crate::partition::{FieldCell, PartitionError, PartitionReport, RangePartitioner};
    pub use crate::pipeline::{
        BuildRequest, MeshBuildConfig, MeshBuildOrchestrator, MeshBuildReport, Pipeline,
        PipelineError, PipelineOptions, PointCloudAssembler,
    };
    pub use crate::point::Point;
    pub use crate::progress::ProgressTracker;
    pub use crate::query::{ColumnarReader, FullCell, QueryError};
    pub use crate::store::{
        CacheLayout, ColumnStore, DatasetLayout, DatasetManifest, IngestOptions, StoreError,
    };
    pub use crate::voxel::{BoundingBox, ScalarField, VoxelArray, VoxelError};
    pub use crate::CellId;
}
