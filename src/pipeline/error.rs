use std::path::PathBuf;

use crate::mesh::MeshError;
use crate::partition::PartitionError;
use crate::query::QueryError;
use crate::store::StoreError;
use crate::voxel::VoxelError;

/// Fewest points a partition needs before it is meshed.
pub const MIN_CLOUD_POINTS: usize = 3;

/// Errors that can occur while driving the ingest, partition and mesh phases
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Column store error
    #[error("Store error: {0}")]
    StoreError(#[from] StoreError),

    /// Row query error
    #[error("Query error: {0}")]
    QueryError(#[from] QueryError),

    /// Partitioning error
    #[error("Partition error: {0}")]
    PartitionError(#[from] PartitionError),

    /// Voxel binning error
    #[error("Voxel error: {0}")]
    VoxelError(#[from] VoxelError),

    /// Mesh building error
    #[error("Mesh error: {0}")]
    MeshError(#[from] MeshError),

    /// The worker pool could not be started
    #[error("Thread pool error: {0}")]
    ThreadPoolError(#[from] rayon::ThreadPoolBuildError),

    /// Invalid build parameters, rejected before any work
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The source file does not exist
    #[error("Source file not found: {}", .0.display())]
    SourceNotFound(PathBuf),

    /// The attribute has no partition files to mesh
    #[error("Column {column} has not been partitioned (no .divf files in {})", dir.display())]
    NotPartitioned {
        /// Attribute column
        column: String,
        /// Column directory searched
        dir: PathBuf,
    },

    /// A partition's point cloud is too small to mesh
    #[error("Partition {} has {points} points, at least {} are needed", partition.display(), MIN_CLOUD_POINTS)]
    TooFewPoints {
        /// Partition file
        partition: PathBuf,
        /// Points found in it
        points: usize,
    },
}
