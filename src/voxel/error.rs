use crate::format::ExtensionError;
use crate::point::Point;
use crate::store::StoreError;
use crate::CellId;

/// Errors that can occur while binning points or handling grid files
#[derive(Debug, thiserror::Error)]
pub enum VoxelError {
    /// I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error loading axis ranges from the column store
    #[error("Store error: {0}")]
    StoreError(#[from] StoreError),

    /// A grid file has the wrong extension
    #[error(transparent)]
    FormatError(#[from] ExtensionError),

    /// The desired point count was zero
    #[error("Desired point count must be at least 1")]
    ZeroDesiredPoints,

    /// Bounding box with a non-finite bound or `min > max`
    #[error("Invalid bounding box: {0}")]
    InvalidBoundingBox(String),

    /// A point lies outside the grid's bounding box
    #[error("Cell {cell_id} at ({}, {}, {}) is outside the bounding box", point.x, point.y, point.z)]
    PointOutOfBounds {
        /// Cell id of the point
        cell_id: CellId,
        /// Offending coordinates
        point: Point,
    },

    /// A dense grid's value count does not match its dimensions
    #[error("Grid of {dims:?} needs {expected} values, got {actual}")]
    DimensionMismatch {
        /// Grid dimensions
        dims: [usize; 3],
        /// Required number of values
        expected: usize,
        /// Number of values supplied
        actual: usize,
    },
}
