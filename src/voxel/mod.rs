//! # Spatial Voxel Binning
//!
//! Hashes a point cloud into an adaptively sized sparse grid and turns bin
//! occupancy into a normalized density field.
//!
//! The grid holds roughly `desired_points` bins, with per-axis step counts in
//! proportion to the bounding box's aspect ratio. Every bin is a cube of
//! edge [`VoxelArray::step_length`]. The density field is what the
//! isosurface extractor consumes together with an iso-level.
//!
//! ```rust
//! use isomesh::point::Point;
//! use isomesh::voxel::{BoundingBox, VoxelArray};
//!
//! let bbox = BoundingBox::from_array([0.0, 10.0, 0.0, 10.0, 0.0, 10.0])?;
//! let mut grid = VoxelArray::new(1000, bbox)?;
//! grid.insert_point(0, Point::new(1.5, 2.5, 3.5))?;
//! let field = grid.to_float_array();
//! assert_eq!(field.get(1, 2, 3), Some(1.0));
//! # Ok::<(), isomesh::voxel::VoxelError>(())
//! ```

mod bbox;
mod error;
mod field;
mod grid;
mod list;

#[cfg(test)]
mod tests;

pub use bbox::BoundingBox;
pub use error::VoxelError;
pub use field::ScalarField;
pub use grid::{VoxelArray, DEGENERATE_STEP_LENGTH};
pub use list::{read_voxels, write_voxels, Voxel};
