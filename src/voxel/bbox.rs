//! Axis-aligned bounding box of a point cloud.

use serde::{Deserialize, Serialize};

use crate::point::Point;
use crate::store::{load_range, DatasetLayout, MinMax};

use super::error::VoxelError;

/// Axis-aligned bounds, inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Lower corner
    pub min: Point,
    /// Upper corner
    pub max: Point,
}

impl BoundingBox {
    /// Create a box, rejecting non-finite bounds and inverted axes.
    pub fn new(min: Point, max: Point) -> Result<Self, VoxelError> {
        let lo = [min.x, min.y, min.z];
        let hi = [max.x, max.y, max.z];
        for axis in 0..3 {
            if !lo[axis].is_finite() || !hi[axis].is_finite() {
                return Err(VoxelError::InvalidBoundingBox(format!(
                    "axis {axis} has a non-finite bound"
                )));
            }
            if lo[axis] > hi[axis] {
                return Err(VoxelError::InvalidBoundingBox(format!(
                    "axis {axis} has min {} > max {}",
                    lo[axis], hi[axis]
                )));
            }
        }
        Ok(Self { min, max })
    }

    /// Box from `[xmin, xmax, ymin, ymax, zmin, zmax]`.
    pub fn from_array(bounds: [f32; 6]) -> Result<Self, VoxelError> {
        Self::new(
            Point::new(bounds[0], bounds[2], bounds[4]),
            Point::new(bounds[1], bounds[3], bounds[5]),
        )
    }

    /// Box from per-axis column ranges.
    pub fn from_ranges(ranges: [MinMax; 3]) -> Result<Self, VoxelError> {
        let [x, y, z] = ranges;
        Self::from_array([x.min, x.max, y.min, y.max, z.min, z.max])
    }

    /// Box from the min/max files of three axis columns.
    pub fn from_columns(dataset: &DatasetLayout, axes: [&str; 3]) -> Result<Self, VoxelError> {
        Self::from_ranges([
            load_range(dataset, axes[0])?,
            load_range(dataset, axes[1])?,
            load_range(dataset, axes[2])?,
        ])
    }

    /// `[xmin, xmax, ymin, ymax, zmin, zmax]`
    pub fn to_array(&self) -> [f32; 6] {
        [
            self.min.x, self.max.x, self.min.y, self.max.y, self.min.z, self.max.z,
        ]
    }

    /// Per-axis `max - min`
    pub fn lengths(&self) -> [f32; 3] {
        [
            self.max.x - self.min.x,
            self.max.y - self.min.y,
            self.max.z - self.min.z,
        ]
    }

    /// Whether `point` lies inside (NaN never does).
    pub fn contains(&self, point: &Point) -> bool {
        (self.min.x..=self.max.x).contains(&point.x)
            && (self.min.y..=self.max.y).contains(&point.y)
            && (self.min.z..=self.max.z).contains(&point.z)
    }
}
