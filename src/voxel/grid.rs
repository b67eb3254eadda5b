//! Adaptive sparse voxel grid.

use std::collections::HashMap;
use std::mem::size_of;

use crate::point::Point;
use crate::CellId;

use super::bbox::BoundingBox;
use super::error::VoxelError;
use super::field::ScalarField;
use super::list::Voxel;

/// Step length used when every axis of the bounding box is degenerate.
pub const DEGENERATE_STEP_LENGTH: f32 = 1e-7;

/// Sparse 3-D grid of cell-id lists sized to roughly `desired_points` bins.
///
/// The per-axis step counts follow the bounding box's aspect ratio so that
/// their product approximates `desired_points`. Bins are square with edge
/// [`step_length`](Self::step_length) and allocated on first insert.
#[derive(Debug, Clone)]
pub struct VoxelArray {
    bbox: BoundingBox,
    desired_points: usize,
    steps: [usize; 3],
    dims: [usize; 3],
    step_length: f32,
    bins: HashMap<[usize; 3], Vec<CellId>>,
    inserted: usize,
}

impl VoxelArray {
    /// Size a grid for `desired_points` bins over `bbox`.
    pub fn new(desired_points: usize, bbox: BoundingBox) -> Result<Self, VoxelError> {
        if desired_points == 0 {
            return Err(VoxelError::ZeroDesiredPoints);
        }
        let lengths = bbox.lengths();
        let steps = axis_steps(desired_points, lengths);
        let step_length = (0..3)
            .find(|&axis| steps[axis] > 0)
            .map(|axis| lengths[axis] / steps[axis] as f32)
            .filter(|&step| step > 0.0 && step.is_finite())
            .unwrap_or(DEGENERATE_STEP_LENGTH);

        Ok(Self {
            bbox,
            desired_points,
            steps,
            dims: [steps[0] + 1, steps[1] + 1, steps[2] + 1],
            step_length,
            bins: HashMap::new(),
            inserted: 0,
        })
    }

    /// Bounding box the grid covers
    pub fn bbox(&self) -> &BoundingBox {
        &self.bbox
    }

    /// Requested bin count
    pub fn desired_points(&self) -> usize {
        self.desired_points
    }

    /// Per-axis step counts
    pub fn steps(&self) -> [usize; 3] {
        self.steps
    }

    /// Per-axis bin counts (`steps + 1`)
    pub fn dims(&self) -> [usize; 3] {
        self.dims
    }

    /// Edge length of one bin
    pub fn step_length(&self) -> f32 {
        self.step_length
    }

    /// Number of points inserted
    pub fn len(&self) -> usize {
        self.inserted
    }

    /// Whether no point has been inserted
    pub fn is_empty(&self) -> bool {
        self.inserted == 0
    }

    /// Number of non-empty bins
    pub fn occupied_bins(&self) -> usize {
        self.bins.len()
    }

    /// Bin index of `point`, or `None` when it lies outside the box.
    pub fn bin_of(&self, point: &Point) -> Option<[usize; 3]> {
        if !self.bbox.contains(point) {
            return None;
        }
        let offsets = [
            point.x - self.bbox.min.x,
            point.y - self.bbox.min.y,
            point.z - self.bbox.min.z,
        ];
        let mut index = [0usize; 3];
        for axis in 0..3 {
            let bin = (offsets[axis] / self.step_length).floor() as usize;
            index[axis] = bin.min(self.dims[axis] - 1);
        }
        Some(index)
    }

    /// Hash `cell_id` at `point` into its bin.
    pub fn insert_point(&mut self, cell_id: CellId, point: Point) -> Result<(), VoxelError> {
        let index = self
            .bin_of(&point)
            .ok_or(VoxelError::PointOutOfBounds { cell_id, point })?;
        self.bins.entry(index).or_default().push(cell_id);
        self.inserted += 1;
        Ok(())
    }

    /// Cells in bin `(i, j, k)`.
    pub fn cells(&self, index: [usize; 3]) -> &[CellId] {
        self.bins.get(&index).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of cells in bin `(i, j, k)`.
    pub fn occupancy(&self, index: [usize; 3]) -> usize {
        self.cells(index).len()
    }

    /// Largest bin occupancy (0 for an empty grid).
    pub fn max_occupancy(&self) -> usize {
        self.bins.values().map(Vec::len).max().unwrap_or(0)
    }

    /// Dense density field: each bin's occupancy divided by the maximum.
    pub fn to_float_array(&self) -> ScalarField {
        let mut field = ScalarField::zeros(self.dims);
        let max = self.max_occupancy();
        if max == 0 {
            return field;
        }
        for (&index, cells) in &self.bins {
            field.set(index, cells.len() as f32 / max as f32);
        }
        field
    }

    /// Non-empty bins in `(i, j, k)` order.
    pub fn to_voxels(&self) -> Vec<Voxel> {
        let mut voxels: Vec<Voxel> = self
            .bins
            .iter()
            .map(|(&index, cells)| Voxel {
                index,
                cells: cells.clone(),
            })
            .collect();
        voxels.sort_by_key(|voxel| voxel.index);
        voxels
    }

    /// Rough heap footprint of the id lists.
    pub fn approx_bytes(&self) -> usize {
        let ids: usize = self.bins.values().map(Vec::capacity).sum();
        ids * size_of::<CellId>()
            + self.bins.len() * (size_of::<[usize; 3]>() + size_of::<Vec<CellId>>())
            + size_of::<Self>()
    }
}

/// Per-axis step counts for `desired` bins over a box with `lengths`.
///
/// Zero-length axes get zero steps and drop out of the aspect-ratio solve,
/// so the product over the remaining axes still approximates `desired`.
/// An axis whose solved count falls below one step is pinned at one step and
/// the solve is repeated over the axes left, which keeps thin boxes from
/// inflating the grid.
fn axis_steps(desired: usize, lengths: [f32; 3]) -> [usize; 3] {
    let mut live: Vec<usize> = (0..3).filter(|&axis| lengths[axis] > 0.0).collect();
    if live.is_empty() {
        return [0; 3];
    }

    let desired = desired as f64;
    let root = desired.cbrt();
    let coord = if root.round().powi(3) == desired {
        root.round()
    } else {
        root.ceil()
    };
    let min_length = live
        .iter()
        .map(|&axis| f64::from(lengths[axis]))
        .fold(f64::INFINITY, f64::min);
    let factor = |axis: usize| f64::from(lengths[axis]) / min_length;

    let mut steps = [0usize; 3];
    while !live.is_empty() {
        // Solve prod(coord / adjust * factor) == desired for adjust.
        let n = live.len() as f64;
        let product: f64 = live.iter().map(|&axis| coord * factor(axis)).product();
        let adjust = (product / desired).powf(1.0 / n);
        let raw: Vec<(usize, f64)> = live
            .iter()
            .map(|&axis| (axis, coord / adjust * factor(axis)))
            .collect();

        let thin: Vec<usize> = raw
            .iter()
            .filter(|&&(_, r)| r < 1.0)
            .map(|&(axis, _)| axis)
            .collect();
        if thin.is_empty() {
            for (axis, r) in raw {
                steps[axis] = ((r + 1e-9).floor() as usize).max(1);
            }
            break;
        }
        for axis in thin {
            steps[axis] = 1;
            live.retain(|&a| a != axis);
        }
    }
    steps
}
