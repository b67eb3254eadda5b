//! Joins partition records against the axis columns.

use std::path::Path;

use serde::Serialize;

use crate::partition::{read_partition, FieldCell};
use crate::point::Point;
use crate::query::ColumnarReader;
use crate::store::DatasetLayout;
use crate::voxel::{BoundingBox, VoxelArray};
use crate::CellId;

use super::error::{PipelineError, MIN_CLOUD_POINTS};

/// A cell's attribute value and its position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AttCoordCell {
    /// Cell id (row index)
    pub cell_id: CellId,
    /// Attribute value
    pub value: f32,
    /// Position from the three axis columns
    pub point: Point,
}

/// Builds point clouds for partition files of one dataset.
///
/// Holds skip-read cursors over the three axis columns; each call sweeps them
/// once in ascending cell order.
pub struct PointCloudAssembler {
    axes: ColumnarReader,
}

impl PointCloudAssembler {
    /// Open the axis columns `axes` (x, y, z) of `dataset`.
    pub fn open(dataset: &DatasetLayout, axes: [&str; 3]) -> Result<Self, PipelineError> {
        Ok(Self {
            axes: ColumnarReader::open(dataset, &axes)?,
        })
    }

    /// Attach coordinates to `records`.
    ///
    /// The result is in ascending cell order; a cell id listed twice is kept
    /// once.
    pub fn assemble(&mut self, records: &[FieldCell]) -> Result<Vec<AttCoordCell>, PipelineError> {
        let mut records = records.to_vec();
        records.sort_by_key(|record| record.cell_id);
        records.dedup_by_key(|record| record.cell_id);

        let ids: Vec<CellId> = records.iter().map(|record| record.cell_id).collect();
        let mut cells = Vec::with_capacity(records.len());
        let mut pending = records.iter();
        self.axes.for_each_row(&ids, |cell_id, xyz| {
            if let Some(record) = pending.next() {
                debug_assert_eq!(record.cell_id, cell_id);
                cells.push(AttCoordCell {
                    cell_id,
                    value: record.value,
                    point: Point::new(xyz[0], xyz[1], xyz[2]),
                });
            }
        })?;
        Ok(cells)
    }

    /// Read a partition file and attach coordinates to every record.
    pub fn assemble_file(&mut self, partition: &Path) -> Result<Vec<AttCoordCell>, PipelineError> {
        let records = read_partition(partition)?;
        self.assemble(&records)
    }

    /// Bin the point cloud of `partition` into a grid of about `resolution`
    /// bins over `bbox`.
    ///
    /// Fails with [`PipelineError::TooFewPoints`] when the partition holds
    /// fewer than [`MIN_CLOUD_POINTS`] distinct cells.
    pub fn voxelize(
        &mut self,
        partition: &Path,
        resolution: usize,
        bbox: BoundingBox,
    ) -> Result<VoxelArray, PipelineError> {
        let cells = self.assemble_file(partition)?;
        if cells.len() < MIN_CLOUD_POINTS {
            return Err(PipelineError::TooFewPoints {
                partition: partition.to_path_buf(),
                points: cells.len(),
            });
        }
        let mut grid = VoxelArray::new(resolution, bbox)?;
        for cell in &cells {
            grid.insert_point(cell.cell_id, cell.point)?;
        }
        Ok(grid)
    }
}
