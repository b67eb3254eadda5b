//! Occupied bins as a list, and the `.vox` file format.

use std::fs::File;
use std::io::{self, BufReader, Read, Write};
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::format::{check_extension, from_i32, to_i32, write_atomic, VOXEL_LIST_EXTENSION};
use crate::point::Point;
use crate::CellId;

use super::error::VoxelError;

/// One occupied bin: its grid index and the cells hashed into it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Voxel {
    /// Grid index `(i, j, k)`
    pub index: [usize; 3],
    /// Cell ids in insertion order
    pub cells: Vec<CellId>,
}

impl Voxel {
    /// Write one voxel: index as a point, `int32` count, `int32` ids.
    pub fn write_to<W: Write + ?Sized>(&self, writer: &mut W) -> io::Result<()> {
        let [i, j, k] = self.index;
        Point::new(i as f32, j as f32, k as f32).write_to(writer)?;
        writer.write_i32::<LittleEndian>(to_i32(self.cells.len(), "cell count")?)?;
        for &cell in &self.cells {
            writer.write_i32::<LittleEndian>(to_i32(cell as usize, "cell id")?)?;
        }
        Ok(())
    }

    /// Read one voxel.
    pub fn read_from<R: Read + ?Sized>(reader: &mut R) -> io::Result<Self> {
        let coord = Point::read_from(reader)?;
        let index = [
            grid_index(coord.x)?,
            grid_index(coord.y)?,
            grid_index(coord.z)?,
        ];
        let count = from_i32(reader.read_i32::<LittleEndian>()?, "cell count")?;
        let mut cells = Vec::with_capacity(count.min(1 << 20));
        for _ in 0..count {
            cells.push(from_i32(reader.read_i32::<LittleEndian>()?, "cell id")? as CellId);
        }
        Ok(Self { index, cells })
    }
}

fn grid_index(value: f32) -> io::Result<usize> {
    if value >= 0.0 && value.fract() == 0.0 && value <= u32::MAX as f32 {
        Ok(value as usize)
    } else {
        Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("{value} is not a grid index"),
        ))
    }
}

/// Write `voxels` as a `.vox` file.
pub fn write_voxels(path: &Path, voxels: &[Voxel]) -> Result<(), VoxelError> {
    check_extension(path, VOXEL_LIST_EXTENSION)?;
    write_atomic(path, |w| {
        for voxel in voxels {
            voxel.write_to(w)?;
        }
        Ok(())
    })?;
    Ok(())
}

/// Read every voxel of a `.vox` file.
pub fn read_voxels(path: &Path) -> Result<Vec<Voxel>, VoxelError> {
    check_extension(path, VOXEL_LIST_EXTENSION)?;
    let file = File::open(path)?;
    let len = file.metadata()?.len();
    let mut reader = BufReader::new(file);
    let mut voxels = Vec::new();
    let mut consumed = 0u64;
    while consumed < len {
        let voxel = Voxel::read_from(&mut reader)?;
        consumed += 16 + 4 * voxel.cells.len() as u64;
        voxels.push(voxel);
    }
    Ok(voxels)
}
