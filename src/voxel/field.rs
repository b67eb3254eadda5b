//! Dense scalar grid handed to the isosurface extractor.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::format::{check_extension, from_i32, to_i32, write_atomic, FIELD_EXTENSION};

use super::error::VoxelError;

/// Dense grid of `nx · ny · nz` floats in row-major (x, y, z) order, z fastest.
#[derive(Debug, Clone, PartialEq)]
pub struct ScalarField {
    dims: [usize; 3],
    values: Vec<f32>,
}

impl ScalarField {
    /// Wrap `values`, which must hold exactly `nx · ny · nz` entries.
    pub fn new(dims: [usize; 3], values: Vec<f32>) -> Result<Self, VoxelError> {
        let expected = dims.iter().product::<usize>();
        if values.len() != expected {
            return Err(VoxelError::DimensionMismatch {
                dims,
                expected,
                actual: values.len(),
            });
        }
        Ok(Self { dims, values })
    }

    /// All-zero grid.
    pub fn zeros(dims: [usize; 3]) -> Self {
        Self {
            dims,
            values: vec![0.0; dims.iter().product()],
        }
    }

    /// `[nx, ny, nz]`
    pub fn dims(&self) -> [usize; 3] {
        self.dims
    }

    /// Values in storage order
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Flat index of `(i, j, k)`.
    #[inline]
    pub fn index(&self, i: usize, j: usize, k: usize) -> usize {
        (i * self.dims[1] + j) * self.dims[2] + k
    }

    /// Value at `(i, j, k)`, or `None` outside the grid.
    #[inline]
    pub fn get(&self, i: usize, j: usize, k: usize) -> Option<f32> {
        if i < self.dims[0] && j < self.dims[1] && k < self.dims[2] {
            Some(self.values[self.index(i, j, k)])
        } else {
            None
        }
    }

    pub(crate) fn set(&mut self, [i, j, k]: [usize; 3], value: f32) {
        let index = self.index(i, j, k);
        self.values[index] = value;
    }

    /// Write as a `.fara` file: `int32 nx, ny, nz` then the values.
    pub fn write(&self, path: &Path) -> Result<(), VoxelError> {
        check_extension(path, FIELD_EXTENSION)?;
        let dims = [
            to_i32(self.dims[0], "grid dimension")?,
            to_i32(self.dims[1], "grid dimension")?,
            to_i32(self.dims[2], "grid dimension")?,
        ];
        write_atomic(path, |w| {
            for dim in dims {
                w.write_i32::<LittleEndian>(dim)?;
            }
            for &value in &self.values {
                w.write_f32::<LittleEndian>(value)?;
            }
            Ok(())
        })?;
        Ok(())
    }

    /// Read a `.fara` file.
    pub fn read(path: &Path) -> Result<Self, VoxelError> {
        check_extension(path, FIELD_EXTENSION)?;
        let file = File::open(path)?;
        let file_len = file.metadata()?.len();
        let mut reader = BufReader::new(file);

        let mut dims = [0usize; 3];
        for dim in &mut dims {
            *dim = from_i32(reader.read_i32::<LittleEndian>()?, "grid dimension")?;
        }
        let expected = dims.iter().product::<usize>();
        let available = file_len.saturating_sub(12) / 4;
        if expected as u64 != available {
            return Err(VoxelError::DimensionMismatch {
                dims,
                expected,
                actual: available as usize,
            });
        }

        let mut values = vec![0f32; expected];
        reader.read_f32_into::<LittleEndian>(&mut values)?;
        Ok(Self { dims, values })
    }
}
