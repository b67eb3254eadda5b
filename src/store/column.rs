//! Column files and their min/max index.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use serde::{Deserialize, Serialize};

use crate::format::{check_extension, record_count, write_atomic, COLUMN_EXTENSION};

use super::error::StoreError;

/// Size of one column value in bytes.
pub const VALUE_SIZE: u64 = 4;

/// Running minimum and maximum of a column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MinMax {
    /// Smallest value seen
    pub min: f32,
    /// Largest value seen
    pub max: f32,
}

impl Default for MinMax {
    fn default() -> Self {
        Self {
            min: f32::MAX,
            max: f32::MIN,
        }
    }
}

impl MinMax {
    /// Fold one value into the range. NaN never moves either bound.
    #[inline]
    pub fn update(&mut self, value: f32) {
        if value < self.min {
            self.min = value;
        }
        if value > self.max {
            self.max = value;
        }
    }

    /// Axis length (`max - min`)
    pub fn length(&self) -> f32 {
        self.max - self.min
    }

    /// Read an 8-byte min/max file.
    pub fn read(path: &Path) -> io::Result<Self> {
        let mut reader = BufReader::new(File::open(path)?);
        let min = reader.read_f32::<LittleEndian>()?;
        let max = reader.read_f32::<LittleEndian>()?;
        Ok(Self { min, max })
    }

    /// Write an 8-byte min/max file.
    pub fn write(&self, path: &Path) -> io::Result<()> {
        write_atomic(path, |w| {
            w.write_f32::<LittleEndian>(self.min)?;
            w.write_f32::<LittleEndian>(self.max)
        })
    }
}

/// Append-only writer for one column file that tracks the column's range.
pub struct ColumnWriter {
    writer: BufWriter<File>,
    range: MinMax,
    len: u64,
}

impl ColumnWriter {
    /// Create (truncating) the column file at `path`.
    pub fn create(path: &Path) -> io::Result<Self> {
        Ok(Self {
            writer: BufWriter::new(File::create(path)?),
            range: MinMax::default(),
            len: 0,
        })
    }

    /// Append one value.
    #[inline]
    pub fn push(&mut self, value: f32) -> io::Result<()> {
        self.writer.write_f32::<LittleEndian>(value)?;
        self.range.update(value);
        self.len += 1;
        Ok(())
    }

    /// Flush and return the number of values written and their range.
    pub fn finish(mut self) -> io::Result<(u64, MinMax)> {
        self.writer.flush()?;
        Ok((self.len, self.range))
    }
}

/// Load a whole column file into memory.
pub fn read_column(path: &Path) -> Result<Vec<f32>, StoreError> {
    check_extension(path, COLUMN_EXTENSION)?;
    let file = File::open(path)?;
    let count = record_count(&file, VALUE_SIZE, path)? as usize;
    let mut reader = BufReader::new(file);
    let mut values = vec![0f32; count];
    reader.read_f32_into::<LittleEndian>(&mut values)?;
    Ok(values)
}

/// Number of values in a column file.
pub fn column_len(path: &Path) -> Result<u64, StoreError> {
    check_extension(path, COLUMN_EXTENSION)?;
    let file = File::open(path)?;
    Ok(record_count(&file, VALUE_SIZE, path)?)
}

/// Write a whole column file in one go.
pub fn write_column(path: &Path, values: &[f32]) -> Result<MinMax, StoreError> {
    check_extension(path, COLUMN_EXTENSION)?;
    let mut writer = ColumnWriter::create(path)?;
    for &value in values {
        writer.push(value)?;
    }
    let (_, range) = writer.finish()?;
    Ok(range)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_column_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("full.bnf");
        let values = vec![3.5, -1.0, 0.0, 1.0e6, 2.25];

        let range = write_column(&path, &values).unwrap();
        assert_eq!(range, MinMax { min: -1.0, max: 1.0e6 });
        assert_eq!(column_len(&path).unwrap(), 5);
        assert_eq!(read_column(&path).unwrap(), values);
    }

    #[test]
    fn test_minmax_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("minmax.bin");
        let range = MinMax { min: -3.0, max: 7.5 };

        range.write(&path).unwrap();
        assert_eq!(std::fs::metadata(&path).unwrap().len(), 8);
        assert_eq!(MinMax::read(&path).unwrap(), range);
    }

    #[test]
    fn test_minmax_ignores_nan() {
        let mut range = MinMax::default();
        range.update(f32::NAN);
        range.update(2.0);
        range.update(f32::NAN);
        assert_eq!(range, MinMax { min: 2.0, max: 2.0 });
    }

    #[test]
    fn test_read_column_wrong_extension() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("full.bin");
        std::fs::write(&path, [0u8; 8]).unwrap();

        let err = read_column(&path).unwrap_err();
        assert!(matches!(err, StoreError::FormatError(_)));
    }

    #[test]
    fn test_read_column_truncated_record() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("full.bnf");
        std::fs::write(&path, [0u8; 6]).unwrap();

        assert!(matches!(read_column(&path), Err(StoreError::IoError(_))));
    }
}
