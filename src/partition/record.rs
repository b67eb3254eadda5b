//! Partition file records: `(int32 cellId, float32 value)`.

use std::fs::File;
use std::io::{self, BufReader, Read, Write};
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use serde::{Deserialize, Serialize};

use crate::format::{check_extension, from_i32, record_count, to_i32, write_atomic, PARTITION_EXTENSION};
use crate::CellId;

use super::error::PartitionError;

/// Size of one partition record in bytes.
pub const RECORD_SIZE: u64 = 8;

/// One cell's value in a single column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FieldCell {
    /// Cell id (row index)
    pub cell_id: CellId,
    /// Column value
    pub value: f32,
}

impl FieldCell {
    /// Create a record.
    pub fn new(cell_id: CellId, value: f32) -> Self {
        Self { cell_id, value }
    }

    /// Read one record.
    pub fn read_from<R: Read + ?Sized>(reader: &mut R) -> io::Result<Self> {
        let raw = reader.read_i32::<LittleEndian>()?;
        let cell_id = from_i32(raw, "cell id")? as CellId;
        let value = reader.read_f32::<LittleEndian>()?;
        Ok(Self { cell_id, value })
    }

    /// Write one record.
    pub fn write_to<W: Write + ?Sized>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_i32::<LittleEndian>(to_i32(self.cell_id as usize, "cell id")?)?;
        writer.write_f32::<LittleEndian>(self.value)
    }
}

/// Load every record of a partition file.
pub fn read_partition(path: &Path) -> Result<Vec<FieldCell>, PartitionError> {
    check_extension(path, PARTITION_EXTENSION)?;
    let file = File::open(path)?;
    let count = record_count(&file, RECORD_SIZE, path)? as usize;
    let mut reader = BufReader::new(file);
    let mut cells = Vec::with_capacity(count);
    for _ in 0..count {
        cells.push(FieldCell::read_from(&mut reader)?);
    }
    Ok(cells)
}

/// Write `cells` as a partition file, replacing any file at `path`.
pub fn write_partition(path: &Path, cells: &[FieldCell]) -> Result<(), PartitionError> {
    check_extension(path, PARTITION_EXTENSION)?;
    write_atomic(path, |w| {
        for cell in cells {
            cell.write_to(w)?;
        }
        Ok(())
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_partition_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("0_2.5.divf");
        let cells = vec![
            FieldCell::new(4, 0.0),
            FieldCell::new(0, 1.25),
            FieldCell::new(17, 2.5),
        ];

        write_partition(&path, &cells).unwrap();
        assert_eq!(std::fs::metadata(&path).unwrap().len(), 24);
        assert_eq!(read_partition(&path).unwrap(), cells);
    }

    #[test]
    fn test_negative_cell_id_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.divf");
        let mut bytes = Vec::new();
        bytes.write_i32::<LittleEndian>(-1).unwrap();
        bytes.write_f32::<LittleEndian>(0.5).unwrap();
        std::fs::write(&path, bytes).unwrap();

        assert!(matches!(read_partition(&path), Err(PartitionError::IoError(_))));
    }

    #[test]
    fn test_wrong_extension() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("0_1.bnf");
        assert!(matches!(
            write_partition(&path, &[]),
            Err(PartitionError::FormatError(_))
        ));
        assert!(!path.exists());
    }
}
