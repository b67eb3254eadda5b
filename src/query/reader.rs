//! Skip-read cursors over a set of column files.

use std::fs::File;
use std::io::{BufReader, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use byteorder::{LittleEndian, ReadBytesExt};
use log::debug;
use serde::Serialize;

use crate::store::{column_len, load_schema, DatasetLayout, VALUE_SIZE};
use crate::CellId;

use super::error::QueryError;

/// One reconstructed row: a cell id and its value in every requested column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FullCell {
    /// Cell id (row index)
    pub cell_id: CellId,
    /// Values in the reader's column order
    pub values: Vec<f32>,
}

impl FullCell {
    /// Render as a JSON object keyed by `columns`.
    pub fn to_json(&self, columns: &[String]) -> serde_json::Value {
        let values: serde_json::Map<String, serde_json::Value> = columns
            .iter()
            .zip(&self.values)
            .map(|(name, value)| (name.clone(), serde_json::json!(value)))
            .collect();
        serde_json::json!({ "cell": self.cell_id, "values": values })
    }
}

struct Cursor {
    column: String,
    path: PathBuf,
    len: u64,
    reader: BufReader<File>,
}

/// Reads arbitrary rows from a dataset without loading whole columns.
///
/// One buffered cursor is held per column. A sweep visits the requested ids
/// in ascending order, skipping the gap between consecutive ids with a
/// relative seek, so each column file is scanned at most once per sweep.
pub struct ColumnarReader {
    cursors: Vec<Cursor>,
}

impl ColumnarReader {
    /// Open cursors over `columns` of `dataset`.
    pub fn open<S: AsRef<str>>(dataset: &DatasetLayout, columns: &[S]) -> Result<Self, QueryError> {
        dataset.require()?;
        let files = columns
            .iter()
            .map(|c| {
                let column = c.as_ref();
                let path = dataset.column_file(column);
                if !path.is_file() {
                    return Err(QueryError::ColumnNotFound(column.to_string()));
                }
                Ok((column.to_string(), path))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_files(files)
    }

    /// Open cursors over every column in the dataset's schema.
    pub fn open_all(dataset: &DatasetLayout) -> Result<Self, QueryError> {
        let schema = load_schema(dataset)?;
        Self::open(dataset, schema.columns())
    }

    /// Open cursors over explicit `(name, path)` column files.
    pub fn from_files<I>(files: I) -> Result<Self, QueryError>
    where
        I: IntoIterator<Item = (String, PathBuf)>,
    {
        let mut cursors = Vec::new();
        for (column, path) in files {
            let len = column_len(&path)?;
            let reader = BufReader::new(File::open(&path)?);
            cursors.push(Cursor {
                column,
                path,
                len,
                reader,
            });
        }
        if cursors.is_empty() {
            return Err(QueryError::NoColumns);
        }
        Ok(Self { cursors })
    }

    /// Column names in value order
    pub fn columns(&self) -> Vec<String> {
        self.cursors.iter().map(|c| c.column.clone()).collect()
    }

    /// Column file paths in value order
    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.cursors.iter().map(|c| c.path.as_path())
    }

    /// Rows in the shortest column.
    pub fn row_count(&self) -> u64 {
        self.cursors.iter().map(|c| c.len).min().unwrap_or(0)
    }

    /// Visit the rows for `ids` in ascending id order.
    ///
    /// Ids are sorted and de-duplicated first. `visit` receives each id and
    /// that row's values in column order; the slice is reused between calls.
    pub fn for_each_row<F>(&mut self, ids: &[CellId], mut visit: F) -> Result<(), QueryError>
    where
        F: FnMut(CellId, &[f32]),
    {
        let mut ids = ids.to_vec();
        ids.sort_unstable();
        ids.dedup();

        if let Some(&last) = ids.last() {
            self.check_range(last)?;
        }

        for cursor in &mut self.cursors {
            cursor.reader.seek(SeekFrom::Start(0))?;
        }

        let mut row = vec![0f32; self.cursors.len()];
        let mut next: u64 = 0;
        for id in ids {
            let gap = u64::from(id) - next;
            if gap > 0 {
                let offset = (gap * VALUE_SIZE) as i64;
                for cursor in &mut self.cursors {
                    cursor.reader.seek_relative(offset)?;
                }
            }
            for (slot, cursor) in row.iter_mut().zip(&mut self.cursors) {
                *slot = cursor.reader.read_f32::<LittleEndian>()?;
            }
            visit(id, &row);
            next = u64::from(id) + 1;
        }
        Ok(())
    }

    /// Materialize the rows for `ids`, in ascending id order.
    pub fn read_rows(&mut self, ids: &[CellId]) -> Result<Vec<FullCell>, QueryError> {
        let mut rows = Vec::with_capacity(ids.len());
        self.for_each_row(ids, |cell_id, values| {
            rows.push(FullCell {
                cell_id,
                values: values.to_vec(),
            })
        })?;
        debug!("Read {} rows from {} columns", rows.len(), self.cursors.len());
        Ok(rows)
    }

    fn check_range(&self, id: CellId) -> Result<(), QueryError> {
        match self.cursors.iter().find(|c| u64::from(id) >= c.len) {
            Some(cursor) => Err(QueryError::CellOutOfRange {
                cell_id: id,
                column: cursor.column.clone(),
                len: cursor.len,
            }),
            None => Ok(()),
        }
    }
}
