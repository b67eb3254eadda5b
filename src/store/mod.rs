//! # Column Store
//!
//! Streams a delimited source file into one append-only binary file per value
//! column, plus an 8-byte min/max index per column and a JSON manifest.
//!
//! Position *i* of every column file is cell id *i*; no id is stored. All
//! columns of one dataset have exactly `row_count` values.
//!
//! ## Example
//!
//! ```rust,no_run
//! use isomesh::store::{CacheLayout, ColumnStore, IngestOptions};
//!
//! let store = ColumnStore::with_options(
//!     CacheLayout::new("cache"),
//!     IngestOptions::default().with_trailing_columns(0),
//! );
//! let summary = store.ingest("cells.csv")?;
//! println!("{} rows, {} columns", summary.row_count, summary.columns.len());
//! # Ok::<(), isomesh::store::StoreError>(())
//! ```

mod column;
mod error;
mod ingest;
mod layout;
mod manifest;


pub use column::{column_len, read_column, write_column, ColumnWriter, MinMax, VALUE_SIZE};
pub use error::StoreError;
pub use ingest::{ColumnStore, ColumnSummary, IngestOptions, IngestSummary};
pub use layout::{CacheLayout, DatasetLayout};
pub use manifest::{DatasetManifest, DatasetSchema, MANIFEST_VERSION};

/// Load the schema of an ingested dataset.
///
/// Prefers the manifest; datasets without one fall back to the column
/// directories found on disk (sorted by name).
pub fn load_schema(dataset: &DatasetLayout) -> Result<DatasetSchema, StoreError> {
    dataset.require()?;
    let manifest_path = dataset.manifest_path();
    if manifest_path.is_file() {
        return Ok(DatasetManifest::read(&manifest_path)?.schema);
    }
    Ok(DatasetSchema::new(dataset.columns_on_disk()?))
}

/// Read the min/max index of `column`.
pub fn load_range(dataset: &DatasetLayout, column: &str) -> Result<MinMax, StoreError> {
    let path = dataset.minmax_file(column);
    if !path.is_file() {
        return Err(StoreError::ColumnNotFound(column.to_string()));
    }
    Ok(MinMax::read(&path)?)
}
