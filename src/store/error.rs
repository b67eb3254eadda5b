use std::path::PathBuf;

use crate::format::ExtensionError;

/// Errors that can occur while ingesting or reading the column store
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// I/O error during file operations
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error from the delimited-text reader (malformed row, ragged field count)
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    /// Error serializing/deserializing the dataset manifest
    #[error("JSON serialization error: {0}")]
    SerdeJsonError(#[from] serde_json::Error),

    /// A loader was handed a file with the wrong extension
    #[error(transparent)]
    FormatError(#[from] ExtensionError),

    /// The source file does not exist
    #[error("Source file not found: {}", .0.display())]
    SourceNotFound(PathBuf),

    /// The dataset has no directory in the cache
    #[error("Dataset not found in cache: {0}")]
    DatasetNotFound(String),

    /// Invalid or malformed path
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// The header leaves no value columns once the id and trailing columns are dropped
    #[error("Header has {headers} columns; nothing left after dropping the id column and {trailing} trailing columns")]
    NoColumns {
        /// Number of header fields
        headers: usize,
        /// Number of trailing columns excluded
        trailing: usize,
    },

    /// A column name cannot be used as a cache directory name
    #[error("Invalid column name: {0:?}")]
    InvalidColumnName(String),

    /// A field failed to parse as a float; the whole ingest is aborted
    #[error("Row {row}, column {column}: {value:?} is not a number")]
    ParseError {
        /// Zero-based data row (cell id)
        row: u64,
        /// Column name
        column: String,
        /// Raw field text
        value: String,
    },

    /// The dataset has more rows than the int32 cell-id format can address
    #[error("Too many rows for int32 cell ids (limit {limit})")]
    TooManyRows {
        /// Maximum row count
        limit: u64,
    },

    /// A requested column has no files in the cache
    #[error("Column not found: {0}")]
    ColumnNotFound(String),
}
