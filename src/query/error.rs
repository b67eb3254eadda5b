use crate::format::ExtensionError;
use crate::store::StoreError;
use crate::CellId;

/// Errors that can occur while reading rows back out of the column store
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    /// I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error loading the dataset schema or layout
    #[error("Store error: {0}")]
    StoreError(#[from] StoreError),

    /// A column file has the wrong extension
    #[error(transparent)]
    FormatError(#[from] ExtensionError),

    /// Column not found
    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    /// No columns were requested
    #[error("At least one column is required")]
    NoColumns,

    /// A requested cell id is past the end of a column
    #[error("Cell {cell_id} is out of range for column {column} ({len} rows)")]
    CellOutOfRange {
        /// Requested cell id
        cell_id: CellId,
        /// Column that is too short
        column: String,
        /// Number of rows in that column
        len: u64,
    },
}
