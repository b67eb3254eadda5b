use crate::format::ExtensionError;
use crate::store::StoreError;

/// Errors that can occur while partitioning a column by value range
#[derive(Debug, thiserror::Error)]
pub enum PartitionError {
    /// I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error reading the column store
    #[error("Store error: {0}")]
    StoreError(#[from] StoreError),

    /// A partition file has the wrong extension
    #[error(transparent)]
    FormatError(#[from] ExtensionError),

    /// Zero partitions were requested
    #[error("Partition count must be at least 1")]
    ZeroPartitions,

    /// More partitions were requested than the column has rows
    #[error("Cannot split {rows} rows into {partitions} partitions")]
    TooManyPartitions {
        /// Requested partition count
        partitions: usize,
        /// Rows in the column
        rows: usize,
    },

    /// The worker pool could not be started
    #[error("Thread pool error: {0}")]
    ThreadPoolError(#[from] rayon::ThreadPoolBuildError),
}
