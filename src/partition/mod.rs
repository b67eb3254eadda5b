//! # Range Partitioning
//!
//! Splits one attribute column into value-range buckets. Each surviving
//! bucket becomes a `<lower>_<upper>.divf` file of `(cellId, value)` records,
//! sorted ascending by value.
//!
//! With `max` the column maximum and `n` the partition count, the bucket
//! width is `d = max / n` and a value `v` lands in bucket
//! `clamp(ceil(v / d) - 1, 0, n - 1)`. Buckets holding three records or fewer
//! are dropped.
//!
//! ```rust,no_run
//! use isomesh::partition::RangePartitioner;
//! use isomesh::store::CacheLayout;
//!
//! let partitioner = RangePartitioner::new(CacheLayout::new("cache").dataset("cells"));
//! let columns = partitioner.all_columns()?;
//! let report = partitioner.split_columns(&columns, 10, 2)?;
//! println!("{} partition files", report.files_written());
//! # Ok::<(), isomesh::partition::PartitionError>(())
//! ```

mod bucket;
mod error;
mod record;
mod splitter;


pub use bucket::{bucket_bounds, bucket_index};
pub use error::PartitionError;
pub use record::{read_partition, write_partition, FieldCell, RECORD_SIZE};
pub use splitter::{
    ColumnPartition, PartitionFailure, PartitionFile, PartitionReport, RangePartitioner,
    DEFAULT_PARTITION_THREADS, MIN_DISCARD_RECORDS,
};
