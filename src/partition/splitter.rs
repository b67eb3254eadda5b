//! Value-range partitioning of one column.

use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use crossbeam_channel::unbounded;
use log::{debug, info, warn};

use crate::progress::{ProgressTracker, PHASE_SPLITTING};
use crate::store::{read_column, DatasetLayout, StoreError};
use crate::work_stack::{catch_panic, drain_with_pool, WorkStack};
use crate::CellId;

use super::bucket::{bucket_bounds, bucket_index};
use super::error::PartitionError;
use super::record::{write_partition, FieldCell};

/// Buckets with this many records or fewer are discarded.
pub const MIN_DISCARD_RECORDS: usize = 3;

/// Default number of columns partitioned concurrently.
pub const DEFAULT_PARTITION_THREADS: usize = 2;

/// One partition file written for a column.
#[derive(Debug, Clone)]
pub struct PartitionFile {
    /// Path of the `.divf` file
    pub path: PathBuf,
    /// Lower value bound
    pub lower: f32,
    /// Upper value bound
    pub upper: f32,
    /// Number of records in the file
    pub records: usize,
}

/// Outcome of partitioning one column.
#[derive(Debug, Clone)]
pub struct ColumnPartition {
    /// Column name
    pub column: String,
    /// Rows in the column
    pub rows: usize,
    /// Bucket width (`max / partitions`)
    pub divider: f32,
    /// Surviving partition files in bucket order
    pub files: Vec<PartitionFile>,
    /// Number of non-empty buckets dropped for being too small
    pub discarded_buckets: usize,
    /// Records lost with the dropped buckets
    pub discarded_records: usize,
}

/// A column whose partitioning failed.
#[derive(Debug, Clone)]
pub struct PartitionFailure {
    /// Column name
    pub column: String,
    /// Error description
    pub message: String,
}

/// Outcome of partitioning several columns.
#[derive(Debug, Clone, Default)]
pub struct PartitionReport {
    /// Columns that were partitioned
    pub columns: Vec<ColumnPartition>,
    /// Columns that failed
    pub failures: Vec<PartitionFailure>,
    /// Wall-clock time for the batch
    pub elapsed_seconds: f64,
}

impl PartitionReport {
    /// Total number of partition files written.
    pub fn files_written(&self) -> usize {
        self.columns.iter().map(|c| c.files.len()).sum()
    }

    /// Whether every column succeeded.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Splits the columns of one dataset into value-range partition files.
pub struct RangePartitioner {
    dataset: DatasetLayout,
    progress: ProgressTracker,
}

impl RangePartitioner {
    /// Partition columns of `dataset`.
    pub fn new(dataset: DatasetLayout) -> Self {
        Self {
            dataset,
            progress: ProgressTracker::new(),
        }
    }

    /// Report progress into `progress`.
    pub fn with_progress(mut self, progress: ProgressTracker) -> Self {
        self.progress = progress;
        self
    }

    /// Dataset being partitioned
    pub fn dataset(&self) -> &DatasetLayout {
        &self.dataset
    }

    /// Every column of the dataset that has a column file.
    pub fn all_columns(&self) -> Result<Vec<String>, PartitionError> {
        self.dataset.require()?;
        Ok(self.dataset.columns_on_disk()?)
    }

    /// Split one column into `partitions` value-range buckets.
    ///
    /// Loads the whole column, sorts it by value (stable, so equal values
    /// keep ascending cell order) and writes each bucket with more than
    /// [`MIN_DISCARD_RECORDS`] records as `<lower>_<upper>.divf`. Existing
    /// partition files of the column are deleted first.
    pub fn split_column(
        &self,
        column: &str,
        partitions: usize,
    ) -> Result<ColumnPartition, PartitionError> {
        if partitions == 0 {
            return Err(PartitionError::ZeroPartitions);
        }
        let column_file = self.dataset.column_file(column);
        if !column_file.is_file() {
            return Err(StoreError::ColumnNotFound(column.to_string()).into());
        }

        for old in self.dataset.partition_files(column)? {
            fs::remove_file(&old)?;
        }

        let values = read_column(&column_file)?;
        let rows = values.len();
        if partitions > rows {
            return Err(PartitionError::TooManyPartitions { partitions, rows });
        }

        let max = values.iter().copied().fold(f32::MIN, f32::max);
        let divider = max / partitions as f32;

        let mut cells: Vec<FieldCell> = values
            .into_iter()
            .enumerate()
            .map(|(i, value)| FieldCell::new(i as CellId, value))
            .collect();
        cells.sort_by(|a, b| a.value.total_cmp(&b.value));

        let mut buckets: Vec<Vec<FieldCell>> = vec![Vec::new(); partitions];
        for cell in cells {
            buckets[bucket_index(cell.value, divider, partitions)].push(cell);
        }

        let routed = divider > 0.0 && divider.is_finite();
        let mut result = ColumnPartition {
            column: column.to_string(),
            rows,
            divider,
            files: Vec::new(),
            discarded_buckets: 0,
            discarded_records: 0,
        };

        for (index, bucket) in buckets.iter().enumerate() {
            if bucket.is_empty() {
                continue;
            }
            if bucket.len() <= MIN_DISCARD_RECORDS {
                debug!(
                    "{}: dropping bucket {} with {} records",
                    column,
                    index,
                    bucket.len()
                );
                result.discarded_buckets += 1;
                result.discarded_records += bucket.len();
                continue;
            }

            let (lower, upper) = if routed {
                bucket_bounds(index, divider)
            } else {
                observed_bounds(bucket)
            };
            let path = self.dataset.partition_file(column, lower, upper);
            write_partition(&path, bucket)?;
            debug!("Wrote {} records to {}", bucket.len(), path.display());

            result.files.push(PartitionFile {
                path,
                lower,
                upper,
                records: bucket.len(),
            });
        }

        info!(
            "Split {} ({} rows) into {} partitions, {} small buckets dropped",
            column,
            rows,
            result.files.len(),
            result.discarded_buckets
        );
        Ok(result)
    }

    /// Partition several columns with a fixed pool of `threads` workers.
    ///
    /// Each worker takes one column at a time from a shared stack. A failing
    /// column is logged and reported without stopping the others.
    pub fn split_columns(
        &self,
        columns: &[String],
        partitions: usize,
        threads: usize,
    ) -> Result<PartitionReport, PartitionError> {
        if partitions == 0 {
            return Err(PartitionError::ZeroPartitions);
        }
        self.dataset.require()?;

        let start = Instant::now();
        let total = columns.len();
        let stack = WorkStack::new(columns.iter().rev().cloned().collect());
        let finished = AtomicUsize::new(0);
        let (tx, rx) = unbounded();

        info!(
            "Partitioning {} columns into {} ranges on {} threads",
            total, partitions, threads
        );
        self.progress.update(PHASE_SPLITTING, 0.0);

        drain_with_pool(threads, &stack, |column: String| {
            let outcome = catch_panic(|| self.split_column(&column, partitions))
                .and_then(|result| result.map_err(|e| e.to_string()));
            let done = finished.fetch_add(1, Ordering::Relaxed) + 1;
            self.progress.update_fraction(PHASE_SPLITTING, done, total);
            // The receiver outlives the pool.
            let _ = tx.send((column, outcome));
        })?;
        drop(tx);

        let mut report = PartitionReport::default();
        for (column, outcome) in rx.try_iter() {
            match outcome {
                Ok(partition) => report.columns.push(partition),
                Err(message) => {
                    warn!("Failed to partition {}: {}", column, message);
                    report.failures.push(PartitionFailure { column, message });
                }
            }
        }
        report.columns.sort_by(|a, b| a.column.cmp(&b.column));
        report.failures.sort_by(|a, b| a.column.cmp(&b.column));
        report.elapsed_seconds = start.elapsed().as_secs_f64();

        info!(
            "Partitioning finished: {} files across {} columns, {} failures in {:.2}s",
            report.files_written(),
            report.columns.len(),
            report.failures.len(),
            report.elapsed_seconds
        );
        Ok(report)
    }
}

fn observed_bounds(bucket: &[FieldCell]) -> (f32, f32) {
    let lower = bucket.iter().map(|c| c.value).fold(f32::MAX, f32::min);
    let upper = bucket.iter().map(|c| c.value).fold(f32::MIN, f32::max);
    (lower, upper)
}
