//! Streaming ingest of a delimited source file into per-column binaries.

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;
use std::time::Instant;

use csv::{ReaderBuilder, StringRecord, Trim};
use log::{debug, info, warn};

use crate::progress::{ProgressTracker, PHASE_PARSING};

use super::column::{ColumnWriter, MinMax};
use super::error::StoreError;
use super::layout::{CacheLayout, DatasetLayout};
use super::manifest::{DatasetManifest, DatasetSchema};

/// Rows between progress reports.
const PROGRESS_INTERVAL: u64 = 500_000;

/// Options controlling how a source file is split into columns.
#[derive(Debug, Clone)]
pub struct IngestOptions {
    /// Field delimiter (default `,`)
    pub delimiter: u8,
    /// Number of trailing header columns excluded from the value set (default 2)
    pub trailing_columns: usize,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            trailing_columns: 2,
        }
    }
}

impl IngestOptions {
    /// Set the number of excluded trailing columns.
    pub fn with_trailing_columns(mut self, trailing_columns: usize) -> Self {
        self.trailing_columns = trailing_columns;
        self
    }

    /// Set the field delimiter.
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }
}

/// Range of one ingested column.
#[derive(Debug, Clone)]
pub struct ColumnSummary {
    /// Column name
    pub name: String,
    /// Column min/max
    pub range: MinMax,
}

/// Statistics from a completed ingest.
#[derive(Debug, Clone)]
pub struct IngestSummary {
    /// Dataset name in the cache
    pub dataset: String,
    /// Number of data rows (cells)
    pub row_count: u64,
    /// Per-column ranges in source order
    pub columns: Vec<ColumnSummary>,
    /// Wall-clock time for the ingest
    pub elapsed_seconds: f64,
}

/// Writes a delimited source file into the columnar cache.
pub struct ColumnStore {
    cache: CacheLayout,
    options: IngestOptions,
    progress: ProgressTracker,
}

impl ColumnStore {
    /// Create a store over `cache` with default options.
    pub fn new(cache: CacheLayout) -> Self {
        Self::with_options(cache, IngestOptions::default())
    }

    /// Create a store over `cache` with custom options.
    pub fn with_options(cache: CacheLayout, options: IngestOptions) -> Self {
        Self {
            cache,
            options,
            progress: ProgressTracker::new(),
        }
    }

    /// Report progress into `progress` instead of a private tracker.
    pub fn with_progress(mut self, progress: ProgressTracker) -> Self {
        self.progress = progress;
        self
    }

    /// Cache this store writes into
    pub fn cache(&self) -> &CacheLayout {
        &self.cache
    }

    /// Ingest `source` into `<cache>/<stem>/`.
    ///
    /// Any existing cache entry for the dataset is removed first. A field that
    /// fails to parse as a float aborts the whole ingest and removes whatever
    /// was written so far; there is no row-skipping mode.
    pub fn ingest<P: AsRef<Path>>(&self, source: P) -> Result<IngestSummary, StoreError> {
        let source = source.as_ref();
        let start = Instant::now();

        if !source.is_file() {
            return Err(StoreError::SourceNotFound(source.to_path_buf()));
        }
        let dataset = self.cache.dataset_for_source(source)?;

        let mut reader = self.open_source(source)?;
        let headers = reader.headers()?.clone();
        let retained = self.retained_columns(&headers)?;

        if dataset.exists() {
            info!("Removing previous cache entry {}", dataset.dir().display());
            fs::remove_dir_all(dataset.dir())?;
        }

        let source_size = fs::metadata(source)?.len();
        info!("Reading {}...", source.display());
        match self.write_columns(&mut reader, &dataset, &retained, source_size) {
            Ok((row_count, ranges)) => {
                let schema = DatasetSchema::new(retained.iter().map(|(_, name)| name.clone()));
                let manifest = DatasetManifest::new(
                    dataset.name(),
                    source,
                    row_count,
                    schema,
                    ranges.iter().cloned().collect::<BTreeMap<_, _>>(),
                );
                if let Err(e) = manifest.write(&dataset.manifest_path()) {
                    discard(&dataset);
                    return Err(e);
                }

                self.progress.update(PHASE_PARSING, 100.0);
                let elapsed_seconds = start.elapsed().as_secs_f64();
                info!(
                    "Ingested {} rows x {} columns into {} in {:.2}s",
                    row_count,
                    ranges.len(),
                    dataset.dir().display(),
                    elapsed_seconds
                );

                Ok(IngestSummary {
                    dataset: dataset.name().to_string(),
                    row_count,
                    columns: ranges
                        .into_iter()
                        .map(|(name, range)| ColumnSummary { name, range })
                        .collect(),
                    elapsed_seconds,
                })
            }
            Err(e) => {
                discard(&dataset);
                Err(e)
            }
        }
    }

    /// Value columns `source` would produce, read from its header line only.
    ///
    /// Nothing is written, so callers can check column names before
    /// [`ingest`](Self::ingest) replaces an existing cache entry.
    pub fn read_schema<P: AsRef<Path>>(&self, source: P) -> Result<DatasetSchema, StoreError> {
        let source = source.as_ref();
        if !source.is_file() {
            return Err(StoreError::SourceNotFound(source.to_path_buf()));
        }
        let mut reader = self.open_source(source)?;
        let headers = reader.headers()?.clone();
        let retained = self.retained_columns(&headers)?;
        Ok(DatasetSchema::new(retained.into_iter().map(|(_, name)| name)))
    }

    fn open_source(&self, source: &Path) -> Result<csv::Reader<fs::File>, StoreError> {
        Ok(ReaderBuilder::new()
            .delimiter(self.options.delimiter)
            .has_headers(true)
            .trim(Trim::All)
            .from_path(source)?)
    }

    /// Header positions and names of the value columns.
    fn retained_columns(&self, headers: &StringRecord) -> Result<Vec<(usize, String)>, StoreError> {
        let end = headers.len().saturating_sub(self.options.trailing_columns);
        if end <= 1 {
            return Err(StoreError::NoColumns {
                headers: headers.len(),
                trailing: self.options.trailing_columns,
            });
        }

        let mut seen = HashSet::new();
        let mut retained = Vec::with_capacity(end - 1);
        for (index, name) in headers.iter().enumerate().take(end).skip(1) {
            if !is_valid_column_name(name) || !seen.insert(name) {
                return Err(StoreError::InvalidColumnName(name.to_string()));
            }
            retained.push((index, name.to_string()));
        }
        Ok(retained)
    }

    fn write_columns(
        &self,
        reader: &mut csv::Reader<fs::File>,
        dataset: &DatasetLayout,
        retained: &[(usize, String)],
        source_size: u64,
    ) -> Result<(u64, Vec<(String, MinMax)>), StoreError> {
        let mut writers = Vec::with_capacity(retained.len());
        for (_, name) in retained {
            fs::create_dir_all(dataset.column_dir(name))?;
            writers.push(ColumnWriter::create(&dataset.column_file(name))?);
        }
        fs::create_dir_all(dataset.meshes_dir())?;

        let row_limit = i32::MAX as u64;
        let mut record = StringRecord::new();
        let mut row: u64 = 0;
        while reader.read_record(&mut record)? {
            if row >= row_limit {
                return Err(StoreError::TooManyRows { limit: row_limit });
            }
            for ((index, name), writer) in retained.iter().zip(writers.iter_mut()) {
                let field = record.get(*index).unwrap_or("");
                let value: f32 = field.parse().map_err(|_| StoreError::ParseError {
                    row,
                    column: name.clone(),
                    value: field.to_string(),
                })?;
                writer.push(value)?;
            }
            row += 1;

            if row % PROGRESS_INTERVAL == 0 {
                let consumed = reader.position().byte();
                let percent = if source_size == 0 {
                    100.0
                } else {
                    consumed as f64 / source_size as f64 * 100.0
                };
                self.progress.update(PHASE_PARSING, percent);
                info!("Parsing file: {:.2}%", percent);
            }
        }

        let mut ranges = Vec::with_capacity(retained.len());
        for ((_, name), writer) in retained.iter().zip(writers) {
            let (len, range) = writer.finish()?;
            debug_assert_eq!(len, row);
            range.write(&dataset.minmax_file(name))?;
            debug!(
                "{} had minimum {} and maximum {}",
                dataset.minmax_file(name).display(),
                range.min,
                range.max
            );
            ranges.push((name.clone(), range));
        }

        Ok((row, ranges))
    }
}

fn is_valid_column_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(&['/', '\\', '\0'][..])
}

fn discard(dataset: &DatasetLayout) {
    if let Err(e) = fs::remove_dir_all(dataset.dir()) {
        warn!(
            "Failed to remove partial dataset {}: {}",
            dataset.dir().display(),
            e
        );
    }
}
