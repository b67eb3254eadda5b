//! Human-readable dataset manifest (`manifest.json`).
//!
//! The manifest carries the dataset schema, so row queries and partitioning
//! get column names from an explicit context object rather than from global
//! header state.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::format::write_atomic;

use super::column::MinMax;
use super::error::StoreError;

/// Current manifest format version.
pub const MANIFEST_VERSION: &str = "1.0";

/// Ordered value-column names of one dataset.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DatasetSchema {
    columns: Vec<String>,
}

impl DatasetSchema {
    /// Build a schema from ordered column names.
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }

    /// Column names in dataset order
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Number of value columns
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Whether the schema has no columns
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Position of `column`, if present
    pub fn index_of(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    /// Whether `column` is part of the schema
    pub fn contains(&self, column: &str) -> bool {
        self.index_of(column).is_some()
    }
}

/// Record of one ingest run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetManifest {
    /// Manifest format version
    pub format_version: String,
    /// Dataset name (source file stem)
    pub dataset: String,
    /// Source file the dataset was ingested from
    pub source: PathBuf,
    /// When the ingest finished
    pub ingested_at: DateTime<Utc>,
    /// Number of rows (cells)
    pub row_count: u64,
    /// Value columns in source order
    pub schema: DatasetSchema,
    /// Per-column value range
    pub ranges: BTreeMap<String, MinMax>,
}

impl DatasetManifest {
    /// Create a manifest stamped with the current time.
    pub fn new(
        dataset: impl Into<String>,
        source: impl Into<PathBuf>,
        row_count: u64,
        schema: DatasetSchema,
        ranges: BTreeMap<String, MinMax>,
    ) -> Self {
        Self {
            format_version: MANIFEST_VERSION.to_string(),
            dataset: dataset.into(),
            source: source.into(),
            ingested_at: Utc::now(),
            row_count,
            schema,
            ranges,
        }
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> Result<String, StoreError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the manifest to `path`.
    pub fn write(&self, path: &Path) -> Result<(), StoreError> {
        let json = self.to_json()?;
        write_atomic(path, |w| w.write_all(json.as_bytes()))?;
        Ok(())
    }

    /// Read a manifest from `path`.
    pub fn read(path: &Path) -> Result<Self, StoreError> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}
