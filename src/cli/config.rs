//! TOML configuration file support for power users.
//!
//! Instead of repeating tuning flags, users can keep defaults in a config file:
//!
//! ```toml
//! # isomesh.toml
//! [pipeline]
//! divisions = 10
//! resolution = 250000
//! threads = 8
//! partition_threads = 2
//! iso_level = 0.1
//! split_cap = 65000
//! trailing_columns = 2
//! delimiter = ";"
//! min_partition_bytes = 4096
//! ```
//!
//! Flags given on the command line always win over the file.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::Path;

use isomesh::mesh::DEFAULT_SPLIT_CAP;
use isomesh::partition::DEFAULT_PARTITION_THREADS;
use isomesh::pipeline::{default_threads, PipelineOptions};
use isomesh::store::IngestOptions;

use super::{IngestArgs, MeshArgs};

/// Partitions per column when neither flag nor file sets it.
pub const DEFAULT_DIVISIONS: usize = 10;

/// Voxel bins per partition when neither flag nor file sets it.
pub const DEFAULT_RESOLUTION: usize = 100_000;

/// Root configuration structure for isomesh.toml files.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// Pipeline defaults.
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

/// Defaults for the ingest, partition and mesh phases.
#[derive(Debug, Default, Deserialize)]
pub struct PipelineConfig {
    /// Value-range partitions per column.
    pub divisions: Option<usize>,

    /// Approximate voxel bins per partition.
    pub resolution: Option<usize>,

    /// Mesh worker threads.
    pub threads: Option<usize>,

    /// Columns partitioned concurrently.
    pub partition_threads: Option<usize>,

    /// Iso-level in the normalized density field.
    pub iso_level: Option<f32>,

    /// Maximum vertices per mesh file.
    pub split_cap: Option<usize>,

    /// Trailing header columns excluded from the value set.
    pub trailing_columns: Option<usize>,

    /// Field delimiter (one ASCII character).
    pub delimiter: Option<String>,

    /// Partition files below this size are not meshed.
    pub min_partition_bytes: Option<u64>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse TOML configuration")
    }
}

impl PipelineConfig {
    /// Partitions per column.
    pub fn divisions(&self, flag: Option<usize>) -> usize {
        flag.or(self.divisions).unwrap_or(DEFAULT_DIVISIONS)
    }

    /// Voxel bins per partition.
    pub fn resolution(&self, flag: Option<usize>) -> usize {
        flag.or(self.resolution).unwrap_or(DEFAULT_RESOLUTION)
    }

    /// Mesh worker threads.
    pub fn threads(&self, flag: Option<usize>) -> usize {
        flag.or(self.threads).unwrap_or_else(default_threads)
    }

    /// Partition worker threads.
    pub fn partition_threads(&self, flag: Option<usize>) -> usize {
        flag.or(self.partition_threads)
            .unwrap_or(DEFAULT_PARTITION_THREADS)
    }

    /// Iso-level.
    pub fn iso_level(&self, flag: Option<f32>) -> f32 {
        flag.or(self.iso_level).unwrap_or(0.0)
    }

    /// Source parsing options.
    pub fn ingest_options(&self, args: &IngestArgs) -> Result<IngestOptions> {
        let mut options = IngestOptions::default();
        if let Some(trailing) = args.trailing_columns.or(self.trailing_columns) {
            options = options.with_trailing_columns(trailing);
        }
        let delimiter = match (args.delimiter, &self.delimiter) {
            (Some(c), _) => Some(c.to_string()),
            (None, Some(s)) => Some(s.clone()),
            (None, None) => None,
        };
        if let Some(delimiter) = delimiter {
            options = options.with_delimiter(delimiter_byte(&delimiter)?);
        }
        Ok(options)
    }

    /// Options for a full pipeline run.
    pub fn pipeline_options(
        &self,
        ingest: &IngestArgs,
        mesh: &MeshArgs,
        partition_threads: Option<usize>,
    ) -> Result<PipelineOptions> {
        Ok(PipelineOptions {
            ingest: self.ingest_options(ingest)?,
            partition_threads: self.partition_threads(partition_threads),
            split_cap: self.split_cap(mesh),
            min_partition_bytes: self.min_partition_bytes(mesh),
            write_debug_grids: mesh.debug_grids,
        })
    }

    /// Vertex cap per mesh file.
    pub fn split_cap(&self, mesh: &MeshArgs) -> usize {
        mesh.split_cap.or(self.split_cap).unwrap_or(DEFAULT_SPLIT_CAP)
    }

    /// Minimum partition file size to mesh.
    pub fn min_partition_bytes(&self, mesh: &MeshArgs) -> u64 {
        mesh.min_partition_bytes
            .or(self.min_partition_bytes)
            .unwrap_or(0)
    }
}

/// Parse a one-character delimiter; `\t` is accepted for tab.
fn delimiter_byte(delimiter: &str) -> Result<u8> {
    if delimiter == "\\t" {
        return Ok(b'\t');
    }
    match delimiter.as_bytes() {
        [byte] if byte.is_ascii() => Ok(*byte),
        _ => bail!("Delimiter must be a single ASCII character, got {delimiter:?}"),
    }
}
