//! Cache directory convention.
//!
//! ```text
//! <cache>/<dataset>/
//! ├── manifest.json
//! ├── fields/<column>/full.bnf        # float32[row_count]
//! ├── fields/<column>/minmax.bin      # float32 min, float32 max
//! ├── fields/<column>/<lo>_<hi>.divf  # value-range partitions
//! └── meshes/<attribute>/<resolution>/<lo>_<hi>[_<n>].imf
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::format::{has_extension, COLUMN_EXTENSION, PARTITION_EXTENSION};

use super::error::StoreError;

const FIELDS_DIR: &str = "fields";
const MESHES_DIR: &str = "meshes";
const COLUMN_FILE: &str = "full.bnf";
const MINMAX_FILE: &str = "minmax.bin";
const MANIFEST_FILE: &str = "manifest.json";

/// Root of the on-disk cache.
#[derive(Debug, Clone)]
pub struct CacheLayout {
    root: PathBuf,
}

impl CacheLayout {
    /// Use `root` as the cache directory.
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Cache root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Layout of the dataset called `name`.
    pub fn dataset(&self, name: &str) -> DatasetLayout {
        DatasetLayout {
            name: name.to_string(),
            dir: self.root.join(name),
        }
    }

    /// Layout of the dataset ingested from `source` (named by the file stem).
    pub fn dataset_for_source(&self, source: &Path) -> Result<DatasetLayout, StoreError> {
        let stem = source
            .file_stem()
            .and_then(|s| s.to_str())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                StoreError::InvalidPath(format!(
                    "cannot derive a dataset name from {}",
                    source.display()
                ))
            })?;
        Ok(self.dataset(stem))
    }

    /// Names of every dataset currently in the cache, sorted.
    pub fn datasets(&self) -> io::Result<Vec<String>> {
        if !self.root.is_dir() {
            return Ok(Vec::new());
        }
        sorted_subdirs(&self.root)
    }
}

/// Paths belonging to one dataset in the cache.
#[derive(Debug, Clone)]
pub struct DatasetLayout {
    name: String,
    dir: PathBuf,
}

impl DatasetLayout {
    /// Dataset name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Dataset directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Whether the dataset has been ingested
    pub fn exists(&self) -> bool {
        self.dir.is_dir()
    }

    /// Fail with [`StoreError::DatasetNotFound`] unless the dataset exists.
    pub fn require(&self) -> Result<(), StoreError> {
        if self.exists() {
            Ok(())
        } else {
            Err(StoreError::DatasetNotFound(self.name.clone()))
        }
    }

    /// `fields/` directory
    pub fn fields_dir(&self) -> PathBuf {
        self.dir.join(FIELDS_DIR)
    }

    /// `meshes/` directory
    pub fn meshes_dir(&self) -> PathBuf {
        self.dir.join(MESHES_DIR)
    }

    /// `manifest.json` path
    pub fn manifest_path(&self) -> PathBuf {
        self.dir.join(MANIFEST_FILE)
    }

    /// Directory holding one column's files
    pub fn column_dir(&self, column: &str) -> PathBuf {
        self.fields_dir().join(column)
    }

    /// Full column file for `column`
    pub fn column_file(&self, column: &str) -> PathBuf {
        self.column_dir(column).join(COLUMN_FILE)
    }

    /// Min/max index file for `column`
    pub fn minmax_file(&self, column: &str) -> PathBuf {
        self.column_dir(column).join(MINMAX_FILE)
    }

    /// Partition file covering `[lower, upper)` of `column`
    pub fn partition_file(&self, column: &str, lower: f32, upper: f32) -> PathBuf {
        self.column_dir(column)
            .join(format!("{}_{}.{}", lower, upper, PARTITION_EXTENSION))
    }

    /// Output directory for meshes of `attribute` at `resolution`
    pub fn mesh_dir(&self, attribute: &str, resolution: usize) -> PathBuf {
        self.meshes_dir().join(attribute).join(resolution.to_string())
    }

    /// Columns that have a full column file, sorted by name.
    pub fn columns_on_disk(&self) -> io::Result<Vec<String>> {
        let fields = self.fields_dir();
        if !fields.is_dir() {
            return Ok(Vec::new());
        }
        Ok(sorted_subdirs(&fields)?
            .into_iter()
            .filter(|column| {
                let file = self.column_file(column);
                file.is_file() && has_extension(&file, COLUMN_EXTENSION)
            })
            .collect())
    }

    /// Partition files of `column`, sorted by path.
    pub fn partition_files(&self, column: &str) -> io::Result<Vec<PathBuf>> {
        let dir = self.column_dir(column);
        if !dir.is_dir() {
            return Ok(Vec::new());
        }
        let mut files = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.is_file() && has_extension(&path, PARTITION_EXTENSION) {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }
}

fn sorted_subdirs(dir: &Path) -> io::Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }
    }
    names.sort();
    Ok(names)
}
