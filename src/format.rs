//! Shared plumbing for the little-endian binary cache formats.
//!
//! Every file in the cache is fixed-width, little-endian and unpadded. Loaders
//! check the file extension before opening anything so that a mismatched file
//! fails fast with the extension it should have had.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

/// Extension of a full column file (`float32[row_count]`).
pub const COLUMN_EXTENSION: &str = "bnf";

/// Extension of a value-range partition file (`(int32, float32)` records).
pub const PARTITION_EXTENSION: &str = "divf";

/// Extension of an intermediate mesh file.
pub const MESH_EXTENSION: &str = "imf";

/// Extension of a voxel list file.
pub const VOXEL_LIST_EXTENSION: &str = "vox";

/// Extension of a dense float-grid file.
pub const FIELD_EXTENSION: &str = "fara";

/// Raised when a loader is handed a file with the wrong extension.
#[derive(Debug, thiserror::Error)]
#[error("expected a .{expected} file, got {}", path.display())]
pub struct ExtensionError {
    /// Extension the loader accepts
    pub expected: &'static str,
    /// Offending path
    pub path: PathBuf,
}

/// Check that `path` carries the `expected` extension (ASCII case-insensitive).
pub fn check_extension(path: &Path, expected: &'static str) -> Result<(), ExtensionError> {
    let matches = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case(expected))
        .unwrap_or(false);

    if matches {
        Ok(())
    } else {
        Err(ExtensionError {
            expected,
            path: path.to_path_buf(),
        })
    }
}

/// Whether `path` carries the `expected` extension.
pub fn has_extension(path: &Path, expected: &'static str) -> bool {
    check_extension(path, expected).is_ok()
}

/// Write a file through a temporary sibling and rename it into place.
///
/// A failed write never leaves a truncated file at `path`, so readers of the
/// output directory only ever see complete files.
pub fn write_atomic<F>(path: &Path, write: F) -> io::Result<()>
where
    F: FnOnce(&mut dyn Write) -> io::Result<()>,
{
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut temp = NamedTempFile::new_in(dir)?;
    {
        let mut writer = BufWriter::new(temp.as_file_mut());
        write(&mut writer)?;
        writer.flush()?;
    }
    temp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Number of fixed-size records in a file, rejecting trailing partial records.
pub fn record_count(file: &File, record_size: u64, path: &Path) -> io::Result<u64> {
    let len = file.metadata()?.len();
    if len % record_size != 0 {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!(
                "{} is {} bytes, not a multiple of the {}-byte record size",
                path.display(),
                len,
                record_size
            ),
        ));
    }
    Ok(len / record_size)
}

/// Convert an in-memory count or index into the on-disk `int32`.
pub fn to_i32(value: usize, what: &str) -> io::Result<i32> {
    i32::try_from(value).map_err(|_| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("{what} {value} does not fit the int32 file format"),
        )
    })
}

/// Convert an on-disk `int32` count or index into a `usize`.
pub fn from_i32(value: i32, what: &str) -> io::Result<usize> {
    usize::try_from(value).map_err(|_| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("negative {what} {value} in file"),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_check_extension() {
        assert!(check_extension(Path::new("a/b/0_1.divf"), PARTITION_EXTENSION).is_ok());
        assert!(check_extension(Path::new("a/b/0_1.DIVF"), PARTITION_EXTENSION).is_ok());

        let err = check_extension(Path::new("a/b/mesh.bin"), MESH_EXTENSION).unwrap_err();
        assert_eq!(err.expected, "imf");
        assert!(err.to_string().contains(".imf"));

        assert!(check_extension(Path::new("no_extension"), COLUMN_EXTENSION).is_err());
    }

    #[test]
    fn test_write_atomic_replaces_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.bin");
        fs::write(&path, b"old contents").unwrap();

        write_atomic(&path, |w| w.write_all(b"new")).unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"new");
    }

    #[test]
    fn test_write_atomic_failure_leaves_no_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.bin");

        let result = write_atomic(&path, |w| {
            w.write_all(b"partial")?;
            Err(io::Error::new(io::ErrorKind::Other, "boom"))
        });
        assert!(result.is_err());
        assert!(!path.exists());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_int32_conversions() {
        assert_eq!(to_i32(42, "count").unwrap(), 42);
        assert!(to_i32(i32::MAX as usize + 1, "count").is_err());
        assert_eq!(from_i32(7, "count").unwrap(), 7);
        assert!(from_i32(-1, "count").is_err());
    }
}
