use crate::format::ExtensionError;

/// Errors that can occur while building, splitting or storing meshes
#[derive(Debug, thiserror::Error)]
pub enum MeshError {
    /// I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// A mesh file has the wrong extension
    #[error(transparent)]
    FormatError(#[from] ExtensionError),

    /// The triangle index list is not a whole number of triangles
    #[error("Triangle index list has {len} entries, not a multiple of 3")]
    InvalidTriangleList {
        /// Number of indices
        len: usize,
    },

    /// A triangle refers to a vertex that does not exist
    #[error("Triangle index {index} out of range for {vertices} vertices")]
    IndexOutOfRange {
        /// Offending index
        index: i64,
        /// Number of vertices
        vertices: usize,
    },

    /// A mesh file ends before its declared contents
    #[error("Mesh data truncated: {0}")]
    Truncated(String),

    /// The mesh has no vertices and would produce an empty file
    #[error("Mesh has no vertices")]
    EmptyMesh,

    /// The split cap cannot hold a single triangle
    #[error("Split cap {cap} is below one triangle (3 vertices)")]
    SplitCapTooSmall {
        /// Requested cap
        cap: usize,
    },
}
