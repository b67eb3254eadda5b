//! # Intermediate Meshes
//!
//! Collects the triangles produced by an [`IsosurfaceExtractor`], welds
//! identical vertices and splits meshes that exceed a renderer's vertex
//! limit.
//!
//! ## File format (`.imf`)
//!
//! Little-endian, no padding:
//!
//! | Field | Type |
//! |-------|------|
//! | vertex count | `int32` |
//! | vertices | `vertex count × (float32 x, y, z)` |
//! | index count | `int32` |
//! | triangle indices | `index count × int32` |
//!
//! ```rust
//! use isomesh::mesh::IntermediateMesh;
//! use isomesh::point::Point;
//!
//! let mut mesh = IntermediateMesh::new();
//! let (a, b, c, d) = (
//!     Point::new(0.0, 0.0, 0.0),
//!     Point::new(1.0, 0.0, 0.0),
//!     Point::new(1.0, 1.0, 0.0),
//!     Point::new(0.0, 1.0, 0.0),
//! );
//! mesh.push_triangle(a, b, c);
//! mesh.push_triangle(a, c, d);
//! mesh.make_unique();
//! assert_eq!(mesh.vertex_count(), 4);
//! ```

mod builder;
mod error;
mod extract;


pub use builder::{IntermediateMesh, DEFAULT_SPLIT_CAP};
pub use error::MeshError;
pub use extract::{CuberilleExtractor, IsosurfaceExtractor};
