//! Intermediate mesh: vertex welding, size-bounded splitting, `.imf` files.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use byteorder::{ByteOrder, LittleEndian, WriteBytesExt};

use crate::format::{check_extension, to_i32, write_atomic, MESH_EXTENSION};
use crate::point::{Point, POINT_SIZE};

use super::error::MeshError;

/// Default vertex cap per written mesh.
pub const DEFAULT_SPLIT_CAP: usize = 65_000;

/// Headroom kept below the cap when filling a sub-mesh.
const SPLIT_HEADROOM: usize = 4;

/// Ordered vertex list plus a flat triangle index list.
///
/// Vertices compare exactly (see [`Point`]); [`make_unique`](Self::make_unique)
/// welds bit-identical vertices without any tolerance.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IntermediateMesh {
    vertices: Vec<Point>,
    triangles: Vec<u32>,
}

impl IntermediateMesh {
    /// Create an empty mesh.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a mesh from parts, validating the triangle list.
    pub fn from_parts(vertices: Vec<Point>, triangles: Vec<u32>) -> Result<Self, MeshError> {
        if triangles.len() % 3 != 0 {
            return Err(MeshError::InvalidTriangleList {
                len: triangles.len(),
            });
        }
        if let Some(&index) = triangles.iter().find(|&&i| i as usize >= vertices.len()) {
            return Err(MeshError::IndexOutOfRange {
                index: i64::from(index),
                vertices: vertices.len(),
            });
        }
        Ok(Self {
            vertices,
            triangles,
        })
    }

    /// Append one triangle as three fresh vertices.
    pub fn push_triangle(&mut self, a: Point, b: Point, c: Point) {
        let base = self.vertices.len() as u32;
        self.vertices.extend_from_slice(&[a, b, c]);
        self.triangles.extend_from_slice(&[base, base + 1, base + 2]);
    }

    /// Vertex list
    pub fn vertices(&self) -> &[Point] {
        &self.vertices
    }

    /// Flat triangle index list
    pub fn triangles(&self) -> &[u32] {
        &self.triangles
    }

    /// Number of vertices
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Number of whole triangles
    pub fn triangle_count(&self) -> usize {
        self.triangles.len() / 3
    }

    /// Whether the mesh has no vertices
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Take the vertex and index lists.
    pub fn into_parts(self) -> (Vec<Point>, Vec<u32>) {
        (self.vertices, self.triangles)
    }

    /// Weld identical vertices.
    ///
    /// Distinct vertices keep their first-occurrence order and every triangle
    /// index is remapped. Running it twice changes nothing.
    pub fn make_unique(&mut self) {
        let mut seen: HashMap<Point, u32> = HashMap::with_capacity(self.vertices.len());
        let mut unique = Vec::with_capacity(self.vertices.len());
        let remap: Vec<u32> = self
            .vertices
            .iter()
            .map(|&point| {
                *seen.entry(point).or_insert_with(|| {
                    unique.push(point);
                    (unique.len() - 1) as u32
                })
            })
            .collect();

        for index in &mut self.triangles {
            *index = remap[*index as usize];
        }
        self.vertices = unique;
    }

    /// Split into sub-meshes of at most `cap` vertices.
    ///
    /// A mesh already within the cap is returned as is. Otherwise whole
    /// triangles are copied in order into the current sub-mesh (three vertices
    /// each, no sharing) until it holds more than `cap - 4` vertices, then a
    /// new sub-mesh is started. Vertices shared across sub-meshes are
    /// duplicated.
    ///
    /// The vertex counts of the pieces sum to `3 · triangle_count`, which is
    /// the input's vertex count only for an unwelded soup. Split the soup
    /// first and weld each piece afterwards.
    pub fn divide_into_small(self, cap: usize) -> Result<Vec<Self>, MeshError> {
        if cap < 3 {
            return Err(MeshError::SplitCapTooSmall { cap });
        }
        if self.vertices.len() <= cap {
            return Ok(vec![self]);
        }

        let threshold = cap.saturating_sub(SPLIT_HEADROOM);
        let mut pieces = Vec::new();
        let mut current = Self::new();
        for triangle in self.triangles.chunks_exact(3) {
            if current.vertex_count() > threshold {
                pieces.push(std::mem::take(&mut current));
            }
            current.push_triangle(
                self.vertices[triangle[0] as usize],
                self.vertices[triangle[1] as usize],
                self.vertices[triangle[2] as usize],
            );
        }
        if !current.is_empty() {
            pieces.push(current);
        }
        Ok(pieces)
    }

    /// Write an `.imf` file: `int32` vertex count, vertices, `int32` index
    /// count, indices.
    pub fn write(&self, path: &Path) -> Result<(), MeshError> {
        check_extension(path, MESH_EXTENSION)?;
        if self.is_empty() {
            return Err(MeshError::EmptyMesh);
        }
        let vertex_count = to_i32(self.vertices.len(), "vertex count")?;
        let index_count = to_i32(self.triangles.len(), "triangle index count")?;

        write_atomic(path, |w| {
            w.write_i32::<LittleEndian>(vertex_count)?;
            for vertex in &self.vertices {
                vertex.write_to(w)?;
            }
            w.write_i32::<LittleEndian>(index_count)?;
            for &index in &self.triangles {
                w.write_i32::<LittleEndian>(index as i32)?;
            }
            Ok(())
        })?;
        Ok(())
    }

    /// Read an `.imf` file.
    pub fn read(path: &Path) -> Result<Self, MeshError> {
        check_extension(path, MESH_EXTENSION)?;
        Self::from_bytes(&fs::read(path)?)
    }

    /// Parse the `.imf` layout from memory, validating counts and indices.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, MeshError> {
        let mut cursor = bytes;

        let vertex_count = take_count(&mut cursor, "vertex count")?;
        let vertex_bytes = vertex_count
            .checked_mul(POINT_SIZE as usize)
            .filter(|&n| n <= cursor.len())
            .ok_or_else(|| {
                MeshError::Truncated(format!("{vertex_count} vertices declared"))
            })?;
        let (vertex_data, rest) = cursor.split_at(vertex_bytes);
        let vertices: Vec<Point> = vertex_data
            .chunks_exact(POINT_SIZE as usize)
            .map(|chunk| {
                Point::new(
                    LittleEndian::read_f32(&chunk[0..4]),
                    LittleEndian::read_f32(&chunk[4..8]),
                    LittleEndian::read_f32(&chunk[8..12]),
                )
            })
            .collect();
        cursor = rest;

        let index_count = take_count(&mut cursor, "triangle index count")?;
        let index_bytes = index_count
            .checked_mul(4)
            .filter(|&n| n <= cursor.len())
            .ok_or_else(|| {
                MeshError::Truncated(format!("{index_count} triangle indices declared"))
            })?;

        let mut triangles = Vec::with_capacity(index_count);
        for chunk in cursor[..index_bytes].chunks_exact(4) {
            let index = LittleEndian::read_i32(chunk);
            let index = u32::try_from(index).map_err(|_| MeshError::IndexOutOfRange {
                index: i64::from(index),
                vertices: vertices.len(),
            })?;
            triangles.push(index);
        }

        Self::from_parts(vertices, triangles)
    }
}

fn take_count(cursor: &mut &[u8], what: &str) -> Result<usize, MeshError> {
    if cursor.len() < 4 {
        return Err(MeshError::Truncated(format!("missing {what}")));
    }
    let (head, rest) = cursor.split_at(4);
    let count = LittleEndian::read_i32(head);
    *cursor = rest;
    usize::try_from(count)
        .map_err(|_| MeshError::Truncated(format!("negative {what} {count}")))
}
