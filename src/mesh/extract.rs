//! Isosurface extraction seam and the built-in face extractor.

use crate::point::Point;
use crate::voxel::ScalarField;

use super::builder::IntermediateMesh;
use super::error::MeshError;

/// Turns a dense `[0, 1]` field and an iso-level into triangles.
///
/// Implementations must return a mesh whose triangle indices are valid for
/// its vertex list. Vertices are in grid units: bin `(i, j, k)` is centred on
/// `(i, j, k)`.
pub trait IsosurfaceExtractor: Send + Sync {
    /// Extract the surface of `field` at `iso_level`.
    fn extract(&self, field: &ScalarField, iso_level: f32) -> Result<IntermediateMesh, MeshError>;
}

/// Emits the boundary faces of the bins above the iso-level.
///
/// A bin is inside when its value is strictly greater than the iso-level.
/// Each inside bin contributes a unit square (two triangles, counter-clockwise
/// seen from outside) toward every neighbour that is outside or off the grid.
/// The output is a triangle soup; weld it with
/// [`IntermediateMesh::make_unique`].
#[derive(Debug, Clone, Copy, Default)]
pub struct CuberilleExtractor;

const H: f32 = 0.5;

/// Neighbour offset and the face's corners in counter-clockwise order.
const FACES: [([i64; 3], [[f32; 3]; 4]); 6] = [
    ([1, 0, 0], [[H, -H, -H], [H, H, -H], [H, H, H], [H, -H, H]]),
    ([-1, 0, 0], [[-H, -H, -H], [-H, -H, H], [-H, H, H], [-H, H, -H]]),
    ([0, 1, 0], [[-H, H, -H], [-H, H, H], [H, H, H], [H, H, -H]]),
    ([0, -1, 0], [[-H, -H, -H], [H, -H, -H], [H, -H, H], [-H, -H, H]]),
    ([0, 0, 1], [[-H, -H, H], [H, -H, H], [H, H, H], [-H, H, H]]),
    ([0, 0, -1], [[-H, -H, -H], [-H, H, -H], [H, H, -H], [H, -H, -H]]),
];

impl CuberilleExtractor {
    fn is_inside(field: &ScalarField, index: [i64; 3], iso_level: f32) -> bool {
        let [nx, ny, nz] = field.dims();
        let in_grid = index[0] >= 0
            && index[1] >= 0
            && index[2] >= 0
            && (index[0] as usize) < nx
            && (index[1] as usize) < ny
            && (index[2] as usize) < nz;
        in_grid
            && field
                .get(index[0] as usize, index[1] as usize, index[2] as usize)
                .map_or(false, |value| value > iso_level)
    }
}

impl IsosurfaceExtractor for CuberilleExtractor {
    fn extract(&self, field: &ScalarField, iso_level: f32) -> Result<IntermediateMesh, MeshError> {
        let [nx, ny, nz] = field.dims();
        let mut mesh = IntermediateMesh::new();

        for i in 0..nx {
            for j in 0..ny {
                for k in 0..nz {
                    let cell = [i as i64, j as i64, k as i64];
                    if !Self::is_inside(field, cell, iso_level) {
                        continue;
                    }
                    let centre = [i as f32, j as f32, k as f32];
                    for (offset, corners) in &FACES {
                        let neighbour = [cell[0] + offset[0], cell[1] + offset[1], cell[2] + offset[2]];
                        if Self::is_inside(field, neighbour, iso_level) {
                            continue;
                        }
                        let [a, b, c, d] = corners.map(|corner| {
                            Point::new(
                                centre[0] + corner[0],
                                centre[1] + corner[1],
                                centre[2] + corner[2],
                            )
                        });
                        mesh.push_triangle(a, b, c);
                        mesh.push_triangle(a, c, d);
                    }
                }
            }
        }
        Ok(mesh)
    }
}
