//! Three-component float point shared by the voxel and mesh layers.

use std::hash::{Hash, Hasher};
use std::io::{self, Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use serde::{Deserialize, Serialize};

/// A point in 3-D space.
///
/// Equality is exact: two points are equal when their components have the
/// same bit patterns, with `-0.0` folded into `0.0`. No tolerance is applied,
/// so values that differ in the last ulp stay distinct.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Point {
    /// X component
    pub x: f32,
    /// Y component
    pub y: f32,
    /// Z component
    pub z: f32,
}

/// Size of a serialized point in bytes.
pub const POINT_SIZE: u64 = 12;

impl Point {
    /// Create a point from its components.
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    fn key(&self) -> [u32; 3] {
        [canonical_bits(self.x), canonical_bits(self.y), canonical_bits(self.z)]
    }

    /// Read one point (3 × `float32`).
    pub fn read_from<R: Read + ?Sized>(reader: &mut R) -> io::Result<Self> {
        let x = reader.read_f32::<LittleEndian>()?;
        let y = reader.read_f32::<LittleEndian>()?;
        let z = reader.read_f32::<LittleEndian>()?;
        Ok(Self { x, y, z })
    }

    /// Write one point (3 × `float32`).
    pub fn write_to<W: Write + ?Sized>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_f32::<LittleEndian>(self.x)?;
        writer.write_f32::<LittleEndian>(self.y)?;
        writer.write_f32::<LittleEndian>(self.z)
    }
}

#[inline]
fn canonical_bits(value: f32) -> u32 {
    if value == 0.0 {
        0
    } else {
        value.to_bits()
    }
}

impl PartialEq for Point {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Point {}

impl Hash for Point {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl From<[f32; 3]> for Point {
    fn from([x, y, z]: [f32; 3]) -> Self {
        Self { x, y, z }
    }
}
