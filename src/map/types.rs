//! Voxel keys shared by the spatial index implementations.

use nalgebra::Point3;

use crate::error::{MapperError, Result};

/// Largest voxel coordinate magnitude a key may hold (2^52).
///
/// Below it every scaled coordinate floors to a distinct integer and key
/// arithmetic stays far from `i64` overflow.
pub const MAX_VOXEL_COORD: f64 = 4_503_599_627_370_496.0;

/// Integer coordinates of a voxel cell.
///
/// At level 0 a key addresses a cell of edge `resolution`; the ancestor at
/// level `l` addresses the cell of edge `resolution * 2^l` containing it.
/// Arithmetic shifts keep negative coordinates consistent with `floor`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VoxelKey {
    pub x: i64,
    pub y: i64,
    pub z: i64,
}

impl VoxelKey {
    pub fn new(x: i64, y: i64, z: i64) -> Self {
        Self { x, y, z }
    }

    /// Leaf key of the voxel containing `point`.
    ///
    /// `None` for non-finite points and for points more than
    /// [`MAX_VOXEL_COORD`] cells from the origin on any axis.
    pub fn from_point(point: &Point3<f64>, resolution: f64) -> Option<Self> {
        let scaled = point.coords / resolution;
        if !scaled.iter().all(|v| v.is_finite() && v.abs() < MAX_VOXEL_COORD) {
            return None;
        }
        Some(Self {
            x: scaled.x.floor() as i64,
            y: scaled.y.floor() as i64,
            z: scaled.z.floor() as i64,
        })
    }

    /// Key of the enclosing cell `levels` levels up.
    pub fn ancestor(&self, levels: u32) -> Self {
        Self {
            x: self.x >> levels,
            y: self.y >> levels,
            z: self.z >> levels,
        }
    }

    /// Position of this cell inside its parent (0..8).
    pub fn child_slot(&self) -> u8 {
        ((self.x & 1) | ((self.y & 1) << 1) | ((self.z & 1) << 2)) as u8
    }

    /// Key of the child occupying `slot` inside this cell.
    pub fn child(&self, slot: u8) -> Self {
        let slot = slot as i64;
        Self {
            x: (self.x << 1) | (slot & 1),
            y: (self.y << 1) | ((slot >> 1) & 1),
            z: (self.z << 1) | ((slot >> 2) & 1),
        }
    }

    /// Center of this cell when interpreted at `level`.
    pub fn center(&self, resolution: f64, level: u32) -> Point3<f64> {
        let edge = resolution * (1u64 << level) as f64;
        Point3::new(
            (self.x as f64 + 0.5) * edge,
            (self.y as f64 + 0.5) * edge,
            (self.z as f64 + 0.5) * edge,
        )
    }
}

impl std::fmt::Display for VoxelKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "V({}, {}, {})", self.x, self.y, self.z)
    }
}

/// Check that a voxel resolution is usable.
pub fn validate_resolution(resolution: f64) -> Result<()> {
    if resolution.is_finite() && resolution > 0.0 {
        Ok(())
    } else {
        Err(MapperError::InvalidConfig(format!(
            "voxel resolution must be finite and > 0, got {}",
            resolution
        )))
    }
}
