//! The spatial index contract used by the map.

use nalgebra::Point3;

use crate::cloud::PointCloud;
use crate::error::Result;

/// Voxelized index over a growing point cloud.
///
/// Implementations must keep at most one indexed point per voxel of edge
/// [`SpatialIndex::resolution`]. Indices returned by
/// [`SpatialIndex::approx_nearest_neighbor`] refer to the cloud passed to
/// [`SpatialIndex::insert_if_unoccupied`].
pub trait SpatialIndex {
    /// Discard every indexed point and rebuild with a new resolution.
    ///
    /// On an invalid resolution the index is left untouched.
    fn reset(&mut self, resolution: f64) -> Result<()>;

    /// Voxel edge length.
    fn resolution(&self) -> f64;

    /// Number of occupied voxels.
    fn occupied_voxels(&self) -> usize;

    /// True iff some inserted point shares the voxel of `point`.
    fn is_occupied(&self, point: &Point3<f64>) -> bool;

    /// Append `point` to `cloud` and index it, unless its voxel is taken.
    ///
    /// Returns whether the point was inserted.
    fn insert_if_unoccupied(&mut self, point: Point3<f64>, cloud: &mut PointCloud) -> bool;

    /// Index of an approximately nearest inserted point, `None` when empty.
    fn approx_nearest_neighbor(&self, point: &Point3<f64>) -> Option<usize>;
}
