//! PointMap: the map cloud and the spatial index bound to it.
//!
//! The cloud is private; the only way to add points is
//! [`PointMap::insert_if_unoccupied`] (or [`PointMap::grow`], which calls it
//! for each point), so the one-point-per-voxel invariant holds by construction.

use nalgebra::Point3;

use crate::cloud::PointCloud;
use crate::error::{MapperError, Result};

use super::octree::OctreeIndex;
use super::spatial_index::SpatialIndex;

/// Persistent, append-only map with voxel-limited density.
#[derive(Debug, Clone)]
pub struct PointMap<I = OctreeIndex> {
    cloud: PointCloud,
    index: I,
}

impl PointMap<OctreeIndex> {
    /// Create an empty map backed by an octree with the given resolution.
    pub fn new(resolution: f64) -> Result<Self> {
        Ok(Self {
            cloud: PointCloud::new(),
            index: OctreeIndex::new(resolution)?,
        })
    }
}

impl<I: SpatialIndex> PointMap<I> {
    /// Wrap an index; the index is reset so it starts consistent with the
    /// empty cloud.
    pub fn with_index(mut index: I) -> Result<Self> {
        let resolution = index.resolution();
        index.reset(resolution)?;
        Ok(Self {
            cloud: PointCloud::new(),
            index,
        })
    }

    /// Discard all points and rebuild the index with `resolution`.
    ///
    /// An invalid resolution fails with `InvalidConfig` and leaves the map as it was.
    pub fn reset(&mut self, resolution: f64) -> Result<()> {
        self.index.reset(resolution)?;
        self.cloud.clear();
        Ok(())
    }

    pub fn resolution(&self) -> f64 {
        self.index.resolution()
    }

    pub fn len(&self) -> usize {
        self.cloud.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cloud.is_empty()
    }

    /// Read-only view of every accepted point, in insertion order.
    pub fn cloud(&self) -> &PointCloud {
        &self.cloud
    }

    pub fn is_occupied(&self, point: &Point3<f64>) -> bool {
        self.index.is_occupied(point)
    }

    pub fn insert_if_unoccupied(&mut self, point: Point3<f64>) -> bool {
        self.index.insert_if_unoccupied(point, &mut self.cloud)
    }

    /// Greedy voxel subsampling: insert each point of a map-frame cloud whose
    /// voxel is still free. Returns the number of accepted points.
    pub fn grow(&mut self, cloud: &PointCloud) -> usize {
        cloud
            .iter()
            .filter(|p| self.index.insert_if_unoccupied(**p, &mut self.cloud))
            .count()
    }

    /// For every query point, the approximately nearest map point.
    ///
    /// The result follows query order, may repeat map points and omits queries
    /// without a neighbor.
    pub fn approx_nearest_neighbors(&self, query: &PointCloud) -> Result<PointCloud> {
        if self.cloud.is_empty() {
            return Err(MapperError::EmptyMap);
        }

        let neighbors: PointCloud = query
            .iter()
            .filter_map(|p| self.index.approx_nearest_neighbor(p))
            .filter_map(|idx| self.cloud.get(idx).copied())
            .collect();

        if neighbors.is_empty() {
            return Err(MapperError::NoNeighborsFound);
        }
        Ok(neighbors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cloud(points: &[(f64, f64, f64)]) -> PointCloud {
        points.iter().map(|&(x, y, z)| Point3::new(x, y, z)).collect()
    }

    #[test]
    fn test_two_scan_dedup_scenario() {
        let mut map = PointMap::new(0.5).unwrap();

        map.grow(&cloud(&[(0.0, 0.0, 0.0), (0.05, 0.0, 0.0)]));
        assert_eq!(map.len(), 1);

        map.grow(&cloud(&[(0.0, 0.0, 0.0), (10.0, 0.0, 0.0)]));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_regrowing_with_own_cloud_changes_nothing() {
        let mut map = PointMap::new(0.3).unwrap();
        let scan: PointCloud = (0..200)
            .map(|i| {
                let t = i as f64 * 0.07;
                Point3::new(t.cos() * 4.0, t.sin() * 4.0, t * 0.1)
            })
            .collect();
        map.grow(&scan);

        let before = map.cloud().clone();
        assert_eq!(map.grow(&before), 0);
        assert_eq!(map.cloud(), &before);
    }

    #[test]
    fn test_growth_is_monotonic() {
        let mut map = PointMap::new(1.0).unwrap();
        let mut last = 0;
        for shift in 0..5 {
            let s = shift as f64 * 0.6;
            let added = map.grow(&cloud(&[(s, 0.0, 0.0), (s, 2.0, 0.0), (s, 4.0, 0.0)]));
            assert_eq!(map.len(), last + added);
            assert!(map.len() >= last);
            last = map.len();
        }
    }

    #[test]
    fn test_neighbors_on_empty_map() {
        let map = PointMap::new(0.5).unwrap();
        let err = map.approx_nearest_neighbors(&cloud(&[(0.0, 0.0, 0.0)])).unwrap_err();
        assert_eq!(err, MapperError::EmptyMap);
    }

    #[test]
    fn test_neighbors_follow_query_order_and_repeat() {
        let mut map = PointMap::new(0.5).unwrap();
        map.grow(&cloud(&[(0.1, 0.1, 0.1), (5.1, 0.1, 0.1)]));

        let neighbors = map
            .approx_nearest_neighbors(&cloud(&[(5.2, 0.2, 0.2), (0.2, 0.2, 0.2), (0.3, 0.1, 0.1)]))
            .unwrap();

        assert_eq!(
            neighbors.points(),
            &[
                Point3::new(5.1, 0.1, 0.1),
                Point3::new(0.1, 0.1, 0.1),
                Point3::new(0.1, 0.1, 0.1)
            ]
        );
    }

    #[test]
    fn test_neighbors_of_unusable_query() {
        let mut map = PointMap::new(0.5).unwrap();
        map.grow(&cloud(&[(0.0, 0.0, 0.0)]));

        let err = map
            .approx_nearest_neighbors(&cloud(&[(f64::NAN, 0.0, 0.0)]))
            .unwrap_err();
        assert_eq!(err, MapperError::NoNeighborsFound);
    }

    #[test]
    fn test_reset_discards_points() {
        let mut map = PointMap::new(0.5).unwrap();
        map.grow(&cloud(&[(0.0, 0.0, 0.0), (3.0, 0.0, 0.0)]));

        assert!(map.reset(-0.5).is_err());
        assert_eq!(map.len(), 2);

        map.reset(1.0).unwrap();
        assert!(map.is_empty());
        assert_eq!(map.resolution(), 1.0);
        assert!(!map.is_occupied(&Point3::new(0.0, 0.0, 0.0)));
    }

    #[test]
    fn test_with_index_starts_empty() {
        let map = PointMap::with_index(OctreeIndex::with_depth(0.5, 4).unwrap()).unwrap();
        assert!(map.is_empty());
        assert_eq!(map.resolution(), 0.5);
    }
}
