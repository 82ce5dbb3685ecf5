//! Sparse hashed octree over voxel keys.
//!
//! Leaves live at level 0 and hold the index of the single point that claimed
//! the voxel. Every level above stores an 8-bit occupancy mask per cell, so a
//! nearest-neighbor descent only ever visits occupied branches:
//!
//! ```text
//! level depth   roots (BTreeSet, deterministic order)
//!    ...        mask: which of the 8 children exist
//! level 1       mask
//! level 0       leaf -> point index
//! ```
//!
//! The approximate search picks the root nearest the query, then repeatedly
//! descends into the occupied child whose center is nearest. Because the cells
//! of a regular grid are exactly the Voronoi regions of their centers, the
//! descent follows the query's own branch whenever that branch is occupied.

use std::collections::{BTreeSet, HashMap};

use nalgebra::Point3;

use crate::cloud::PointCloud;
use crate::error::Result;

use super::spatial_index::SpatialIndex;
use super::types::{VoxelKey, validate_resolution};

/// Number of levels above the leaves. At 0.5 m resolution a root cell spans
/// 32.768 km per side.
pub const DEFAULT_OCTREE_DEPTH: u32 = 16;

/// Octree spatial index.
#[derive(Debug, Clone)]
pub struct OctreeIndex {
    resolution: f64,
    depth: u32,
    /// Leaf voxel -> index of its representative point in the bound cloud.
    leaves: HashMap<VoxelKey, usize>,
    /// `branches[l - 1]` holds the child masks of the cells at level `l`.
    branches: Vec<HashMap<VoxelKey, u8>>,
    /// Occupied cells at level `depth`.
    roots: BTreeSet<VoxelKey>,
}

impl OctreeIndex {
    /// Create an empty index with the default depth.
    pub fn new(resolution: f64) -> Result<Self> {
        Self::with_depth(resolution, DEFAULT_OCTREE_DEPTH)
    }

    /// Create an empty index with `depth` branch levels (at least one).
    pub fn with_depth(resolution: f64, depth: u32) -> Result<Self> {
        validate_resolution(resolution)?;
        let depth = depth.clamp(1, 32);
        Ok(Self {
            resolution,
            depth,
            leaves: HashMap::new(),
            branches: vec![HashMap::new(); depth as usize],
            roots: BTreeSet::new(),
        })
    }

    pub fn is_empty(&self) -> bool {
        self.leaves.is_empty()
    }

    fn nearest_root(&self, query: &Point3<f64>) -> Option<VoxelKey> {
        self.roots
            .iter()
            .map(|key| {
                let d = (key.center(self.resolution, self.depth) - query).norm_squared();
                (d, *key)
            })
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(_, key)| key)
    }

    fn nearest_child(&self, cell: &VoxelKey, level: u32, query: &Point3<f64>) -> Option<VoxelKey> {
        let mask = *self.branches[(level - 1) as usize].get(cell)?;

        let mut best: Option<(f64, VoxelKey)> = None;
        for slot in 0..8u8 {
            if mask & (1 << slot) == 0 {
                continue;
            }
            let child = cell.child(slot);
            let d = (child.center(self.resolution, level - 1) - query).norm_squared();
            if best.is_none_or(|(best_d, _)| d < best_d) {
                best = Some((d, child));
            }
        }
        best.map(|(_, key)| key)
    }
}

impl SpatialIndex for OctreeIndex {
    fn reset(&mut self, resolution: f64) -> Result<()> {
        validate_resolution(resolution)?;
        self.resolution = resolution;
        self.leaves.clear();
        for level in &mut self.branches {
            level.clear();
        }
        self.roots.clear();
        Ok(())
    }

    fn resolution(&self) -> f64 {
        self.resolution
    }

    fn occupied_voxels(&self) -> usize {
        self.leaves.len()
    }

    fn is_occupied(&self, point: &Point3<f64>) -> bool {
        VoxelKey::from_point(point, self.resolution)
            .is_some_and(|key| self.leaves.contains_key(&key))
    }

    fn insert_if_unoccupied(&mut self, point: Point3<f64>, cloud: &mut PointCloud) -> bool {
        let Some(key) = VoxelKey::from_point(&point, self.resolution) else {
            return false;
        };
        if self.leaves.contains_key(&key) {
            return false;
        }

        self.leaves.insert(key, cloud.len());
        cloud.push(point);

        let mut child = key;
        for level in 1..=self.depth {
            let parent = child.ancestor(1);
            *self.branches[(level - 1) as usize].entry(parent).or_insert(0) |=
                1 << child.child_slot();
            child = parent;
        }
        self.roots.insert(child);
        true
    }

    fn approx_nearest_neighbor(&self, point: &Point3<f64>) -> Option<usize> {
        if self.leaves.is_empty() || !point.coords.iter().all(|v| v.is_finite()) {
            return None;
        }

        let mut cell = self.nearest_root(point)?;
        for level in (1..=self.depth).rev() {
            cell = self.nearest_child(&cell, level, point)?;
        }
        self.leaves.get(&cell).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn random_points(n: usize, extent: f64, seed: u64) -> Vec<Point3<f64>> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..n)
            .map(|_| {
                Point3::new(
                    rng.gen_range(-extent..extent),
                    rng.gen_range(-extent..extent),
                    rng.gen_range(-extent..extent),
                )
            })
            .collect()
    }

    /// Conformance check for any index: one point per voxel, and re-inserting
    /// the accepted points changes nothing.
    fn assert_density_invariant<I: SpatialIndex>(mut index: I, points: &[Point3<f64>]) {
        let mut cloud = PointCloud::new();
        for p in points {
            index.insert_if_unoccupied(*p, &mut cloud);
        }

        let keys: HashSet<VoxelKey> = cloud
            .iter()
            .map(|p| VoxelKey::from_point(p, index.resolution()).unwrap())
            .collect();
        assert_eq!(keys.len(), cloud.len());
        assert_eq!(index.occupied_voxels(), cloud.len());

        let snapshot = cloud.clone();
        for p in snapshot.iter() {
            assert!(!index.insert_if_unoccupied(*p, &mut cloud));
        }
        assert_eq!(cloud, snapshot);
    }

    #[test]
    fn test_density_invariant_across_resolutions() {
        let points = random_points(2000, 5.0, 7);
        for resolution in [0.1, 0.5, 1.0, 3.0] {
            assert_density_invariant(OctreeIndex::new(resolution).unwrap(), &points);
            assert_density_invariant(OctreeIndex::with_depth(resolution, 1).unwrap(), &points);
        }
    }

    #[test]
    fn test_same_voxel_first_wins() {
        let mut index = OctreeIndex::new(0.5).unwrap();
        let mut cloud = PointCloud::new();

        assert!(index.insert_if_unoccupied(Point3::new(0.0, 0.0, 0.0), &mut cloud));
        assert!(!index.insert_if_unoccupied(Point3::new(0.05, 0.0, 0.0), &mut cloud));
        assert_eq!(cloud.points(), &[Point3::new(0.0, 0.0, 0.0)]);

        assert!(!index.insert_if_unoccupied(Point3::new(0.0, 0.0, 0.0), &mut cloud));
        assert!(index.insert_if_unoccupied(Point3::new(10.0, 0.0, 0.0), &mut cloud));
        assert_eq!(cloud.len(), 2);
    }

    #[test]
    fn test_is_occupied_is_idempotent() {
        let mut index = OctreeIndex::new(0.5).unwrap();
        let mut cloud = PointCloud::new();
        index.insert_if_unoccupied(Point3::new(1.2, -0.3, 4.0), &mut cloud);

        let query = Point3::new(1.4, -0.1, 4.4);
        let first = index.is_occupied(&query);
        assert_eq!(index.is_occupied(&query), first);
        assert!(first);
        assert!(!index.is_occupied(&Point3::new(1.6, -0.1, 4.4)));
    }

    #[test]
    fn test_non_finite_points_are_rejected() {
        let mut index = OctreeIndex::new(0.5).unwrap();
        let mut cloud = PointCloud::new();

        assert!(!index.insert_if_unoccupied(Point3::new(f64::NAN, 0.0, 0.0), &mut cloud));
        assert!(cloud.is_empty());
        assert!(!index.is_occupied(&Point3::new(f64::NAN, 0.0, 0.0)));
        assert_eq!(index.approx_nearest_neighbor(&Point3::origin()), None);
    }

    #[test]
    fn test_points_beyond_key_range_are_rejected() {
        let mut index = OctreeIndex::new(0.1).unwrap();
        let mut cloud = PointCloud::new();
        assert!(index.insert_if_unoccupied(Point3::new(1.0, 0.0, 0.0), &mut cloud));

        assert!(!index.insert_if_unoccupied(Point3::new(1e20, 0.0, 0.0), &mut cloud));
        assert!(!index.is_occupied(&Point3::new(1e20, 0.0, 0.0)));
        assert!(!index.is_occupied(&Point3::new(3e20, 0.0, 0.0)));
        assert!(!index.insert_if_unoccupied(Point3::new(-5e19, 2e19, 0.0), &mut cloud));

        assert_eq!(cloud.points(), &[Point3::new(1.0, 0.0, 0.0)]);
        assert_eq!(index.occupied_voxels(), 1);
        assert_eq!(index.approx_nearest_neighbor(&Point3::new(1e20, 0.0, 0.0)), Some(0));
    }

    #[test]
    fn test_empty_index_has_no_neighbor() {
        let index = OctreeIndex::new(0.5).unwrap();
        assert_eq!(index.approx_nearest_neighbor(&Point3::new(1.0, 2.0, 3.0)), None);
    }

    #[test]
    fn test_neighbor_in_same_voxel_is_found() {
        let points = random_points(500, 20.0, 3);
        let mut index = OctreeIndex::new(0.5).unwrap();
        let mut cloud = PointCloud::new();
        for p in &points {
            index.insert_if_unoccupied(*p, &mut cloud);
        }

        for (i, p) in cloud.iter().enumerate() {
            // Any query inside the same leaf voxel must return that leaf's point.
            let key = VoxelKey::from_point(p, 0.5).unwrap();
            let query = key.center(0.5, 0);
            assert_eq!(index.approx_nearest_neighbor(&query), Some(i));
        }
    }

    #[test]
    fn test_neighbor_always_found_when_non_empty() {
        let mut index = OctreeIndex::new(0.5).unwrap();
        let mut cloud = PointCloud::new();
        index.insert_if_unoccupied(Point3::new(100.0, -50.0, 3.0), &mut cloud);
        index.insert_if_unoccupied(Point3::new(-20000.0, 0.0, 0.0), &mut cloud);

        assert_eq!(index.approx_nearest_neighbor(&Point3::new(99.0, -49.0, 3.0)), Some(0));
        assert_eq!(index.approx_nearest_neighbor(&Point3::new(-19990.0, 1.0, 0.0)), Some(1));
        assert!(index.approx_nearest_neighbor(&Point3::new(1e6, 1e6, 1e6)).is_some());
    }

    #[test]
    fn test_neighbor_query_is_deterministic() {
        let points = random_points(300, 10.0, 11);
        let mut index = OctreeIndex::new(0.5).unwrap();
        let mut cloud = PointCloud::new();
        for p in &points {
            index.insert_if_unoccupied(*p, &mut cloud);
        }

        for q in random_points(100, 12.0, 12) {
            assert_eq!(index.approx_nearest_neighbor(&q), index.approx_nearest_neighbor(&q));
        }
    }

    #[test]
    fn test_reset_with_invalid_resolution_keeps_state() {
        let mut index = OctreeIndex::new(0.5).unwrap();
        let mut cloud = PointCloud::new();
        index.insert_if_unoccupied(Point3::new(1.0, 1.0, 1.0), &mut cloud);

        assert!(index.reset(0.0).is_err());
        assert_eq!(index.resolution(), 0.5);
        assert!(index.is_occupied(&Point3::new(1.0, 1.0, 1.0)));

        index.reset(0.25).unwrap();
        assert_eq!(index.resolution(), 0.25);
        assert_eq!(index.occupied_voxels(), 0);
        assert_eq!(index.approx_nearest_neighbor(&Point3::new(1.0, 1.0, 1.0)), None);
    }
}
