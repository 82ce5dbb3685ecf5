//! Map module - persistent point map and its spatial index.
//!
//! This module contains:
//! - [`SpatialIndex`] - the voxel index contract (occupancy + approximate NN)
//! - [`OctreeIndex`] - sparse hashed octree implementing it
//! - [`PointMap`] - the map cloud bound to an index; the only mutation path
//!
//! # Example
//!
//! ```ignore
//! use rust_lidar_mapper::map::PointMap;
//!
//! let mut map = PointMap::new(0.5)?;
//! let accepted = map.grow(&scan_in_map);
//! let local = map.approx_nearest_neighbors(&scan_in_map)?;
//! ```

pub mod octree;
pub mod point_map;
pub mod spatial_index;
pub mod types;

pub use octree::{DEFAULT_OCTREE_DEPTH, OctreeIndex};
pub use point_map::PointMap;
pub use spatial_index::SpatialIndex;
pub use types::{MAX_VOXEL_COORD, VoxelKey};
