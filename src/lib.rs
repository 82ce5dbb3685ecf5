//! Scan-to-map LiDAR mapping core.
//!
//! Each scan arrives with a raw pose. The first scan seeds a voxel-limited
//! point map; every later scan is registered against its neighborhood in the
//! map, its pose is refined, and the map grows with the newly covered voxels.

pub mod cloud;
pub mod config;
pub mod error;
pub mod geometry;
pub mod io;
pub mod map;
pub mod mapping;
pub mod publish;
pub mod registration;

pub use error::{MapperError, Result};
