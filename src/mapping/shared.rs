//! Thread-safe handle to a mapper.
//!
//! The lock is held for the whole per-scan pipeline, so scans fed from
//! several threads are processed one at a time and a scan never observes a
//! half-grown map.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::cloud::{PointCloud, Scan};
use crate::error::Result;
use crate::geometry::Pose6DOF;
use crate::publish::{MapObserver, NullObserver};

use super::{OctreeMapper, ScanOutcome};

/// Cloneable, shareable wrapper around an [`OctreeMapper`].
#[derive(Debug)]
pub struct SharedMapper<O = NullObserver> {
    inner: Arc<Mutex<OctreeMapper<O>>>,
}

impl<O> Clone for SharedMapper<O> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<O: MapObserver> SharedMapper<O> {
    pub fn new(mapper: OctreeMapper<O>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(mapper)),
        }
    }

    /// Run the full pipeline for one scan under the lock.
    pub fn refine_transform_and_grow_map(&self, scan: &Scan, raw_pose: &Pose6DOF) -> ScanOutcome {
        self.inner.lock().refine_transform_and_grow_map(scan, raw_pose)
    }

    pub fn reset_map(&self, resolution: f64) -> Result<()> {
        self.inner.lock().reset_map(resolution)
    }

    /// Copy of the current map cloud.
    pub fn map_snapshot(&self) -> PointCloud {
        self.inner.lock().map().cloud().clone()
    }

    /// Copy of the refined path.
    pub fn trajectory_snapshot(&self) -> Vec<Pose6DOF> {
        self.inner.lock().trajectory().poses().to_vec()
    }

    /// Run `f` with exclusive access to the mapper.
    pub fn with_mapper<R>(&self, f: impl FnOnce(&mut OctreeMapper<O>) -> R) -> R {
        f(&mut self.inner.lock())
    }
}
