//! What happened to a single scan.

use crate::error::MapperError;
use crate::geometry::Pose6DOF;

use super::MappingState;

/// Outcome of [`super::OctreeMapper::refine_transform_and_grow_map`].
#[derive(Debug, Clone, PartialEq)]
pub enum ScanOutcome {
    /// The map was empty and has been seeded with the scan at its raw pose.
    Bootstrapped { points_added: usize },
    /// The scan was registered, placed with the refined pose and merged.
    Refined {
        /// Refined robot pose in the map frame (raw pose + correction).
        pose: Pose6DOF,
        /// Correction found by registration.
        correction: Pose6DOF,
        points_added: usize,
        iterations: u32,
        fitness: f64,
    },
    /// Nothing was changed; the caller keeps the raw pose.
    Rejected {
        /// Stage at which processing stopped.
        state_reached: MappingState,
        error: MapperError,
    },
}

impl ScanOutcome {
    /// True iff the raw pose was refined by registration.
    pub fn is_refined(&self) -> bool {
        matches!(self, ScanOutcome::Refined { .. })
    }

    pub fn refined_pose(&self) -> Option<&Pose6DOF> {
        match self {
            ScanOutcome::Refined { pose, .. } => Some(pose),
            _ => None,
        }
    }

    pub fn points_added(&self) -> usize {
        match self {
            ScanOutcome::Bootstrapped { points_added }
            | ScanOutcome::Refined { points_added, .. } => *points_added,
            ScanOutcome::Rejected { .. } => 0,
        }
    }
}
