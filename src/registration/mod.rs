//! Registration module - aligns a scan with its map neighborhood.
//!
//! This module contains:
//! - [`GeneralizedIcp`] - the iterative engine (generalized or point-to-point cost)
//! - [`RegistrationConfig`] - tunables, loadable from YAML
//! - [`NeighborGrid`] - exact voxel-grid neighbor search used for pairing
//!
//! Registration is pure: it reads two clouds and returns a correction or an
//! error, and never touches the map.

pub mod config;
pub mod covariance;
pub mod gicp;
pub mod neighbors;
pub mod rigid;
pub mod sample_consensus;

pub use config::{RegistrationConfig, RegistrationMethod};
pub use gicp::GeneralizedIcp;
pub use neighbors::NeighborGrid;

use crate::geometry::Pose6DOF;

/// A source/target point pairing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Correspondence {
    pub source: usize,
    pub target: usize,
    pub distance_sq: f64,
}

/// Outcome of a converged registration.
#[derive(Debug, Clone, PartialEq)]
pub struct RegistrationResult {
    /// Correction mapping source points onto the target, stamped with the
    /// time of the registered scan.
    pub transform: Pose6DOF,
    /// Rounds used.
    pub iterations: u32,
    /// Mean squared distance of the final pairs.
    pub fitness: f64,
    /// Number of pairs in the final round.
    pub correspondences: usize,
}
