//! Registration tunables.

use serde::{Deserialize, Serialize};

use crate::error::{MapperError, Result};

/// Cost minimized by the registration engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationMethod {
    /// Plane-to-plane cost with per-point covariances.
    #[default]
    Generalized,
    /// Classic point-to-point cost, solved in closed form.
    PointToPoint,
}

/// Configuration for scan-to-map registration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistrationConfig {
    pub method: RegistrationMethod,

    /// Maximum number of correspondence/solve rounds.
    pub max_iterations: u32,

    /// Converged once an increment moves less than this
    /// (max of rotation angle in rad and translation in m).
    pub transformation_epsilon: f64,

    /// When the iteration cap is hit, the result is still accepted if the
    /// last increment was below this.
    pub cutoff_epsilon: f64,

    /// Pairs farther apart than this are not correspondences (meters).
    pub max_correspondence_distance: f64,

    /// RANSAC rounds used to reject outlier pairs; 0 disables rejection.
    pub ransac_iterations: u32,

    /// Inlier distance for RANSAC (meters).
    pub ransac_outlier_rejection_threshold: f64,

    /// Seed for the RANSAC sampler, so runs are repeatable.
    pub ransac_seed: u64,

    /// Neighbors used to estimate each point's covariance.
    pub covariance_neighbors: usize,

    /// Eigenvalue given to the surface normal direction of each covariance.
    pub covariance_epsilon: f64,

    /// Fewer pairs than this fails the round.
    pub min_correspondences: usize,
}

impl Default for RegistrationConfig {
    fn default() -> Self {
        Self {
            method: RegistrationMethod::Generalized,
            max_iterations: 30,
            transformation_epsilon: 1e-6,
            cutoff_epsilon: 1e-5,
            max_correspondence_distance: 1.0,
            ransac_iterations: 0,
            ransac_outlier_rejection_threshold: 0.05,
            ransac_seed: 42,
            covariance_neighbors: 20,
            covariance_epsilon: 0.001,
            min_correspondences: 6,
        }
    }
}

impl RegistrationConfig {
    /// Reject values the engine cannot run with.
    pub fn validate(&self) -> Result<()> {
        let positive = |name: &str, value: f64| -> Result<()> {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(MapperError::InvalidConfig(format!(
                    "registration.{} must be finite and > 0, got {}",
                    name, value
                )))
            }
        };

        if self.max_iterations == 0 {
            return Err(MapperError::InvalidConfig(
                "registration.max_iterations must be at least 1".into(),
            ));
        }
        positive("transformation_epsilon", self.transformation_epsilon)?;
        positive("cutoff_epsilon", self.cutoff_epsilon)?;
        positive("max_correspondence_distance", self.max_correspondence_distance)?;
        positive(
            "ransac_outlier_rejection_threshold",
            self.ransac_outlier_rejection_threshold,
        )?;
        positive("covariance_epsilon", self.covariance_epsilon)?;

        if self.covariance_neighbors < 3 {
            return Err(MapperError::InvalidConfig(format!(
                "registration.covariance_neighbors must be at least 3, got {}",
                self.covariance_neighbors
            )));
        }
        if self.min_correspondences < 3 {
            return Err(MapperError::InvalidConfig(format!(
                "registration.min_correspondences must be at least 3, got {}",
                self.min_correspondences
            )));
        }
        Ok(())
    }
}
