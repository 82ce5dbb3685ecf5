//! Iterative scan-to-map registration.
//!
//! # Algorithm
//!
//! ```text
//! Input: source cloud S, target cloud T (same frame), config
//! Output: rigid transform X aligning S onto T
//!
//! X = identity
//! for iteration in 1..=max_iterations:
//!     pairs   = nearest target point for each X·s, within max distance
//!     pairs   = RANSAC(pairs)                  (optional)
//!     ΔX      = one solve of the configured cost
//!     X       = ΔX ∘ X
//!     if |ΔX| < transformation_epsilon: converged
//! at the cap: accepted only if |ΔX| < cutoff_epsilon
//! ```
//!
//! The generalized cost minimizes Σ rᵀ (C_t + R C_s Rᵀ)⁻¹ r with one
//! Gauss-Newton step per round, perturbing the estimate on the left:
//! X ← exp(δ)·X with δ = [φ, ρ] and ∂(X·s)/∂δ = [-[X·s]×, I].

use nalgebra::{Matrix3, Matrix6, Point3, SMatrix, Vector3, Vector6};
use tracing::{debug, trace};

use crate::cloud::PointCloud;
use crate::error::{MapperError, Result};
use crate::geometry::so3::skew;
use crate::geometry::{Pose6DOF, SE3};

use super::config::{RegistrationConfig, RegistrationMethod};
use super::covariance::estimate_covariances;
use super::neighbors::NeighborGrid;
use super::rigid::estimate_rigid;
use super::sample_consensus::{RansacParams, reject_outliers};
use super::{Correspondence, RegistrationResult};

/// Scan-to-map registration engine.
#[derive(Debug, Clone)]
pub struct GeneralizedIcp {
    config: RegistrationConfig,
}

impl GeneralizedIcp {
    /// Create an engine; the config is validated here.
    pub fn new(config: RegistrationConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &RegistrationConfig {
        &self.config
    }

    /// Find the rigid correction aligning `source` onto `target`.
    ///
    /// The returned pose carries `timestamp_ns`. Neither input is modified.
    pub fn align(
        &self,
        source: &PointCloud,
        target: &PointCloud,
        timestamp_ns: u64,
    ) -> Result<RegistrationResult> {
        let cfg = &self.config;
        if target.is_empty() {
            return Err(MapperError::NoNeighborsFound);
        }
        if source.len() < cfg.min_correspondences {
            return Err(MapperError::InsufficientCorrespondences {
                found: source.len(),
                required: cfg.min_correspondences,
            });
        }

        let target_grid = NeighborGrid::new(target.points(), cfg.max_correspondence_distance);
        let covariances = match cfg.method {
            RegistrationMethod::Generalized => {
                let source_grid =
                    NeighborGrid::new(source.points(), cfg.max_correspondence_distance);
                Some((
                    estimate_covariances(
                        &source_grid,
                        cfg.covariance_neighbors,
                        cfg.covariance_epsilon,
                    ),
                    estimate_covariances(
                        &target_grid,
                        cfg.covariance_neighbors,
                        cfg.covariance_epsilon,
                    ),
                ))
            }
            RegistrationMethod::PointToPoint => None,
        };

        let mut estimate = SE3::identity();
        let mut last_change = f64::INFINITY;
        let mut correspondences = Vec::new();
        let mut moved: Vec<Point3<f64>> = Vec::with_capacity(source.len());

        for iteration in 1..=cfg.max_iterations {
            moved.clear();
            moved.extend(source.iter().map(|p| estimate.transform_point(p)));

            correspondences = self.find_correspondences(&moved, &target_grid);
            if cfg.ransac_iterations > 0 {
                let params = RansacParams {
                    iterations: cfg.ransac_iterations,
                    inlier_threshold: cfg.ransac_outlier_rejection_threshold,
                    seed: cfg.ransac_seed,
                };
                correspondences = reject_outliers(&correspondences, &moved, target.points(), &params);
            }
            if correspondences.len() < cfg.min_correspondences {
                return Err(MapperError::InsufficientCorrespondences {
                    found: correspondences.len(),
                    required: cfg.min_correspondences,
                });
            }

            let delta = match &covariances {
                Some((source_covs, target_covs)) => gauss_newton_step(
                    &correspondences,
                    &moved,
                    target.points(),
                    &estimate,
                    source_covs,
                    target_covs,
                )?,
                None => point_to_point_step(&correspondences, &moved, target.points())?,
            };

            estimate = delta.compose(&estimate);
            last_change = delta.angle().max(delta.translation.norm());
            trace!(
                iteration,
                correspondences = correspondences.len(),
                change = last_change,
                "Registration round"
            );

            if last_change < cfg.transformation_epsilon {
                return Ok(self.finish(
                    estimate,
                    source,
                    target,
                    &correspondences,
                    iteration,
                    timestamp_ns,
                ));
            }
        }

        if last_change < cfg.cutoff_epsilon {
            debug!(
                last_change,
                "Registration hit the iteration cap within the cutoff epsilon"
            );
            return Ok(self.finish(
                estimate,
                source,
                target,
                &correspondences,
                cfg.max_iterations,
                timestamp_ns,
            ));
        }

        Err(MapperError::RegistrationDidNotConverge {
            iterations: cfg.max_iterations,
            last_change,
        })
    }

    fn find_correspondences(
        &self,
        moved: &[Point3<f64>],
        target_grid: &NeighborGrid<'_>,
    ) -> Vec<Correspondence> {
        moved
            .iter()
            .enumerate()
            .filter_map(|(source, p)| {
                target_grid
                    .nearest_within(p, self.config.max_correspondence_distance)
                    .map(|(target, distance_sq)| Correspondence {
                        source,
                        target,
                        distance_sq,
                    })
            })
            .collect()
    }

    fn finish(
        &self,
        estimate: SE3,
        source: &PointCloud,
        target: &PointCloud,
        correspondences: &[Correspondence],
        iterations: u32,
        timestamp_ns: u64,
    ) -> RegistrationResult {
        // Mean squared residual of the last pairing under the final estimate.
        let fitness = correspondences
            .iter()
            .map(|c| {
                let moved = estimate.transform_point(&source.points()[c.source]);
                (moved - target.points()[c.target]).norm_squared()
            })
            .sum::<f64>()
            / correspondences.len().max(1) as f64;

        debug!(iterations, fitness, pairs = correspondences.len(), "Registration converged");
        RegistrationResult {
            transform: Pose6DOF::new(estimate, timestamp_ns),
            iterations,
            fitness,
            correspondences: correspondences.len(),
        }
    }
}

/// One Gauss-Newton step of the generalized cost.
///
/// `moved` holds the source points under `estimate`; covariances are indexed
/// like the input clouds.
fn gauss_newton_step(
    correspondences: &[Correspondence],
    moved: &[Point3<f64>],
    target: &[Point3<f64>],
    estimate: &SE3,
    source_covs: &[Matrix3<f64>],
    target_covs: &[Matrix3<f64>],
) -> Result<SE3> {
    let rotation = estimate.rotation_matrix();
    let mut hessian = Matrix6::<f64>::zeros();
    let mut gradient = Vector6::<f64>::zeros();

    for c in correspondences {
        let p = moved[c.source];
        let residual: Vector3<f64> = p - target[c.target];

        let combined =
            target_covs[c.target] + rotation * source_covs[c.source] * rotation.transpose();
        let Some(information) = combined.try_inverse() else {
            continue;
        };

        let mut jacobian = SMatrix::<f64, 3, 6>::zeros();
        jacobian.fixed_view_mut::<3, 3>(0, 0).copy_from(&(-skew(&p.coords)));
        jacobian.fixed_view_mut::<3, 3>(0, 3).copy_from(&Matrix3::identity());

        let jt_info = jacobian.transpose() * information;
        hessian += jt_info * jacobian;
        gradient += jt_info * residual;
    }

    let found = correspondences.len();
    let Some(cholesky) = hessian.cholesky() else {
        return Err(MapperError::InsufficientCorrespondences {
            found,
            required: found + 1,
        });
    };
    let delta = -cholesky.solve(&gradient);
    if !delta.iter().all(|v| v.is_finite()) {
        return Err(MapperError::InsufficientCorrespondences {
            found,
            required: found + 1,
        });
    }

    let phi = Vector3::new(delta[0], delta[1], delta[2]);
    let rho = Vector3::new(delta[3], delta[4], delta[5]);
    Ok(SE3::exp(&phi, &rho))
}

/// Closed-form point-to-point increment for the current pairing.
fn point_to_point_step(
    correspondences: &[Correspondence],
    moved: &[Point3<f64>],
    target: &[Point3<f64>],
) -> Result<SE3> {
    let src: Vec<_> = correspondences.iter().map(|c| moved[c.source]).collect();
    let dst: Vec<_> = correspondences.iter().map(|c| target[c.target]).collect();
    estimate_rigid(&src, &dst).ok_or(MapperError::InsufficientCorrespondences {
        found: correspondences.len(),
        required: correspondences.len() + 1,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::UnitQuaternion;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    /// Points scattered over three perpendicular walls, so every direction
    /// is constrained.
    fn structured_cloud(n: usize, seed: u64) -> PointCloud {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..n)
            .map(|i| {
                let a = rng.gen_range(0.0..8.0);
                let b = rng.gen_range(0.0..8.0);
                match i % 3 {
                    0 => Point3::new(a, b, 0.0),
                    1 => Point3::new(a, 0.0, b),
                    _ => Point3::new(0.0, a, b),
                }
            })
            .collect()
    }

    fn moved_by(cloud: &PointCloud, t: &SE3) -> PointCloud {
        cloud.iter().map(|p| t.transform_point(p)).collect()
    }

    fn small_offset() -> SE3 {
        SE3::new(
            UnitQuaternion::from_euler_angles(0.01, -0.005, 0.015),
            Vector3::new(0.05, -0.03, 0.02),
        )
    }

    #[test]
    fn test_identical_clouds_give_identity() {
        let target = structured_cloud(600, 1);
        for method in [RegistrationMethod::Generalized, RegistrationMethod::PointToPoint] {
            let engine = GeneralizedIcp::new(RegistrationConfig {
                method,
                ..Default::default()
            })
            .unwrap();
            let result = engine.align(&target, &target, 99).unwrap();

            assert_eq!(result.transform.timestamp_ns, 99);
            assert_relative_eq!(result.transform.translation().norm(), 0.0, epsilon = 1e-6);
            assert!(result.transform.transform.angle() < 1e-6);
        }
    }

    #[test]
    fn test_recovers_small_offset_generalized() {
        let target = structured_cloud(900, 2);
        let offset = small_offset();
        let source = moved_by(&target, &offset.inverse());

        let engine = GeneralizedIcp::new(RegistrationConfig::default()).unwrap();
        let result = engine.align(&source, &target, 5).unwrap();

        assert_relative_eq!(result.transform.transform.translation, offset.translation, epsilon = 1e-3);
        assert_relative_eq!(
            result.transform.transform.rotation_matrix(),
            offset.rotation_matrix(),
            epsilon = 1e-3
        );
        assert!(result.fitness < 1e-4);
    }

    #[test]
    fn test_recovers_small_offset_point_to_point() {
        let target = structured_cloud(900, 3);
        let offset = small_offset();
        let source = moved_by(&target, &offset.inverse());

        let engine = GeneralizedIcp::new(RegistrationConfig {
            method: RegistrationMethod::PointToPoint,
            max_iterations: 100,
            ..Default::default()
        })
        .unwrap();
        let result = engine.align(&source, &target, 5).unwrap();

        assert_relative_eq!(result.transform.transform.translation, offset.translation, epsilon = 1e-2);
    }

    #[test]
    fn test_is_deterministic() {
        let target = structured_cloud(600, 4);
        let source = moved_by(&target, &small_offset().inverse());
        let engine = GeneralizedIcp::new(RegistrationConfig {
            ransac_iterations: 20,
            ransac_outlier_rejection_threshold: 0.2,
            ..Default::default()
        })
        .unwrap();

        let a = engine.align(&source, &target, 1).unwrap();
        let b = engine.align(&source, &target, 1).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_single_iteration_does_not_converge() {
        let target = structured_cloud(600, 5);
        let source = moved_by(&target, &small_offset().inverse());
        let engine = GeneralizedIcp::new(RegistrationConfig {
            max_iterations: 1,
            ..Default::default()
        })
        .unwrap();

        match engine.align(&source, &target, 1) {
            Err(MapperError::RegistrationDidNotConverge { iterations, last_change }) => {
                assert_eq!(iterations, 1);
                assert!(last_change > 1e-5);
            }
            other => panic!("expected non-convergence, got {:?}", other),
        }
    }

    #[test]
    fn test_disjoint_clouds_have_no_correspondences() {
        let target = structured_cloud(100, 6);
        let shift = SE3::new(UnitQuaternion::identity(), Vector3::new(100.0, 0.0, 0.0));
        let source = moved_by(&target, &shift);
        let engine = GeneralizedIcp::new(RegistrationConfig::default()).unwrap();

        assert_eq!(
            engine.align(&source, &target, 1).unwrap_err(),
            MapperError::InsufficientCorrespondences {
                found: 0,
                required: 6
            }
        );
    }

    #[test]
    fn test_empty_inputs() {
        let target = structured_cloud(100, 7);
        let engine = GeneralizedIcp::new(RegistrationConfig::default()).unwrap();

        assert_eq!(
            engine.align(&target, &PointCloud::new(), 1).unwrap_err(),
            MapperError::NoNeighborsFound
        );
        assert!(matches!(
            engine.align(&PointCloud::new(), &target, 1).unwrap_err(),
            MapperError::InsufficientCorrespondences { found: 0, .. }
        ));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let err = GeneralizedIcp::new(RegistrationConfig {
            max_iterations: 0,
            ..Default::default()
        })
        .unwrap_err();
        assert!(!err.is_recoverable());
    }
}
