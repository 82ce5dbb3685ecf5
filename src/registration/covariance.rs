//! Per-point surface covariances for the generalized cost.
//!
//! Each covariance is estimated from the point's k nearest neighbors and then
//! regularized: the local surface is modeled as a disc, with unit variance in
//! the plane and `epsilon` along the normal. Writing `n` for the direction of
//! least variance, the regularized matrix is `I - (1 - epsilon) n nᵀ`.

use nalgebra::{Matrix3, Vector3};

use super::neighbors::NeighborGrid;

/// Shells searched around each point before giving up on its neighborhood.
const MAX_SEARCH_RINGS: i64 = 2;

/// Regularized covariance for every point of the grid, in point order.
///
/// Points with fewer than three neighbors (or non-finite ones) get the
/// identity, which makes their residual isotropic.
pub fn estimate_covariances(grid: &NeighborGrid<'_>, k: usize, epsilon: f64) -> Vec<Matrix3<f64>> {
    grid.points()
        .iter()
        .map(|p| {
            let neighbors = grid.k_nearest(p, k, MAX_SEARCH_RINGS);
            if neighbors.len() < 3 {
                return Matrix3::identity();
            }
            let raw = sample_covariance(neighbors.iter().map(|&(i, _)| grid.points()[i].coords));
            regularize(&raw, epsilon)
        })
        .collect()
}

fn sample_covariance(points: impl Iterator<Item = Vector3<f64>> + Clone) -> Matrix3<f64> {
    let n = points.clone().count() as f64;
    let mean: Vector3<f64> = points.clone().sum::<Vector3<f64>>() / n;

    let mut cov = Matrix3::zeros();
    for p in points {
        let d = p - mean;
        cov += d * d.transpose();
    }
    cov / n
}

/// Replace the eigenvalues of `cov` by (1, 1, epsilon).
fn regularize(cov: &Matrix3<f64>, epsilon: f64) -> Matrix3<f64> {
    let eigen = cov.symmetric_eigen();
    let normal: Vector3<f64> = eigen.eigenvectors.column(eigen.eigenvalues.imin()).into_owned();
    if !normal.iter().all(|v| v.is_finite()) {
        return Matrix3::identity();
    }
    Matrix3::identity() - (1.0 - epsilon) * normal * normal.transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Point3;

    #[test]
    fn test_plane_gets_thin_covariance_along_normal() {
        let points: Vec<Point3<f64>> = (0..10)
            .flat_map(|i| (0..10).map(move |j| Point3::new(i as f64 * 0.1, j as f64 * 0.1, 2.0)))
            .collect();
        let grid = NeighborGrid::new(&points, 1.0);
        let covs = estimate_covariances(&grid, 20, 0.001);

        assert_eq!(covs.len(), points.len());
        let z = Vector3::z();
        let x = Vector3::x();
        for cov in &covs {
            assert_relative_eq!((z.transpose() * cov * z)[0], 0.001, epsilon = 1e-9);
            assert_relative_eq!((x.transpose() * cov * x)[0], 1.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_isolated_point_gets_identity() {
        let points = vec![Point3::new(0.0, 0.0, 0.0), Point3::new(50.0, 0.0, 0.0)];
        let grid = NeighborGrid::new(&points, 1.0);
        let covs = estimate_covariances(&grid, 20, 0.001);
        assert_eq!(covs, vec![Matrix3::identity(); 2]);
    }

    #[test]
    fn test_regularized_matrix_is_symmetric_positive_definite() {
        let cov = Matrix3::new(2.0, 0.3, 0.1, 0.3, 1.0, 0.2, 0.1, 0.2, 0.05);
        let reg = regularize(&cov, 0.001);
        assert_relative_eq!(reg, reg.transpose(), epsilon = 1e-12);
        assert!(reg.cholesky().is_some());
    }
}
