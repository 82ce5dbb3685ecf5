//! Closed-form rigid alignment of paired points (Horn / Kabsch).

use nalgebra::{Matrix3, Point3, Vector3};

use crate::geometry::SE3;

/// Rigid transform T minimizing Σ |T·src_i - dst_i|².
///
/// Returns `None` for fewer than three pairs, mismatched lengths or a
/// failed decomposition.
pub fn estimate_rigid(src: &[Point3<f64>], dst: &[Point3<f64>]) -> Option<SE3> {
    let n = src.len();
    if n < 3 || n != dst.len() {
        return None;
    }

    let c_src = centroid(src);
    let c_dst = centroid(dst);

    // Cross-covariance H = Σ (src_i - c_src)(dst_i - c_dst)^T
    let mut h = Matrix3::zeros();
    for (s, d) in src.iter().zip(dst) {
        h += (s.coords - c_src) * (d.coords - c_dst).transpose();
    }

    let svd = h.svd(true, true);
    let u = svd.u?;
    let v = svd.v_t?.transpose();

    let mut rotation = v * u.transpose();
    if rotation.determinant() < 0.0 {
        // Reflection: flip the axis of the weakest singular value.
        let weakest = svd.singular_values.imin();
        let mut v_fixed = v;
        v_fixed.column_mut(weakest).neg_mut();
        rotation = v_fixed * u.transpose();
    }

    let translation = c_dst - rotation * c_src;
    let transform = SE3::from_rt(rotation, translation);
    transform.is_finite().then_some(transform)
}

fn centroid(points: &[Point3<f64>]) -> Vector3<f64> {
    let sum: Vector3<f64> = points.iter().map(|p| p.coords).sum();
    sum / points.len() as f64
}
