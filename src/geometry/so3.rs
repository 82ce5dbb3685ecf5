//! SO(3) helpers used by the registration Jacobians.

use nalgebra::{Matrix3, UnitQuaternion, Vector3};

/// Constructs the skew-symmetric matrix [v]× such that [v]× u = v × u.
///
/// ```text
/// [v]× = |  0   -v_z   v_y |
///        |  v_z   0   -v_x |
///        | -v_y  v_x    0  |
/// ```
#[inline]
pub fn skew(v: &Vector3<f64>) -> Matrix3<f64> {
    Matrix3::new(
        0.0, -v.z, v.y,
        v.z, 0.0, -v.x,
        -v.y, v.x, 0.0,
    )
}

/// Angle in radians of the relative rotation between two orientations.
pub fn angle_between(a: &UnitQuaternion<f64>, b: &UnitQuaternion<f64>) -> f64 {
    a.angle_to(b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_skew_cross_product() {
        let v = Vector3::new(1.0, 2.0, 3.0);
        let u = Vector3::new(4.0, 5.0, 6.0);

        assert_relative_eq!(v.cross(&u), skew(&v) * u, epsilon = 1e-12);
    }

    #[test]
    fn test_skew_antisymmetric() {
        let skew_v = skew(&Vector3::new(-0.5, 2.0, 7.0));
        assert_relative_eq!(skew_v, -skew_v.transpose(), epsilon = 1e-12);
    }

    #[test]
    fn test_angle_between() {
        let a = UnitQuaternion::from_euler_angles(0.0, 0.0, 0.2);
        let b = UnitQuaternion::from_euler_angles(0.0, 0.0, -0.1);
        assert_relative_eq!(angle_between(&a, &b), 0.3, epsilon = 1e-12);
    }
}
