//! SE3: 6-DOF rigid transformation (rotation + translation).
//!
//! Transforms points as: p' = R * p + t

use nalgebra::{Matrix3, Matrix4, Point3, Rotation3, UnitQuaternion, Vector3};

/// Rotation angles below this are treated as zero in the exponential map.
const SMALL_ANGLE_THRESHOLD: f64 = 1e-10;

/// Rigid body transformation.
#[derive(Debug, Clone, PartialEq)]
pub struct SE3 {
    pub rotation: UnitQuaternion<f64>,
    pub translation: Vector3<f64>,
}

impl SE3 {
    /// Identity transformation.
    pub fn identity() -> Self {
        Self {
            rotation: UnitQuaternion::identity(),
            translation: Vector3::zeros(),
        }
    }

    pub fn new(rotation: UnitQuaternion<f64>, translation: Vector3<f64>) -> Self {
        Self {
            rotation,
            translation,
        }
    }

    /// Construct from a rotation matrix and translation.
    ///
    /// The matrix is projected onto SO(3) first, so a slightly non-orthonormal
    /// input still yields a proper rotation.
    pub fn from_rt(rotation: Matrix3<f64>, translation: Vector3<f64>) -> Self {
        let rot3 = Rotation3::from_matrix(&rotation);
        Self {
            rotation: UnitQuaternion::from_rotation_matrix(&rot3),
            translation,
        }
    }

    /// Construct from quaternion components (w, x, y, z) and a translation.
    pub fn from_quaternion(qw: f64, qx: f64, qy: f64, qz: f64, translation: Vector3<f64>) -> Self {
        let rotation = UnitQuaternion::from_quaternion(nalgebra::Quaternion::new(qw, qx, qy, qz));
        Self {
            rotation,
            translation,
        }
    }

    /// Construct from a homogeneous 4x4 matrix [R | t; 0 | 1].
    pub fn from_matrix(mat: Matrix4<f64>) -> Self {
        let r = mat.fixed_view::<3, 3>(0, 0).into_owned();
        let t = Vector3::new(mat[(0, 3)], mat[(1, 3)], mat[(2, 3)]);
        Self::from_rt(r, t)
    }

    /// Convert to a homogeneous 4x4 matrix.
    pub fn to_matrix(&self) -> Matrix4<f64> {
        let mut mat = Matrix4::identity();
        mat.fixed_view_mut::<3, 3>(0, 0)
            .copy_from(&self.rotation.to_rotation_matrix().into_inner());
        mat.fixed_view_mut::<3, 1>(0, 3).copy_from(&self.translation);
        mat
    }

    /// Exponential map with the rotation part given as a scaled axis.
    ///
    /// The translation is applied directly (no left Jacobian), matching the
    /// decoupled update used by the Gauss-Newton solver.
    pub fn exp(delta_rot: &Vector3<f64>, delta_trans: &Vector3<f64>) -> Self {
        let rotation = if delta_rot.norm() > SMALL_ANGLE_THRESHOLD {
            UnitQuaternion::from_scaled_axis(*delta_rot)
        } else {
            UnitQuaternion::identity()
        };
        Self {
            rotation,
            translation: *delta_trans,
        }
    }

    /// Inverse transformation: [R^T | -R^T t].
    pub fn inverse(&self) -> Self {
        let rot_inv = self.rotation.inverse();
        Self {
            translation: -(rot_inv * self.translation),
            rotation: rot_inv,
        }
    }

    /// Compose two transforms: self ∘ other.
    ///
    /// The quaternion is re-normalized so repeated composition does not drift
    /// away from a proper rotation.
    pub fn compose(&self, other: &SE3) -> Self {
        let mut rotation = self.rotation * other.rotation;
        rotation.renormalize();
        Self {
            rotation,
            translation: self.rotation * other.translation + self.translation,
        }
    }

    /// Transform a single point: p' = R * p + t.
    pub fn transform_point(&self, p: &Point3<f64>) -> Point3<f64> {
        Point3::from(self.rotation * p.coords + self.translation)
    }

    /// Get the rotation matrix.
    pub fn rotation_matrix(&self) -> Matrix3<f64> {
        self.rotation.to_rotation_matrix().into_inner()
    }

    /// Rotation angle in radians.
    pub fn angle(&self) -> f64 {
        self.rotation.angle()
    }

    pub fn is_finite(&self) -> bool {
        self.translation.iter().all(|v| v.is_finite())
            && self.rotation.coords.iter().all(|v| v.is_finite())
    }
}

impl Default for SE3 {
    fn default() -> Self {
        Self::identity()
    }
}
