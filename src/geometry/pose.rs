//! Pose6DOF: timestamped rigid transform used throughout the mapping pipeline.
//!
//! Poses follow the `T_target_source` convention: a robot pose in the map is
//! `T_map_robot`, and applying it to a point in the robot frame yields the point
//! in the map frame.

use std::fmt;
use std::ops::Add;

use nalgebra::{Matrix4, Point3, UnitQuaternion, Vector3};

use super::SE3;
use super::so3::angle_between;

/// 6-degree-of-freedom pose with the time it refers to.
#[derive(Debug, Clone, PartialEq)]
pub struct Pose6DOF {
    pub transform: SE3,
    pub timestamp_ns: u64,
}

impl Pose6DOF {
    pub fn new(transform: SE3, timestamp_ns: u64) -> Self {
        Self {
            transform,
            timestamp_ns,
        }
    }

    pub fn identity(timestamp_ns: u64) -> Self {
        Self::new(SE3::identity(), timestamp_ns)
    }

    /// Build from a homogeneous 4x4 matrix, projecting its rotation block onto SO(3).
    pub fn from_matrix(mat: Matrix4<f64>, timestamp_ns: u64) -> Self {
        Self::new(SE3::from_matrix(mat), timestamp_ns)
    }

    /// Build from a translation and a unit quaternion.
    pub fn from_translation_rotation(
        translation: Vector3<f64>,
        rotation: UnitQuaternion<f64>,
        timestamp_ns: u64,
    ) -> Self {
        Self::new(SE3::new(rotation, translation), timestamp_ns)
    }

    pub fn to_matrix(&self) -> Matrix4<f64> {
        self.transform.to_matrix()
    }

    pub fn translation(&self) -> &Vector3<f64> {
        &self.transform.translation
    }

    pub fn rotation(&self) -> &UnitQuaternion<f64> {
        &self.transform.rotation
    }

    /// Inverse pose, keeping the timestamp.
    pub fn inverse(&self) -> Self {
        Self::new(self.transform.inverse(), self.timestamp_ns)
    }

    /// Apply `other` in the frame established by `self`.
    ///
    /// The result carries the later of the two timestamps.
    pub fn compose(&self, other: &Pose6DOF) -> Self {
        Self::new(
            self.transform.compose(&other.transform),
            self.timestamp_ns.max(other.timestamp_ns),
        )
    }

    pub fn transform_point(&self, p: &Point3<f64>) -> Point3<f64> {
        self.transform.transform_point(p)
    }

    /// Euclidean distance between the two translations.
    pub fn translation_distance(&self, other: &Pose6DOF) -> f64 {
        (self.transform.translation - other.transform.translation).norm()
    }

    /// Angle of the relative rotation between the two poses, in radians.
    pub fn rotation_distance(&self, other: &Pose6DOF) -> f64 {
        angle_between(&self.transform.rotation, &other.transform.rotation)
    }

    pub fn is_finite(&self) -> bool {
        self.transform.is_finite()
    }
}

impl Add<&Pose6DOF> for &Pose6DOF {
    type Output = Pose6DOF;

    fn add(self, rhs: &Pose6DOF) -> Pose6DOF {
        self.compose(rhs)
    }
}

impl Add for Pose6DOF {
    type Output = Pose6DOF;

    fn add(self, rhs: Pose6DOF) -> Pose6DOF {
        self.compose(&rhs)
    }
}

impl fmt::Display for Pose6DOF {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let t = &self.transform.translation;
        let (roll, pitch, yaw) = self.transform.rotation.euler_angles();
        write!(
            f,
            "t=[{:.3}, {:.3}, {:.3}] rpy=[{:.3}, {:.3}, {:.3}] @{}",
            t.x, t.y, t.z, roll, pitch, yaw, self.timestamp_ns
        )
    }
}
