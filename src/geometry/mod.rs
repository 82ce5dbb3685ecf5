//! Geometry utilities: SE3 transforms, timestamped poses, SO(3) helpers.

pub mod pose;
pub mod se3;
pub mod so3;

pub use pose::Pose6DOF;
pub use se3::SE3;
