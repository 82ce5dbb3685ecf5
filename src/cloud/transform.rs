//! Point cloud transformer: moves a cloud between reference frames.
//!
//! Every call yields either a fully transformed cloud or a
//! `FrameTransformUnavailable` error.

use crate::error::{MapperError, Result};
use crate::geometry::Pose6DOF;

use super::PointCloud;

/// Express `cloud` in the frame whose pose is `pose`.
///
/// For `pose = T_map_robot` and a cloud in the robot frame, the result is in
/// the map frame. Input points are mapped one-to-one and in order; non-finite
/// input points stay non-finite and are filtered later by the index.
pub fn transform_cloud(cloud: &PointCloud, pose: &Pose6DOF) -> Result<PointCloud> {
    if !pose.is_finite() {
        return Err(MapperError::FrameTransformUnavailable(format!(
            "pose at {} ns has non-finite components",
            pose.timestamp_ns
        )));
    }

    let transform = &pose.transform;
    Ok(cloud.iter().map(|p| transform.transform_point(p)).collect())
}
