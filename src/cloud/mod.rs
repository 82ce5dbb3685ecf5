//! Point clouds and the frame transformer.

pub mod point_cloud;
pub mod transform;

pub use point_cloud::{PointCloud, Scan};
pub use transform::transform_cloud;
