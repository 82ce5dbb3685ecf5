//! Messages emitted to map observers.

use crate::cloud::PointCloud;
use crate::geometry::Pose6DOF;

/// Point cloud with the frame it is expressed in.
#[derive(Debug, Clone, PartialEq)]
pub struct StampedCloud {
    pub frame_id: String,
    pub timestamp_ns: u64,
    pub cloud: PointCloud,
}

/// The whole refined trajectory, oldest pose first.
#[derive(Debug, Clone, PartialEq)]
pub struct PathMessage {
    pub frame_id: String,
    pub timestamp_ns: u64,
    pub poses: Vec<Pose6DOF>,
}

/// Cloud outputs of the mapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CloudTopic {
    /// Full map, map frame.
    Map,
    /// Local map used for the last alignment, robot frame.
    Neighbors,
    /// Scan placed with its refined pose, map frame.
    Registered,
}

impl CloudTopic {
    pub const ALL: [CloudTopic; 3] = [CloudTopic::Map, CloudTopic::Neighbors, CloudTopic::Registered];

    pub fn name(&self) -> &'static str {
        match self {
            CloudTopic::Map => "map_cloud",
            CloudTopic::Neighbors => "nn_cloud",
            CloudTopic::Registered => "registered_cloud",
        }
    }
}

impl std::fmt::Display for CloudTopic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
