//! Refined trajectory: one entry per successfully refined scan.

use crate::geometry::Pose6DOF;
use crate::publish::PathMessage;

/// Append-only list of refined poses in the map frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RefinedPath {
    poses: Vec<Pose6DOF>,
}

impl RefinedPath {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, pose: Pose6DOF) {
        self.poses.push(pose);
    }

    pub fn len(&self) -> usize {
        self.poses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.poses.is_empty()
    }

    pub fn poses(&self) -> &[Pose6DOF] {
        &self.poses
    }

    pub fn last(&self) -> Option<&Pose6DOF> {
        self.poses.last()
    }

    /// Full path as a message stamped with the newest pose.
    pub fn to_message(&self, frame_id: &str) -> PathMessage {
        PathMessage {
            frame_id: frame_id.to_string(),
            timestamp_ns: self.last().map_or(0, |p| p.timestamp_ns),
            poses: self.poses.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_carries_whole_path() {
        let mut path = RefinedPath::new();
        assert_eq!(path.to_message("map").timestamp_ns, 0);

        path.push(Pose6DOF::identity(10));
        path.push(Pose6DOF::identity(20));

        let msg = path.to_message("map");
        assert_eq!(msg.frame_id, "map");
        assert_eq!(msg.timestamp_ns, 20);
        assert_eq!(msg.poses.len(), 2);
    }
}
