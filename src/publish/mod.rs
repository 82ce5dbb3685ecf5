//! Publish module - optional outputs of the mapper.
//!
//! The mapper asks its [`MapObserver`] whether anyone listens to a topic
//! before building the message, so unobserved outputs cost nothing.
//! Publishing never fails and never blocks the pipeline.

pub mod channel;
pub mod messages;

pub use channel::ChannelPublisher;
pub use messages::{CloudTopic, PathMessage, StampedCloud};

/// Sink for the mapper's auxiliary outputs.
pub trait MapObserver {
    /// Cheap check made before a cloud message is built.
    fn wants_cloud(&self, topic: CloudTopic) -> bool;

    fn wants_path(&self) -> bool;

    fn publish_cloud(&mut self, topic: CloudTopic, msg: StampedCloud);

    fn publish_path(&mut self, msg: PathMessage);
}

/// Observer that listens to nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullObserver;

impl MapObserver for NullObserver {
    fn wants_cloud(&self, _topic: CloudTopic) -> bool {
        false
    }

    fn wants_path(&self) -> bool {
        false
    }

    fn publish_cloud(&mut self, _topic: CloudTopic, _msg: StampedCloud) {}

    fn publish_path(&mut self, _msg: PathMessage) {}
}
