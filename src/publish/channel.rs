//! Observer backed by bounded crossbeam channels, one per topic.

use std::collections::HashMap;

use crossbeam_channel::{Receiver, Sender, TrySendError, bounded};
use tracing::{debug, trace};

use super::MapObserver;
use super::messages::{CloudTopic, PathMessage, StampedCloud};

/// Messages buffered per topic before new ones are dropped.
pub const DEFAULT_TOPIC_CAPACITY: usize = 4;

/// Fans mapper outputs out to channel subscribers.
///
/// The map cloud and the refined path are latched: the last message is kept
/// and handed to every new subscriber, so both topics are always wanted. The
/// other topics count as listened to while they have a subscriber. A full
/// channel drops the new message; a dropped receiver detaches the topic on
/// the next send.
#[derive(Debug)]
pub struct ChannelPublisher {
    capacity: usize,
    clouds: HashMap<CloudTopic, Sender<StampedCloud>>,
    path: Option<Sender<PathMessage>>,
    latched_map: Option<StampedCloud>,
    latched_path: Option<PathMessage>,
}

impl ChannelPublisher {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_TOPIC_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            clouds: HashMap::new(),
            path: None,
            latched_map: None,
            latched_path: None,
        }
    }

    /// Attach a subscriber to a cloud topic, replacing any previous one.
    ///
    /// A new map subscriber first receives the latched map, if any.
    pub fn subscribe_cloud(&mut self, topic: CloudTopic) -> Receiver<StampedCloud> {
        let (tx, rx) = bounded(self.capacity);
        if let (CloudTopic::Map, Some(latched)) = (topic, &self.latched_map) {
            let _ = tx.try_send(latched.clone());
        }
        self.clouds.insert(topic, tx);
        rx
    }

    /// Attach a subscriber to the refined path, replacing any previous one.
    ///
    /// The subscriber first receives the latched path, if any.
    pub fn subscribe_path(&mut self) -> Receiver<PathMessage> {
        let (tx, rx) = bounded(self.capacity);
        if let Some(latched) = &self.latched_path {
            let _ = tx.try_send(latched.clone());
        }
        self.path = Some(tx);
        rx
    }
}

impl Default for ChannelPublisher {
    fn default() -> Self {
        Self::new()
    }
}

impl MapObserver for ChannelPublisher {
    fn wants_cloud(&self, topic: CloudTopic) -> bool {
        topic == CloudTopic::Map || self.clouds.contains_key(&topic)
    }

    fn wants_path(&self) -> bool {
        true
    }

    fn publish_cloud(&mut self, topic: CloudTopic, msg: StampedCloud) {
        if topic == CloudTopic::Map {
            self.latched_map = Some(msg.clone());
        }
        let Some(tx) = self.clouds.get(&topic) else {
            return;
        };
        match tx.try_send(msg) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => trace!(%topic, "Subscriber lagging, message dropped"),
            Err(TrySendError::Disconnected(_)) => {
                debug!(%topic, "Subscriber gone, detaching topic");
                self.clouds.remove(&topic);
            }
        }
    }

    fn publish_path(&mut self, msg: PathMessage) {
        self.latched_path = Some(msg.clone());
        let Some(tx) = &self.path else {
            return;
        };
        match tx.try_send(msg) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => trace!("Path subscriber lagging, message dropped"),
            Err(TrySendError::Disconnected(_)) => {
                debug!("Path subscriber gone, detaching");
                self.path = None;
            }
        }
    }
}
