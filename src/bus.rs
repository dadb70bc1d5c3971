//! Publish/subscribe bus contract.
//!
//! All agents of one kind share a single inbound topic and a single outbound
//! channel. The control core only needs to publish text frames and receive
//! decoded text frames; [`MemoryBus`] provides that in-process.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::error::BusError;

/// Frames buffered per topic before slow subscribers start lagging.
pub const DEFAULT_TOPIC_CAPACITY: usize = 1024;

/// A subscribed stream of frames on one topic.
#[async_trait]
pub trait Subscription: Send {
    /// Waits for the next frame.
    async fn next_frame(&mut self) -> Result<String, BusError>;

    /// Returns an already queued frame without waiting, or `None`.
    fn try_next_frame(&mut self) -> Result<Option<String>, BusError>;

    fn topic(&self) -> &str;
}

/// A shared bus carrying `addressee:payload` text frames.
#[async_trait]
pub trait Bus: Send + Sync {
    /// Publishes a frame; returns how many subscribers received it.
    async fn publish(&self, channel: &str, frame: &str) -> Result<usize, BusError>;

    async fn subscribe(&self, topic: &str) -> Result<Box<dyn Subscription>, BusError>;
}

/// In-process bus built on tokio broadcast channels, one per topic.
#[derive(Debug, Clone)]
pub struct MemoryBus {
    topics: Arc<Mutex<HashMap<String, broadcast::Sender<String>>>>,
    capacity: usize,
}

impl Default for MemoryBus {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_TOPIC_CAPACITY)
    }
}

impl MemoryBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            topics: Arc::new(Mutex::new(HashMap::new())),
            capacity,
        }
    }

    fn sender(&self, topic: &str) -> broadcast::Sender<String> {
        let mut topics = self
            .topics
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        topics
            .entry(topic.to_string())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .clone()
    }
}

#[async_trait]
impl Bus for MemoryBus {
    async fn publish(&self, channel: &str, frame: &str) -> Result<usize, BusError> {
        match self.sender(channel).send(frame.to_string()) {
            Ok(receivers) => Ok(receivers),
            Err(_) => {
                // Like a pub/sub server, publishing to an empty topic is not an error.
                debug!(channel, "published to topic with no subscribers");
                Ok(0)
            }
        }
    }

    async fn subscribe(&self, topic: &str) -> Result<Box<dyn Subscription>, BusError> {
        let receiver = self.sender(topic).subscribe();
        Ok(Box::new(MemorySubscription {
            topic: topic.to_string(),
            receiver,
        }))
    }
}

struct MemorySubscription {
    topic: String,
    receiver: broadcast::Receiver<String>,
}

#[async_trait]
impl Subscription for MemorySubscription {
    async fn next_frame(&mut self) -> Result<String, BusError> {
        loop {
            match self.receiver.recv().await {
                Ok(frame) => return Ok(frame),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(topic = %self.topic, skipped, "subscriber lagged, frames dropped");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    return Err(BusError::Closed {
                        topic: self.topic.clone(),
                    })
                }
            }
        }
    }

    fn try_next_frame(&mut self) -> Result<Option<String>, BusError> {
        loop {
            match self.receiver.try_recv() {
                Ok(frame) => return Ok(Some(frame)),
                Err(broadcast::error::TryRecvError::Empty) => return Ok(None),
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                    warn!(topic = %self.topic, skipped, "subscriber lagged, frames dropped");
                }
                Err(broadcast::error::TryRecvError::Closed) => {
                    return Err(BusError::Closed {
                        topic: self.topic.clone(),
                    })
                }
            }
        }
    }

    fn topic(&self) -> &str {
        &self.topic
    }
}
