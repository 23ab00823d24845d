//! In-memory pub/sub broker
//!
//! Single-process implementation of the [`Transport`] contract used by the
//! fleet binary and the test suites. Delivery is at-most-once: a subscriber
//! whose buffer is full loses the message rather than blocking publishers.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::{topics, Subscription, TopicMessage, Transport, TransportError};

/// Per-subscriber channel capacity. Slow consumers drop messages beyond this.
const SUBSCRIBER_BUFFER: usize = 256;

struct BusSubscriber {
    patterns: Vec<String>,
    tx: mpsc::Sender<TopicMessage>,
}

struct BusInner {
    subscribers: Vec<BusSubscriber>,
    closed: bool,
}

/// Shared in-process broker.
///
/// Cheap to clone; all clones publish into the same subscriber set. Publishes
/// happen under one short-lived lock, which preserves per-topic delivery
/// order for every subscriber.
#[derive(Clone)]
pub struct InMemoryBus {
    inner: Arc<Mutex<BusInner>>,
}

impl InMemoryBus {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(BusInner {
                subscribers: Vec::new(),
                closed: false,
            })),
        }
    }

    /// Number of live subscriptions (for diagnostics and tests)
    pub fn subscriber_count(&self) -> usize {
        match self.inner.lock() {
            Ok(inner) => inner.subscribers.len(),
            Err(_) => 0,
        }
    }
}

impl Default for InMemoryBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for InMemoryBus {
    async fn publish(&self, topic: &str, payload: &str) -> Result<(), TransportError> {
        let mut inner = self
            .inner
            .lock()
            .map_err(|e| TransportError::Io(e.to_string()))?;

        if inner.closed {
            return Err(TransportError::Closed);
        }

        inner.subscribers.retain(|sub| {
            if !sub.patterns.iter().any(|p| topics::matches(p, topic)) {
                return true;
            }
            let message = TopicMessage {
                topic: topic.to_string(),
                payload: payload.to_string(),
            };
            match sub.tx.try_send(message) {
                Ok(()) => true,
                Err(mpsc::error::TrySendError::Full(_)) => {
                    // At-most-once: the slow consumer loses this message
                    warn!(topic = %topic, "Subscriber buffer full, dropping message");
                    true
                }
                // Receiver dropped: prune the dead subscription
                Err(mpsc::error::TrySendError::Closed(_)) => false,
            }
        });

        Ok(())
    }

    async fn subscribe(&self, patterns: &[&str]) -> Result<Subscription, TransportError> {
        let mut inner = self
            .inner
            .lock()
            .map_err(|e| TransportError::Io(e.to_string()))?;

        if inner.closed {
            return Err(TransportError::Closed);
        }

        let (tx, rx) = mpsc::channel(SUBSCRIBER_BUFFER);
        inner.subscribers.push(BusSubscriber {
            patterns: patterns.iter().map(|p| (*p).to_string()).collect(),
            tx,
        });

        debug!(patterns = ?patterns, "Subscription registered");
        Ok(Subscription::new(rx))
    }

    async fn close(&self) {
        if let Ok(mut inner) = self.inner.lock() {
            if !inner.closed {
                inner.closed = true;
                // Dropping the senders ends every subscription stream
                inner.subscribers.clear();
                debug!("In-memory bus closed");
            }
        }
    }
}
