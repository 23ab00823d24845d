//! Pub/Sub transport contract
//!
//! The coordination core depends only on this contract; any broker providing
//! named-topic publish/subscribe with at-most-once delivery and per-topic
//! ordering satisfies it. An in-memory broker ([`InMemoryBus`]) is included
//! for single-process fleets and tests.
//!
//! Topic namespace:
//!
//! ```text
//! aegis:{fleet}:telemetry:{vehicle_id}   telemetry records
//! aegis:{fleet}:alerts:{vehicle_id}      predictive alerts
//! aegis:{fleet}:heartbeat:{vehicle_id}   liveness pings
//! aegis:{fleet}:commands:{vehicle_id}    per-vehicle commands
//! aegis:dispatch:{emergency_id}:assigned post-dispatch broadcast
//! aegis:dispatch:{emergency_id}:resolved post-resolution broadcast
//! aegis:emergencies:new                  operator-injected emergencies
//! ```

mod memory;

pub use memory::InMemoryBus;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

/// A message received from a subscription: the concrete topic it was
/// published on plus the raw JSON payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicMessage {
    pub topic: String,
    pub payload: String,
}

/// Transport failure surfaced to publishers and subscribers.
///
/// Publish failures are best-effort by contract: callers log and continue,
/// the next tick reissues state.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("transport is closed")]
    Closed,
    #[error("transport I/O failure: {0}")]
    Io(String),
}

/// Abstract pub/sub broker contract.
///
/// - `publish` is fire-and-forget with at-most-once delivery
/// - patterns use `*` to match exactly one `:`-separated topic segment
/// - per-topic message order is preserved; cross-topic order is unspecified
#[async_trait]
pub trait Transport: Send + Sync {
    /// Publish a payload to a named topic (best effort)
    async fn publish(&self, topic: &str, payload: &str) -> Result<(), TransportError>;

    /// Subscribe to one or more topic patterns.
    ///
    /// Returns a cold stream; messages published before the call are never
    /// delivered. Dropping the subscription unsubscribes.
    async fn subscribe(&self, patterns: &[&str]) -> Result<Subscription, TransportError>;

    /// Release broker resources. Idempotent; pending subscriptions end.
    async fn close(&self);
}

/// Receiving half of a subscription.
///
/// Dropping the value releases the subscription on the broker side the next
/// time a publish observes the closed channel.
pub struct Subscription {
    rx: mpsc::Receiver<TopicMessage>,
}

impl Subscription {
    pub(crate) fn new(rx: mpsc::Receiver<TopicMessage>) -> Self {
        Self { rx }
    }

    /// Receive the next message; `None` once the transport closes.
    pub async fn recv(&mut self) -> Option<TopicMessage> {
        self.rx.recv().await
    }
}

/// Topic name construction and pattern matching
pub mod topics {
    /// Pattern covering all fleets' telemetry channels
    pub const TELEMETRY_PATTERN: &str = "aegis:*:telemetry:*";
    /// Pattern covering all fleets' heartbeat channels
    pub const HEARTBEAT_PATTERN: &str = "aegis:*:heartbeat:*";
    /// Pattern covering all fleets' alert channels
    pub const ALERTS_PATTERN: &str = "aegis:*:alerts:*";
    /// Pattern covering all post-resolution broadcasts
    pub const RESOLVED_PATTERN: &str = "aegis:dispatch:*:resolved";
    /// Topic for operator-injected emergency events
    pub const EMERGENCIES_TOPIC: &str = "aegis:emergencies:new";

    pub fn telemetry(fleet_id: &str, vehicle_id: &str) -> String {
        format!("aegis:{}:telemetry:{}", fleet_id, vehicle_id)
    }

    pub fn alerts(fleet_id: &str, vehicle_id: &str) -> String {
        format!("aegis:{}:alerts:{}", fleet_id, vehicle_id)
    }

    pub fn heartbeat(fleet_id: &str, vehicle_id: &str) -> String {
        format!("aegis:{}:heartbeat:{}", fleet_id, vehicle_id)
    }

    pub fn commands(fleet_id: &str, vehicle_id: &str) -> String {
        format!("aegis:{}:commands:{}", fleet_id, vehicle_id)
    }

    pub fn dispatch_assigned(emergency_id: &str) -> String {
        format!("aegis:dispatch:{}:assigned", emergency_id)
    }

    pub fn dispatch_resolved(emergency_id: &str) -> String {
        format!("aegis:dispatch:{}:resolved", emergency_id)
    }

    /// Segment-wise pattern match: `*` matches exactly one `:` segment.
    ///
    /// Patterns and topics with different segment counts never match.
    pub fn matches(pattern: &str, topic: &str) -> bool {
        let mut p = pattern.split(':');
        let mut t = topic.split(':');
        loop {
            match (p.next(), t.next()) {
                (None, None) => return true,
                (Some(ps), Some(ts)) if ps == "*" || ps == ts => continue,
                _ => return false,
            }
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_topic_construction() {
            assert_eq!(
                telemetry("fleet01", "AMB-001"),
                "aegis:fleet01:telemetry:AMB-001"
            );
            assert_eq!(
                dispatch_assigned("em-1"),
                "aegis:dispatch:em-1:assigned"
            );
        }

        #[test]
        fn test_pattern_matching() {
            assert!(matches(TELEMETRY_PATTERN, "aegis:fleet01:telemetry:AMB-001"));
            assert!(matches(HEARTBEAT_PATTERN, "aegis:f2:heartbeat:POL-009"));
            assert!(matches(RESOLVED_PATTERN, "aegis:dispatch:em-1:resolved"));
            assert!(matches(EMERGENCIES_TOPIC, EMERGENCIES_TOPIC));

            // A wildcard spans exactly one segment
            assert!(!matches(TELEMETRY_PATTERN, "aegis:fleet01:telemetry"));
            assert!(!matches(
                TELEMETRY_PATTERN,
                "aegis:fleet01:heartbeat:AMB-001"
            ));
            assert!(!matches(
                "aegis:*:telemetry",
                "aegis:fleet01:telemetry:AMB-001"
            ));
        }

        #[test]
        fn test_exact_topics_do_not_cross_match() {
            assert!(!matches(EMERGENCIES_TOPIC, "aegis:emergencies:old"));
            assert!(!matches("aegis:dispatch:em-1:resolved", "aegis:dispatch:em-2:resolved"));
        }
    }
}
