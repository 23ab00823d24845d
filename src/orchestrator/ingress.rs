//! Ingress message classification and decoding
//!
//! Maps raw pub/sub messages from the orchestrator's pattern subscriptions to
//! typed events. A payload that fails to decode is reported with its channel
//! so the actor can log and drop it without crashing the loop.

use thiserror::Error;

use crate::transport::{topics, TopicMessage};
use crate::types::{Emergency, HeartbeatPing, PredictiveAlert, VehicleTelemetry};

/// Typed event from one of the orchestrator's subscriptions
#[derive(Debug)]
pub enum IngressEvent {
    Telemetry(Box<VehicleTelemetry>),
    Heartbeat(HeartbeatPing),
    Alert(Box<PredictiveAlert>),
    NewEmergency(Box<Emergency>),
}

/// Failure to turn a raw message into an [`IngressEvent`]
#[derive(Debug, Error)]
pub enum IngressError {
    #[error("message on unrecognized topic: {0}")]
    UnknownTopic(String),
    #[error("malformed payload on {channel}: {source}")]
    Malformed {
        channel: String,
        #[source]
        source: serde_json::Error,
    },
}

impl IngressEvent {
    /// Decode a raw message based on which subscription pattern its topic
    /// matches.
    pub fn parse(message: &TopicMessage) -> Result<Self, IngressError> {
        let malformed = |source| IngressError::Malformed {
            channel: message.topic.clone(),
            source,
        };

        if topics::matches(topics::TELEMETRY_PATTERN, &message.topic) {
            serde_json::from_str(&message.payload)
                .map(|t| IngressEvent::Telemetry(Box::new(t)))
                .map_err(malformed)
        } else if topics::matches(topics::HEARTBEAT_PATTERN, &message.topic) {
            serde_json::from_str(&message.payload)
                .map(IngressEvent::Heartbeat)
                .map_err(malformed)
        } else if topics::matches(topics::ALERTS_PATTERN, &message.topic) {
            serde_json::from_str(&message.payload)
                .map(|a| IngressEvent::Alert(Box::new(a)))
                .map_err(malformed)
        } else if message.topic == topics::EMERGENCIES_TOPIC {
            serde_json::from_str(&message.payload)
                .map(|e| IngressEvent::NewEmergency(Box::new(e)))
                .map_err(malformed)
        } else {
            Err(IngressError::UnknownTopic(message.topic.clone()))
        }
    }
}
