//! Event sink port

use super::types::DomainEvent;
use async_trait::async_trait;
use std::fmt::Debug;
use thiserror::Error;

/// Errors for event sink operations
///
/// Logged by the task service and never surfaced to its callers.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Failed to serialize {event_type} event: {source}")]
    Serialization {
        event_type: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("Event buffer full ({capacity} pending), dropping {event_type} event")]
    ChannelFull {
        capacity: usize,
        event_type: &'static str,
    },

    #[error("Event sink is shut down")]
    ChannelClosed,

    #[error("Failed to set up event queue {queue_name}: {reason}")]
    QueueSetup { queue_name: String, reason: String },

    #[error("Event sink unavailable: {0}")]
    Unavailable(String),
}

/// Fire-and-forget publication of domain events
///
/// `produce` hands the event off and returns; any buffering, retrying or
/// flushing is the sink's own business and must not block the caller.
#[async_trait]
pub trait EventSink: Send + Sync + Debug {
    async fn produce(&self, event: &DomainEvent) -> Result<(), SinkError>;

    fn sink_name(&self) -> &'static str;
}

/// Sink that discards every event
#[derive(Debug, Clone, Default)]
pub struct NoOpEventSink;

#[async_trait]
impl EventSink for NoOpEventSink {
    async fn produce(&self, _event: &DomainEvent) -> Result<(), SinkError> {
        Ok(())
    }

    fn sink_name(&self) -> &'static str {
        "noop"
    }
}
