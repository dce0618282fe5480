//! # PGMQ Event Publisher
//!
//! Production [`EventSink`]: events are serialized into an [`EventEnvelope`]
//! and pushed into a bounded channel; a background worker drains the channel
//! and delivers each envelope with `pgmq.send`. Callers never wait on the
//! database. Delivery failures are retried with linear backoff and logged once
//! the retries are exhausted.

use super::sink::{EventSink, SinkError};
use super::types::{DomainEvent, EventEnvelope};
use crate::config::EventsConfig;
use async_trait::async_trait;
use parking_lot::Mutex;
use sqlx::PgPool;
use std::time::Duration;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Delivery retry policy for the background worker
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff: Duration,
}

impl From<&EventsConfig> for RetryPolicy {
    fn from(config: &EventsConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            backoff: config.retry_backoff(),
        }
    }
}

/// Event sink publishing to a PGMQ queue through a background worker
pub struct PgmqEventSink {
    queue_name: String,
    capacity: usize,
    sender: Mutex<Option<mpsc::Sender<EventEnvelope>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl std::fmt::Debug for PgmqEventSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgmqEventSink")
            .field("queue_name", &self.queue_name)
            .field("capacity", &self.capacity)
            .field("open", &self.sender.lock().is_some())
            .finish()
    }
}

impl PgmqEventSink {
    /// Create the sink, optionally ensure the queue exists, and start the
    /// delivery worker on the current tokio runtime
    pub async fn new(pool: PgPool, config: &EventsConfig) -> Result<Self, SinkError> {
        if config.create_queue {
            sqlx::query("SELECT pgmq.create($1)")
                .bind(&config.queue_name)
                .execute(&pool)
                .await
                .map_err(|e| SinkError::QueueSetup {
                    queue_name: config.queue_name.clone(),
                    reason: e.to_string(),
                })?;
            info!(queue_name = %config.queue_name, "Event queue ready");
        }

        Ok(Self::spawn(
            pool,
            config.queue_name.clone(),
            config.channel_capacity,
            RetryPolicy::from(config),
        ))
    }

    /// Start the delivery worker without touching the database
    pub fn spawn(pool: PgPool, queue_name: String, capacity: usize, retry: RetryPolicy) -> Self {
        let capacity = capacity.max(1);
        let (sender, receiver) = mpsc::channel(capacity);
        let worker = tokio::spawn(run_delivery_worker(
            pool,
            queue_name.clone(),
            receiver,
            retry,
        ));

        Self {
            queue_name,
            capacity,
            sender: Mutex::new(Some(sender)),
            worker: Mutex::new(Some(worker)),
        }
    }

    pub fn queue_name(&self) -> &str {
        &self.queue_name
    }

    /// Stop accepting events and wait until everything buffered is delivered
    /// (or has exhausted its retries)
    pub async fn shutdown(&self) {
        // Dropping the last sender ends the worker loop once the buffer drains
        drop(self.sender.lock().take());

        let worker = self.worker.lock().take();
        if let Some(worker) = worker {
            if let Err(e) = worker.await {
                error!(error = %e, queue_name = %self.queue_name, "Event delivery worker panicked");
            }
        }
    }
}

#[async_trait]
impl EventSink for PgmqEventSink {
    async fn produce(&self, event: &DomainEvent) -> Result<(), SinkError> {
        let event_type = event.event_type();
        let envelope = EventEnvelope::from_event(event)
            .map_err(|source| SinkError::Serialization { event_type, source })?;

        self.hand_off(event_type, envelope)?;
        debug!(event_type = event_type, queue_name = %self.queue_name, "Event handed off");
        Ok(())
    }

    fn sink_name(&self) -> &'static str {
        "pgmq"
    }
}

impl PgmqEventSink {
    fn hand_off(&self, event_type: &'static str, envelope: EventEnvelope) -> Result<(), SinkError> {
        let guard = self.sender.lock();
        let sender = guard.as_ref().ok_or(SinkError::ChannelClosed)?;

        sender.try_send(envelope).map_err(|e| match e {
            TrySendError::Full(_) => SinkError::ChannelFull {
                capacity: self.capacity,
                event_type,
            },
            TrySendError::Closed(_) => SinkError::ChannelClosed,
        })
    }
}

async fn run_delivery_worker(
    pool: PgPool,
    queue_name: String,
    mut receiver: mpsc::Receiver<EventEnvelope>,
    retry: RetryPolicy,
) {
    debug!(queue_name = %queue_name, "Event delivery worker started");

    while let Some(envelope) = receiver.recv().await {
        deliver_with_retry(&pool, &queue_name, &envelope, retry).await;
    }

    info!(queue_name = %queue_name, "Event delivery worker stopped");
}

async fn deliver_with_retry(
    pool: &PgPool,
    queue_name: &str,
    envelope: &EventEnvelope,
    retry: RetryPolicy,
) {
    let message = match serde_json::to_value(envelope) {
        Ok(message) => message,
        Err(e) => {
            error!(error = %e, event_type = %envelope.event_type, "Failed to encode event envelope");
            return;
        }
    };

    let mut attempt: u32 = 0;
    loop {
        match send_message(pool, queue_name, &message).await {
            Ok(message_id) => {
                debug!(
                    queue_name = queue_name,
                    message_id = message_id,
                    event_type = %envelope.event_type,
                    "Event delivered"
                );
                return;
            }
            Err(e) if attempt < retry.max_retries => {
                attempt += 1;
                warn!(
                    error = %e,
                    attempt = attempt,
                    max_retries = retry.max_retries,
                    event_type = %envelope.event_type,
                    "Event delivery failed, retrying"
                );
                tokio::time::sleep(retry.backoff * attempt).await;
            }
            Err(e) => {
                error!(
                    error = %e,
                    queue_name = queue_name,
                    event_type = %envelope.event_type,
                    attempts = attempt + 1,
                    "Event delivery failed, dropping event"
                );
                return;
            }
        }
    }
}

async fn send_message(
    pool: &PgPool,
    queue_name: &str,
    message: &serde_json::Value,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT * FROM pgmq.send($1, $2)")
        .bind(queue_name)
        .bind(message)
        .fetch_one(pool)
        .await
}
