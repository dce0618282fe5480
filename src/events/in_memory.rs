//! In-memory event sink for tests
//!
//! Records every produced event in order. Failures can be injected either for
//! the next `n` calls or until the sink is made available again.

use super::sink::{EventSink, SinkError};
use super::types::DomainEvent;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

#[derive(Debug)]
pub struct InMemoryEventSink {
    events: Mutex<Vec<DomainEvent>>,
    available: AtomicBool,
    failures_remaining: AtomicUsize,
    attempts: AtomicUsize,
}

impl Default for InMemoryEventSink {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryEventSink {
    pub fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
            available: AtomicBool::new(true),
            failures_remaining: AtomicUsize::new(0),
            attempts: AtomicUsize::new(0),
        }
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Reject the next `count` produce calls
    pub fn fail_next(&self, count: usize) {
        self.failures_remaining.store(count, Ordering::SeqCst);
    }

    /// Events accepted so far
    pub fn events(&self) -> Vec<DomainEvent> {
        self.events.lock().clone()
    }

    /// Produce calls seen, including rejected ones
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }

    fn should_fail(&self) -> bool {
        if !self.available.load(Ordering::SeqCst) {
            return true;
        }
        self.failures_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl EventSink for InMemoryEventSink {
    async fn produce(&self, event: &DomainEvent) -> Result<(), SinkError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);

        if self.should_fail() {
            return Err(SinkError::Unavailable(format!(
                "in-memory sink rejected {}",
                event.event_type()
            )));
        }

        self.events.lock().push(event.clone());
        Ok(())
    }

    fn sink_name(&self) -> &'static str {
        "memory"
    }
}
