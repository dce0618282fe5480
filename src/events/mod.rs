//! # Event Sink Module
//!
//! Domain events derived from committed writes and the port they are
//! published through.
//!
//! - [`types`] - `DomainEvent` variants and their wire envelope
//! - [`sink`] - `EventSink` trait, `SinkError`, `NoOpEventSink`
//! - [`publisher`] - `PgmqEventSink`, the PGMQ-backed production sink
//! - [`in_memory`] - `InMemoryEventSink` test double

pub mod in_memory;
pub mod publisher;
pub mod sink;
pub mod types;

pub use in_memory::InMemoryEventSink;
pub use publisher::{PgmqEventSink, RetryPolicy};
pub use sink::{EventSink, NoOpEventSink, SinkError};
pub use types::{constants, DomainEvent, EventEnvelope, StudentsGotMark, TaskAssignedToClass};
