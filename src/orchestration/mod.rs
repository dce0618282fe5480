//! # Orchestration
//!
//! The [`TaskService`] use cases: each one performs its authoritative write
//! through the [`TaskStore`](crate::database::TaskStore), then keeps the cache
//! in step and announces the change through the
//! [`EventSink`](crate::events::EventSink).
//!
//! ```text
//! caller ─▶ TaskService ─▶ TaskStore (commit)
//!                 ├──────▶ CacheProvider (best effort)
//!                 └──────▶ EventSink     (best effort, after commit)
//! ```

pub mod task_service;

pub use task_service::{ServiceHealth, TaskService};
