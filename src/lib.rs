#![allow(clippy::doc_markdown)] // Allow technical terms like PostgreSQL, SQLx in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Lesson Tasks Core
//!
//! Orchestration core for lesson task templates.
//!
//! ## Overview
//!
//! A task is a reusable template (payload text plus optional deadline). It is
//! fanned out to (class, lesson) pairs as assignments, each carrying a
//! snapshot of the payload. Marks are recorded per user against a task in a
//! lesson. Every committed write is announced as a domain event.
//!
//! ## Architecture
//!
//! [`TaskService`] drives three ports:
//!
//! - [`database::TaskStore`] - authoritative PostgreSQL storage
//! - [`cache::CacheProvider`] - best-effort read-through cache of tasks
//! - [`events::EventSink`] - fire-and-forget event publication over PGMQ
//!
//! The store is the source of truth. Cache and event failures are logged and
//! never fail a call once the store has committed.
//!
//! ## Module Organization
//!
//! - [`models`] - tasks, assignments and marks
//! - [`database`] - persistence port, PostgreSQL and in-memory adapters
//! - [`cache`] - task cache port, Redis and in-memory (moka) backends
//! - [`events`] - domain events and sinks
//! - [`orchestration`] - the task service use cases
//! - [`config`] - layered configuration
//! - [`logging`] - `tracing` subscriber setup
//! - [`error`] - structured error handling
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use lesson_tasks::models::{ClassLesson, NewTask};
//! use lesson_tasks::SystemContext;
//! use uuid::Uuid;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let context = SystemContext::new().await?;
//! let service = context.task_service();
//!
//! let task_id = service.create_task(NewTask::new("2+2=?")).await?;
//! let lesson = Uuid::new_v4();
//! service
//!     .create_assignments(task_id, &[ClassLesson::new("9A", lesson)])
//!     .await?;
//!
//! context.shutdown().await;
//! # Ok(())
//! # }
//! ```
//!
//! ## Testing
//!
//! ```bash
//! cargo test                              # Unit and in-memory integration tests
//! cargo test --features test-services     # Also PostgreSQL and Redis backed tests
//! ```

pub mod cache;
pub mod config;
pub mod database;
pub mod error;
pub mod events;
pub mod logging;
pub mod models;
pub mod orchestration;
pub mod system_context;

pub use config::{AppConfig, ConfigManager};
pub use error::{
    BootstrapError, ErrorClass, StoreError, StoreResult, TaskServiceError, TaskServiceResult,
};
pub use orchestration::TaskService;
pub use system_context::SystemContext;
