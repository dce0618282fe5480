//! # Database Operations
//!
//! The persistence port and its adapters.
//!
//! - [`store`] - the [`TaskStore`] trait
//! - [`postgres`] - [`PgTaskStore`], the production adapter over `sqlx`
//! - [`in_memory`] - [`InMemoryTaskStore`] for tests and local runs
//! - [`connection`] - pool construction and embedded migrations
//! - [`error_codes`] - PostgreSQL SQLSTATE constants
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use lesson_tasks::config::DatabaseConfig;
//! use lesson_tasks::database::{create_pool, PgTaskStore, TaskStore};
//! use lesson_tasks::models::NewTask;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = create_pool(&DatabaseConfig::default()).await?;
//! let store = PgTaskStore::new(pool);
//! let id = store.create_task(&NewTask::new("2+2=?")).await?;
//! # Ok(())
//! # }
//! ```

pub mod connection;
pub mod error_codes;
pub mod in_memory;
pub mod postgres;
pub mod store;

pub use connection::{create_pool, run_migrations, MIGRATOR};
pub use error_codes::PgErrorCode;
pub use in_memory::InMemoryTaskStore;
pub use postgres::PgTaskStore;
pub use store::TaskStore;
