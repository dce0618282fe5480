//! Error types for the lesson task core.
//!
//! Store errors are authoritative and propagate to callers wrapped with the
//! use case that produced them. Cache and event sink errors have their own
//! types in [`crate::cache`] and [`crate::events`]; they are logged at the
//! service boundary and never reach callers.

use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Persisted entity kinds that can be reported as missing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Entity {
    Task,
    Assignment,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Entity::Task => write!(f, "task"),
            Entity::Assignment => write!(f, "assignment"),
        }
    }
}

/// Errors raised by a [`crate::database::TaskStore`]
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{entity} {id} doesn't exist")]
    NotFound { entity: Entity, id: Uuid },

    #[error("database error during {operation}: {source}")]
    Database {
        operation: &'static str,
        #[source]
        source: sqlx::Error,
    },

    #[error("store unavailable during {operation}: {message}")]
    Unavailable {
        operation: &'static str,
        message: String,
    },
}

impl StoreError {
    pub fn database(operation: &'static str) -> impl FnOnce(sqlx::Error) -> Self {
        move |source| StoreError::Database { operation, source }
    }

    pub fn task_not_found(id: Uuid) -> Self {
        StoreError::NotFound {
            entity: Entity::Task,
            id,
        }
    }

    pub fn assignment_not_found(id: Uuid) -> Self {
        StoreError::NotFound {
            entity: Entity::Assignment,
            id,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// How a transport layer should present a failed use case
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// The caller referenced something that does not exist
    ClientCorrectable,
    /// Opaque server-side failure
    ServerFailure,
}

/// Errors surfaced by [`crate::orchestration::TaskService`]
#[derive(Debug, Error)]
pub enum TaskServiceError {
    #[error("{operation}: {source}")]
    NotFound {
        operation: &'static str,
        #[source]
        source: StoreError,
    },

    #[error("{operation}: {source}")]
    Storage {
        operation: &'static str,
        #[source]
        source: StoreError,
    },
}

impl TaskServiceError {
    /// Wrap a store error with the name of the failing use case, keeping its kind
    pub fn from_store(operation: &'static str) -> impl FnOnce(StoreError) -> Self {
        move |source| {
            if source.is_not_found() {
                TaskServiceError::NotFound { operation, source }
            } else {
                TaskServiceError::Storage { operation, source }
            }
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, TaskServiceError::NotFound { .. })
    }

    pub fn classification(&self) -> ErrorClass {
        match self {
            TaskServiceError::NotFound { .. } => ErrorClass::ClientCorrectable,
            TaskServiceError::Storage { .. } => ErrorClass::ServerFailure,
        }
    }

    pub fn operation(&self) -> &'static str {
        match self {
            TaskServiceError::NotFound { operation, .. }
            | TaskServiceError::Storage { operation, .. } => operation,
        }
    }
}

pub type TaskServiceResult<T> = Result<T, TaskServiceError>;

/// Errors raised while wiring the system together at startup
#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] crate::config::ConfigurationError),

    #[error("Failed to connect to database: {0}")]
    Database(#[source] sqlx::Error),

    #[error("Event sink error: {0}")]
    EventSink(#[from] crate::events::SinkError),
}
