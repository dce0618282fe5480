//! Errors raised by the task cache
//!
//! The task service never returns these. A failed read becomes a store read,
//! and a failed write or invalidation is logged and dropped.

use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum CacheError {
    /// The backend refused the connection or was switched off
    #[error("{backend} task cache unavailable: {message}")]
    Unavailable {
        backend: &'static str,
        message: String,
    },

    /// The backend answered a command with an error
    #[error("{backend} {command} failed: {message}")]
    Command {
        backend: &'static str,
        command: &'static str,
        message: String,
    },

    #[error("task cache {operation} exceeded {}ms", .timeout.as_millis())]
    Timeout {
        operation: &'static str,
        timeout: Duration,
    },

    /// The stored value for this task no longer decodes as a `Task`
    #[error("cached value for task {task_id} is not a task: {source}")]
    Corrupt {
        task_id: Uuid,
        #[source]
        source: serde_json::Error,
    },

    #[error("task {task_id} could not be encoded for the cache: {source}")]
    Encode {
        task_id: Uuid,
        #[source]
        source: serde_json::Error,
    },
}

impl CacheError {
    pub fn unavailable(backend: &'static str, message: impl ToString) -> Self {
        Self::Unavailable {
            backend,
            message: message.to_string(),
        }
    }

    pub fn command(backend: &'static str, command: &'static str, message: impl ToString) -> Self {
        Self::Command {
            backend,
            command,
            message: message.to_string(),
        }
    }
}

pub type CacheResult<T> = Result<T, CacheError>;
