//! # Task Model
//!
//! A task is a reusable assignment template: an opaque payload (the question
//! or exercise text) and an optional deadline.
//!
//! ## Database Schema
//!
//! Maps to the `task` table:
//! - `id`: Primary key (UUID), generated by the store on creation
//! - `payload`: Opaque task text (TEXT)
//! - `deadline`: Optional due date (TIMESTAMPTZ)
//!
//! Tasks are also the unit of caching: [`crate::cache::CacheProvider`] holds
//! the JSON form of a `Task` keyed by its id.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Persisted task template
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Task {
    pub id: Uuid,
    pub payload: String,
    pub deadline: Option<DateTime<Utc>>,
}

/// New Task for creation (without generated fields)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTask {
    pub payload: String,
    pub deadline: Option<DateTime<Utc>>,
}

impl NewTask {
    pub fn new(payload: impl Into<String>) -> Self {
        Self {
            payload: payload.into(),
            deadline: None,
        }
    }

    pub fn with_deadline(mut self, deadline: DateTime<Utc>) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Attach the identifier assigned by the store
    pub fn into_task(self, id: Uuid) -> Task {
        Task {
            id,
            payload: self.payload,
            deadline: self.deadline,
        }
    }
}
