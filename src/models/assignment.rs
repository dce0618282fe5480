//! # Assignment Model
//!
//! An assignment binds a task to one (class, lesson) pair. The task payload and
//! deadline are copied into the assignment when it is created; later edits to
//! the task do not reach existing assignments.
//!
//! ## Database Schema
//!
//! Maps to the `assignment` table:
//! ```sql
//! CREATE TABLE assignment (
//!   id UUID PRIMARY KEY,
//!   class VARCHAR(64) NOT NULL,
//!   task_id UUID NOT NULL,
//!   lesson_id UUID NOT NULL,
//!   task_payload TEXT NOT NULL,
//!   deadline TIMESTAMPTZ,
//!   UNIQUE (class, lesson_id, task_id)
//! );
//! ```
//!
//! `task_id` deliberately carries no foreign key: deleting a task leaves its
//! assignments in place.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::collections::HashSet;
use uuid::Uuid;

/// Fan-out target
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClassLesson {
    pub class: String,
    pub lesson_id: Uuid,
}

impl ClassLesson {
    pub fn new(class: impl Into<String>, lesson_id: Uuid) -> Self {
        Self {
            class: class.into(),
            lesson_id,
        }
    }

    /// Drop repeated targets, keeping the first occurrence of each
    pub fn dedup(targets: &[ClassLesson]) -> Vec<ClassLesson> {
        let mut seen = HashSet::with_capacity(targets.len());
        targets
            .iter()
            .filter(|target| seen.insert((*target).clone()))
            .cloned()
            .collect()
    }
}

/// Persisted assignment with its task snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Assignment {
    pub id: Uuid,
    pub class: String,
    pub lesson_id: Uuid,
    pub task_id: Uuid,
    #[sqlx(rename = "task_payload")]
    pub payload: String,
    pub deadline: Option<DateTime<Utc>>,
}

impl Assignment {
    pub fn target(&self) -> ClassLesson {
        ClassLesson::new(self.class.clone(), self.lesson_id)
    }
}

/// Mutable assignment fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentUpdate {
    pub id: Uuid,
    pub class: String,
    pub payload: String,
}

/// Input for creating a task together with its single assignment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTaskWithAssignment {
    pub class: String,
    pub lesson_id: Uuid,
    pub payload: String,
    pub deadline: Option<DateTime<Utc>>,
}

/// Identifiers produced by a joint task + assignment creation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedAssignment {
    pub task_id: Uuid,
    pub assignment_id: Uuid,
    pub class: String,
    pub lesson_id: Uuid,
}
