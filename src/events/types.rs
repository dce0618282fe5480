//! Domain event payloads
//!
//! Events are derived from committed writes and handed to an
//! [`EventSink`](super::EventSink). They are never persisted by the core.

use crate::models::{Assignment, CreatedAssignment, TaskResult, UserMark};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Type tags used as the routing key on the event channel
pub mod constants {
    pub const TASK_ASSIGNED_TO_CLASS: &str = "TaskAssignedToClass";
    pub const STUDENTS_GOT_MARK: &str = "StudentsGotMarkEvent";
}

/// A task was assigned to a class for a lesson
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskAssignedToClass {
    pub assignment_id: Uuid,
    pub task_id: Uuid,
    pub class: String,
    pub lesson_id: Uuid,
}

impl From<&Assignment> for TaskAssignedToClass {
    fn from(assignment: &Assignment) -> Self {
        Self {
            assignment_id: assignment.id,
            task_id: assignment.task_id,
            class: assignment.class.clone(),
            lesson_id: assignment.lesson_id,
        }
    }
}

impl From<&CreatedAssignment> for TaskAssignedToClass {
    fn from(created: &CreatedAssignment) -> Self {
        Self {
            assignment_id: created.assignment_id,
            task_id: created.task_id,
            class: created.class.clone(),
            lesson_id: created.lesson_id,
        }
    }
}

/// Marks were recorded for users on a task in a lesson
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentsGotMark {
    pub users_mark: Vec<UserMark>,
    pub task_id: Uuid,
    pub lesson_id: Uuid,
}

impl From<&TaskResult> for StudentsGotMark {
    fn from(result: &TaskResult) -> Self {
        Self {
            users_mark: result.users_mark.clone(),
            task_id: result.task_id,
            lesson_id: result.lesson_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainEvent {
    TaskAssignedToClass(TaskAssignedToClass),
    StudentsGotMark(StudentsGotMark),
}

impl DomainEvent {
    /// One event per assignment, in order
    pub fn assignments_created(assignments: &[Assignment]) -> Vec<DomainEvent> {
        assignments
            .iter()
            .map(|a| DomainEvent::TaskAssignedToClass(a.into()))
            .collect()
    }

    pub fn marks_recorded(result: &TaskResult) -> DomainEvent {
        DomainEvent::StudentsGotMark(result.into())
    }

    pub fn event_type(&self) -> &'static str {
        match self {
            DomainEvent::TaskAssignedToClass(_) => constants::TASK_ASSIGNED_TO_CLASS,
            DomainEvent::StudentsGotMark(_) => constants::STUDENTS_GOT_MARK,
        }
    }

    pub fn payload(&self) -> Result<serde_json::Value, serde_json::Error> {
        match self {
            DomainEvent::TaskAssignedToClass(event) => serde_json::to_value(event),
            DomainEvent::StudentsGotMark(event) => serde_json::to_value(event),
        }
    }
}

/// Wire form of a domain event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub event_type: String,
    pub payload: serde_json::Value,
    pub published_at: DateTime<Utc>,
}

impl EventEnvelope {
    pub fn from_event(event: &DomainEvent) -> Result<Self, serde_json::Error> {
        Ok(Self {
            event_type: event.event_type().to_string(),
            payload: event.payload()?,
            published_at: Utc::now(),
        })
    }
}
