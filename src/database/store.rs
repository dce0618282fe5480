//! Persistence port
//!
//! [`TaskStore`] is the authoritative record of tasks, assignments and marks.
//! Everything above it (cache, events) is derived from what the store commits.

use crate::error::StoreResult;
use crate::models::{
    Assignment, AssignmentUpdate, ClassLesson, CreatedAssignment, NewTask, NewTaskWithAssignment,
    Task, TaskResult,
};
use async_trait::async_trait;
use std::fmt::Debug;
use uuid::Uuid;

/// Transactional storage for tasks, assignments and marks
///
/// Implementations must report a missing row as
/// [`StoreError::NotFound`](crate::error::StoreError::NotFound) for single-row
/// reads, updates and deletes. Batch writes are all-or-nothing.
#[async_trait]
pub trait TaskStore: Send + Sync + Debug {
    /// Insert a task template and return its generated id
    async fn create_task(&self, task: &NewTask) -> StoreResult<Uuid>;

    async fn get_task(&self, id: Uuid) -> StoreResult<Task>;

    /// Every stored task, in no particular order
    async fn list_tasks(&self) -> StoreResult<Vec<Task>>;

    async fn update_task(&self, task: &Task) -> StoreResult<()>;

    async fn delete_task(&self, id: Uuid) -> StoreResult<()>;

    /// Assign a task to each (class, lesson) target.
    ///
    /// The task payload and deadline are snapshotted into every new row.
    /// Targets that already have an assignment for this task are left as they
    /// are and the existing row is returned. The result holds one assignment
    /// per distinct target, in the order the targets were first given.
    async fn create_assignments(
        &self,
        task_id: Uuid,
        targets: &[ClassLesson],
    ) -> StoreResult<Vec<Assignment>>;

    async fn update_assignment(&self, update: &AssignmentUpdate) -> StoreResult<()>;

    async fn delete_assignment(&self, id: Uuid) -> StoreResult<()>;

    async fn assignments_by_class(&self, class: &str) -> StoreResult<Vec<Assignment>>;

    /// Upsert every (user, mark) pair of the result
    async fn set_task_results(&self, result: &TaskResult) -> StoreResult<()>;

    /// Current marks for a task in a lesson, ordered by user id
    async fn task_results(&self, task_id: Uuid, lesson_id: Uuid) -> StoreResult<TaskResult>;

    /// Create a task and its single assignment atomically
    async fn create_task_with_assignment(
        &self,
        data: &NewTaskWithAssignment,
    ) -> StoreResult<CreatedAssignment>;

    async fn health_check(&self) -> StoreResult<bool>;

    fn store_name(&self) -> &'static str;
}
