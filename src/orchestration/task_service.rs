//! # Task Service
//!
//! Use cases over the three ports. Every write goes to the [`TaskStore`]
//! first; only once it has committed are the cache and the event sink
//! touched, and failures of either are logged rather than returned.
//!
//! ## Read Path
//!
//! `get_task` is cache-aside: a decodable cache hit is returned without
//! touching the store. A miss, an undecodable entry or a cache error falls
//! back to the store and repopulates the cache.

use crate::cache::CacheProvider;
use crate::database::TaskStore;
use crate::error::{TaskServiceError, TaskServiceResult};
use crate::events::{DomainEvent, EventSink};
use crate::models::{
    Assignment, AssignmentUpdate, ClassLesson, CreatedAssignment, NewTask, NewTaskWithAssignment,
    Task, TaskResult,
};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// Orchestrates the store, cache and event sink for each use case
///
/// Holds only shared handles, so a single instance can serve any number of
/// concurrent calls.
#[derive(Debug, Clone)]
pub struct TaskService {
    store: Arc<dyn TaskStore>,
    cache: CacheProvider,
    events: Arc<dyn EventSink>,
}

impl TaskService {
    pub fn new(store: Arc<dyn TaskStore>, cache: CacheProvider, events: Arc<dyn EventSink>) -> Self {
        Self {
            store,
            cache,
            events,
        }
    }

    pub fn store(&self) -> &Arc<dyn TaskStore> {
        &self.store
    }

    pub fn cache(&self) -> &CacheProvider {
        &self.cache
    }

    #[instrument(skip(self, task))]
    pub async fn create_task(&self, task: NewTask) -> TaskServiceResult<Uuid> {
        let id = self
            .store
            .create_task(&task)
            .await
            .map_err(TaskServiceError::from_store("create task"))?;

        info!(task_id = %id, "Task created");
        self.cache_task(&task.into_task(id)).await;
        Ok(id)
    }

    #[instrument(skip(self))]
    pub async fn get_task(&self, id: Uuid) -> TaskServiceResult<Task> {
        if let Some(task) = self.cached_task(id).await {
            return Ok(task);
        }

        let task = self
            .store
            .get_task(id)
            .await
            .map_err(TaskServiceError::from_store("get task"))?;

        self.cache_task(&task).await;
        Ok(task)
    }

    #[instrument(skip(self))]
    pub async fn list_tasks(&self) -> TaskServiceResult<Vec<Task>> {
        self.store
            .list_tasks()
            .await
            .map_err(TaskServiceError::from_store("list tasks"))
    }

    /// Overwrite a task and mirror the new value into the cache
    #[instrument(skip(self, task), fields(task_id = %task.id))]
    pub async fn update_task(&self, task: Task) -> TaskServiceResult<Uuid> {
        self.store
            .update_task(&task)
            .await
            .map_err(TaskServiceError::from_store("update task"))?;

        info!("Task updated");
        self.cache_task(&task).await;
        Ok(task.id)
    }

    /// Delete a task template. Assignments already made from it are kept.
    #[instrument(skip(self))]
    pub async fn delete_task(&self, id: Uuid) -> TaskServiceResult<()> {
        self.store
            .delete_task(id)
            .await
            .map_err(TaskServiceError::from_store("delete task"))?;

        info!("Task deleted");
        if let Err(e) = self.cache.invalidate_task(id).await {
            warn!(error = %e, task_id = %id, "Failed to invalidate cached task");
        }
        Ok(())
    }

    /// Assign a task to every (class, lesson) target and announce each assignment
    ///
    /// Repeating a target is harmless: the existing assignment is returned and
    /// announced again, no second row is written.
    #[instrument(skip(self, targets), fields(target_count = targets.len()))]
    pub async fn create_assignments(
        &self,
        task_id: Uuid,
        targets: &[ClassLesson],
    ) -> TaskServiceResult<Vec<Assignment>> {
        let assignments = self
            .store
            .create_assignments(task_id, targets)
            .await
            .map_err(TaskServiceError::from_store("create assignments"))?;

        info!(assignments = assignments.len(), "Task assigned");
        for event in DomainEvent::assignments_created(&assignments) {
            self.publish(&event).await;
        }
        Ok(assignments)
    }

    #[instrument(skip(self))]
    pub async fn assignments_by_class(&self, class: &str) -> TaskServiceResult<Vec<Assignment>> {
        self.store
            .assignments_by_class(class)
            .await
            .map_err(TaskServiceError::from_store("get assignments by class"))
    }

    #[instrument(skip(self, update), fields(assignment_id = %update.id))]
    pub async fn update_assignment(&self, update: AssignmentUpdate) -> TaskServiceResult<()> {
        self.store
            .update_assignment(&update)
            .await
            .map_err(TaskServiceError::from_store("update assignment"))
    }

    #[instrument(skip(self))]
    pub async fn delete_assignment(&self, id: Uuid) -> TaskServiceResult<()> {
        self.store
            .delete_assignment(id)
            .await
            .map_err(TaskServiceError::from_store("delete assignment"))
    }

    /// Record marks and announce them in a single event
    ///
    /// When a user appears more than once the last mark wins. An empty result
    /// writes nothing and announces nothing.
    #[instrument(skip(self, result), fields(task_id = %result.task_id, lesson_id = %result.lesson_id))]
    pub async fn set_task_results(&self, result: TaskResult) -> TaskServiceResult<()> {
        let result = result.normalized();
        if result.is_empty() {
            debug!("No marks to record");
            return Ok(());
        }

        self.store
            .set_task_results(&result)
            .await
            .map_err(TaskServiceError::from_store("set task results"))?;

        info!(marks = result.users_mark.len(), "Marks recorded");
        self.publish(&DomainEvent::marks_recorded(&result)).await;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn task_results(
        &self,
        task_id: Uuid,
        lesson_id: Uuid,
    ) -> TaskServiceResult<TaskResult> {
        self.store
            .task_results(task_id, lesson_id)
            .await
            .map_err(TaskServiceError::from_store("get task results"))
    }

    /// Create a task and assign it to one class in a single transaction
    #[instrument(skip(self, data), fields(class = %data.class, lesson_id = %data.lesson_id))]
    pub async fn create_task_with_assignment(
        &self,
        data: NewTaskWithAssignment,
    ) -> TaskServiceResult<CreatedAssignment> {
        let created = self
            .store
            .create_task_with_assignment(&data)
            .await
            .map_err(TaskServiceError::from_store("create task with assignment"))?;

        self.publish(&DomainEvent::TaskAssignedToClass((&created).into()))
            .await;
        Ok(created)
    }

    /// Report store and cache health; only the store is authoritative
    pub async fn health_check(&self) -> TaskServiceResult<ServiceHealth> {
        let store = self
            .store
            .health_check()
            .await
            .map_err(TaskServiceError::from_store("health check"))?;

        let cache = match self.cache.health_check().await {
            Ok(healthy) => healthy,
            Err(e) => {
                warn!(error = %e, provider = self.cache.provider_name(), "Cache health check failed");
                false
            }
        };

        Ok(ServiceHealth {
            store,
            cache,
            cache_provider: self.cache.provider_name(),
            event_sink: self.events.sink_name(),
        })
    }

    async fn cached_task(&self, id: Uuid) -> Option<Task> {
        match self.cache.get_task(id).await {
            Ok(Some(task)) => {
                debug!(task_id = %id, "Task cache hit");
                Some(task)
            }
            Ok(None) => {
                debug!(task_id = %id, "Task cache miss");
                None
            }
            Err(e) => {
                warn!(error = %e, task_id = %id, "Task cache read failed, using store");
                None
            }
        }
    }

    async fn cache_task(&self, task: &Task) {
        if let Err(e) = self.cache.put_task(task).await {
            warn!(error = %e, task_id = %task.id, "Failed to cache task");
        }
    }

    async fn publish(&self, event: &DomainEvent) {
        if let Err(e) = self.events.produce(event).await {
            warn!(
                error = %e,
                event_type = event.event_type(),
                sink = self.events.sink_name(),
                "Failed to publish event"
            );
        }
    }
}

/// Snapshot returned by [`TaskService::health_check`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceHealth {
    pub store: bool,
    pub cache: bool,
    pub cache_provider: &'static str,
    pub event_sink: &'static str,
}
