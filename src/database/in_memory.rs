//! In-memory task store
//!
//! Mirrors the PostgreSQL store's semantics, including the unique keys and
//! all-or-nothing batch writes, so service behavior can be exercised without a
//! database. Failures can be injected for the whole store or for assignment
//! inserts only.

use super::store::TaskStore;
use crate::error::{StoreError, StoreResult};
use crate::models::{
    Assignment, AssignmentUpdate, ClassLesson, CreatedAssignment, NewTask, NewTaskWithAssignment,
    Task, TaskResult, UserMark,
};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use uuid::Uuid;

type AssignmentKey = (String, Uuid, Uuid);

#[derive(Debug, Default)]
struct Tables {
    tasks: HashMap<Uuid, Task>,
    assignments: HashMap<Uuid, Assignment>,
    /// UNIQUE (class, lesson_id, task_id)
    assignment_keys: HashMap<AssignmentKey, Uuid>,
    /// UNIQUE (user_id, task_id, lesson_id)
    marks: HashMap<(Uuid, Uuid, Uuid), i32>,
}

fn key_of(assignment: &Assignment) -> AssignmentKey {
    (
        assignment.class.clone(),
        assignment.lesson_id,
        assignment.task_id,
    )
}

#[derive(Debug)]
pub struct InMemoryTaskStore {
    tables: RwLock<Tables>,
    available: AtomicBool,
    fail_assignment_inserts: AtomicBool,
    task_reads: AtomicUsize,
}

impl Default for InMemoryTaskStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryTaskStore {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
            available: AtomicBool::new(true),
            fail_assignment_inserts: AtomicBool::new(false),
            task_reads: AtomicUsize::new(0),
        }
    }

    /// When unavailable every operation fails with `StoreError::Unavailable`
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Make every assignment insert fail, rolling back its transaction
    pub fn fail_assignment_inserts(&self, fail: bool) {
        self.fail_assignment_inserts.store(fail, Ordering::SeqCst);
    }

    /// Number of `get_task` calls that reached the store
    pub fn task_reads(&self) -> usize {
        self.task_reads.load(Ordering::SeqCst)
    }

    pub fn task_count(&self) -> usize {
        self.tables.read().tasks.len()
    }

    pub fn assignment_count(&self) -> usize {
        self.tables.read().assignments.len()
    }

    pub fn mark_count(&self) -> usize {
        self.tables.read().marks.len()
    }

    fn check_available(&self, operation: &'static str) -> StoreResult<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StoreError::Unavailable {
                operation,
                message: "in-memory store marked unavailable".to_string(),
            })
        }
    }

    fn check_assignment_insert(&self, operation: &'static str) -> StoreResult<()> {
        if self.fail_assignment_inserts.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable {
                operation,
                message: "assignment insert failed".to_string(),
            })
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl TaskStore for InMemoryTaskStore {
    async fn create_task(&self, task: &NewTask) -> StoreResult<Uuid> {
        self.check_available("create_task")?;

        let id = Uuid::new_v4();
        self.tables
            .write()
            .tasks
            .insert(id, task.clone().into_task(id));
        Ok(id)
    }

    async fn get_task(&self, id: Uuid) -> StoreResult<Task> {
        self.task_reads.fetch_add(1, Ordering::SeqCst);
        self.check_available("get_task")?;

        self.tables
            .read()
            .tasks
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::task_not_found(id))
    }

    async fn list_tasks(&self) -> StoreResult<Vec<Task>> {
        self.check_available("list_tasks")?;
        Ok(self.tables.read().tasks.values().cloned().collect())
    }

    async fn update_task(&self, task: &Task) -> StoreResult<()> {
        self.check_available("update_task")?;

        match self.tables.write().tasks.get_mut(&task.id) {
            Some(stored) => {
                *stored = task.clone();
                Ok(())
            }
            None => Err(StoreError::task_not_found(task.id)),
        }
    }

    async fn delete_task(&self, id: Uuid) -> StoreResult<()> {
        self.check_available("delete_task")?;

        self.tables
            .write()
            .tasks
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| StoreError::task_not_found(id))
    }

    async fn create_assignments(
        &self,
        task_id: Uuid,
        targets: &[ClassLesson],
    ) -> StoreResult<Vec<Assignment>> {
        self.check_available("create_assignments")?;

        let targets = ClassLesson::dedup(targets);
        let mut tables = self.tables.write();

        let task = tables
            .tasks
            .get(&task_id)
            .cloned()
            .ok_or_else(|| StoreError::task_not_found(task_id))?;

        // Stage every row before touching the tables
        let mut result = Vec::with_capacity(targets.len());
        let mut staged = Vec::new();
        for target in &targets {
            let key = (target.class.clone(), target.lesson_id, task_id);
            match tables.assignment_keys.get(&key) {
                Some(existing) => match tables.assignments.get(existing) {
                    Some(assignment) => result.push(assignment.clone()),
                    None => {
                        return Err(StoreError::Unavailable {
                            operation: "create_assignments",
                            message: format!("dangling unique key for assignment {existing}"),
                        })
                    }
                },
                None => {
                    self.check_assignment_insert("create_assignments")?;
                    let assignment = Assignment {
                        id: Uuid::new_v4(),
                        class: target.class.clone(),
                        lesson_id: target.lesson_id,
                        task_id,
                        payload: task.payload.clone(),
                        deadline: task.deadline,
                    };
                    result.push(assignment.clone());
                    staged.push(assignment);
                }
            }
        }

        for assignment in staged {
            tables.assignment_keys.insert(key_of(&assignment), assignment.id);
            tables.assignments.insert(assignment.id, assignment);
        }

        Ok(result)
    }

    async fn update_assignment(&self, update: &AssignmentUpdate) -> StoreResult<()> {
        self.check_available("update_assignment")?;

        let mut tables = self.tables.write();
        let Some(current) = tables.assignments.get(&update.id).cloned() else {
            return Err(StoreError::assignment_not_found(update.id));
        };

        let old_key = key_of(&current);
        let new_key = (update.class.clone(), current.lesson_id, current.task_id);
        if new_key != old_key && tables.assignment_keys.contains_key(&new_key) {
            return Err(StoreError::Unavailable {
                operation: "update_assignment",
                message: "duplicate key value violates unique constraint".to_string(),
            });
        }

        tables.assignment_keys.remove(&old_key);
        tables.assignment_keys.insert(new_key, update.id);
        if let Some(stored) = tables.assignments.get_mut(&update.id) {
            stored.class = update.class.clone();
            stored.payload = update.payload.clone();
        }
        Ok(())
    }

    async fn delete_assignment(&self, id: Uuid) -> StoreResult<()> {
        self.check_available("delete_assignment")?;

        let mut tables = self.tables.write();
        let removed = tables
            .assignments
            .remove(&id)
            .ok_or_else(|| StoreError::assignment_not_found(id))?;
        tables.assignment_keys.remove(&key_of(&removed));
        Ok(())
    }

    async fn assignments_by_class(&self, class: &str) -> StoreResult<Vec<Assignment>> {
        self.check_available("assignments_by_class")?;

        Ok(self
            .tables
            .read()
            .assignments
            .values()
            .filter(|a| a.class == class)
            .cloned()
            .collect())
    }

    async fn set_task_results(&self, result: &TaskResult) -> StoreResult<()> {
        self.check_available("set_task_results")?;

        let mut tables = self.tables.write();
        for mark in result.normalized().users_mark {
            tables
                .marks
                .insert((mark.user_id, result.task_id, result.lesson_id), mark.mark);
        }
        Ok(())
    }

    async fn task_results(&self, task_id: Uuid, lesson_id: Uuid) -> StoreResult<TaskResult> {
        self.check_available("task_results")?;

        let by_user: BTreeMap<Uuid, i32> = self
            .tables
            .read()
            .marks
            .iter()
            .filter(|((_, task, lesson), _)| *task == task_id && *lesson == lesson_id)
            .map(|((user, _, _), mark)| (*user, *mark))
            .collect();

        Ok(TaskResult {
            task_id,
            lesson_id,
            users_mark: by_user
                .into_iter()
                .map(|(user_id, mark)| UserMark { user_id, mark })
                .collect(),
        })
    }

    async fn create_task_with_assignment(
        &self,
        data: &NewTaskWithAssignment,
    ) -> StoreResult<CreatedAssignment> {
        const OP: &str = "create_task_with_assignment";
        self.check_available(OP)?;
        self.check_assignment_insert(OP)?;

        let task_id = Uuid::new_v4();
        let assignment = Assignment {
            id: Uuid::new_v4(),
            class: data.class.clone(),
            lesson_id: data.lesson_id,
            task_id,
            payload: data.payload.clone(),
            deadline: data.deadline,
        };

        let mut tables = self.tables.write();
        tables.tasks.insert(
            task_id,
            Task {
                id: task_id,
                payload: data.payload.clone(),
                deadline: data.deadline,
            },
        );
        tables.assignment_keys.insert(key_of(&assignment), assignment.id);

        let created = CreatedAssignment {
            task_id,
            assignment_id: assignment.id,
            class: assignment.class.clone(),
            lesson_id: assignment.lesson_id,
        };
        tables.assignments.insert(assignment.id, assignment);
        Ok(created)
    }

    async fn health_check(&self) -> StoreResult<bool> {
        Ok(self.available.load(Ordering::SeqCst))
    }

    fn store_name(&self) -> &'static str {
        "memory"
    }
}
