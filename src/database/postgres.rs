//! # PostgreSQL Task Store
//!
//! [`TaskStore`] over a shared `sqlx` pool. Batch writes send every row in a
//! single statement using `UNNEST` arrays and run inside one transaction, so
//! either all rows land or none do. A transaction dropped on an error path
//! rolls back.

use super::error_codes::PgErrorCode;
use super::store::TaskStore;
use crate::error::{StoreError, StoreResult};
use crate::models::{
    Assignment, AssignmentUpdate, ClassLesson, CreatedAssignment, NewTask, NewTaskWithAssignment,
    Task, TaskResult, UserMark,
};
use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use std::collections::HashMap;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Attempts for batch transactions that hit a deadlock or serialization failure
const MAX_TRANSACTION_ATTEMPTS: u32 = 3;

const ASSIGNMENT_COLUMNS: &str = "id, class, lesson_id, task_id, task_payload, deadline";

#[derive(Debug, Clone)]
pub struct PgTaskStore {
    pool: PgPool,
}

impl PgTaskStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn begin(&self, operation: &'static str) -> StoreResult<Transaction<'static, Postgres>> {
        self.pool.begin().await.map_err(StoreError::database(operation))
    }

    async fn try_create_assignments(
        &self,
        task_id: Uuid,
        targets: &[ClassLesson],
    ) -> StoreResult<Vec<Assignment>> {
        const OP: &str = "create_assignments";

        let mut tx = self.begin(OP).await?;

        let task = sqlx::query_as::<_, Task>("SELECT id, payload, deadline FROM task WHERE id = $1")
            .bind(task_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(StoreError::database(OP))?
            .ok_or_else(|| StoreError::task_not_found(task_id))?;

        let ids: Vec<Uuid> = targets.iter().map(|_| Uuid::new_v4()).collect();
        let classes: Vec<String> = targets.iter().map(|t| t.class.clone()).collect();
        let lessons: Vec<Uuid> = targets.iter().map(|t| t.lesson_id).collect();

        let inserted = sqlx::query(
            r#"
            INSERT INTO assignment (id, class, task_id, lesson_id, task_payload, deadline)
            SELECT t.id, t.class, $4, t.lesson_id, $5, $6
            FROM UNNEST($1::uuid[], $2::text[], $3::uuid[]) AS t(id, class, lesson_id)
            ON CONFLICT (class, lesson_id, task_id) DO NOTHING
            "#,
        )
        .bind(&ids)
        .bind(&classes)
        .bind(&lessons)
        .bind(task.id)
        .bind(&task.payload)
        .bind(task.deadline)
        .execute(&mut *tx)
        .await
        .map_err(StoreError::database(OP))?
        .rows_affected();

        let rows = sqlx::query_as::<_, Assignment>(&format!(
            r#"
            SELECT {ASSIGNMENT_COLUMNS}
            FROM assignment
            WHERE task_id = $1
              AND (class, lesson_id) IN (SELECT * FROM UNNEST($2::text[], $3::uuid[]))
            "#
        ))
        .bind(task_id)
        .bind(&classes)
        .bind(&lessons)
        .fetch_all(&mut *tx)
        .await
        .map_err(StoreError::database(OP))?;

        tx.commit().await.map_err(StoreError::database(OP))?;

        debug!(
            task_id = %task_id,
            requested = targets.len(),
            inserted = inserted,
            "Assignments fanned out"
        );

        order_by_targets(targets, rows).ok_or_else(|| {
            StoreError::database(OP)(sqlx::Error::RowNotFound)
        })
    }

    async fn try_set_task_results(&self, result: &TaskResult) -> StoreResult<()> {
        const OP: &str = "set_task_results";

        let ids: Vec<Uuid> = result.users_mark.iter().map(|_| Uuid::new_v4()).collect();
        let users: Vec<Uuid> = result.users_mark.iter().map(|m| m.user_id).collect();
        let marks: Vec<i32> = result.users_mark.iter().map(|m| m.mark).collect();

        let mut tx = self.begin(OP).await?;

        sqlx::query(
            r#"
            INSERT INTO user_mark (id, user_id, task_id, lesson_id, mark)
            SELECT t.id, t.user_id, $4, $5, t.mark
            FROM UNNEST($1::uuid[], $2::uuid[], $3::int4[]) AS t(id, user_id, mark)
            ON CONFLICT (user_id, task_id, lesson_id) DO UPDATE SET mark = EXCLUDED.mark
            "#,
        )
        .bind(&ids)
        .bind(&users)
        .bind(&marks)
        .bind(result.task_id)
        .bind(result.lesson_id)
        .execute(&mut *tx)
        .await
        .map_err(StoreError::database(OP))?;

        tx.commit().await.map_err(StoreError::database(OP))
    }
}

/// Arrange read-back rows in target order; `None` if a target has no row
fn order_by_targets(targets: &[ClassLesson], rows: Vec<Assignment>) -> Option<Vec<Assignment>> {
    let mut by_target: HashMap<ClassLesson, Assignment> =
        rows.into_iter().map(|a| (a.target(), a)).collect();

    targets.iter().map(|t| by_target.remove(t)).collect()
}

fn is_retryable(err: &StoreError) -> bool {
    match err {
        StoreError::Database { source, .. } => PgErrorCode::of(source)
            .is_some_and(|code| PgErrorCode::is_retryable_transaction_error(&code)),
        _ => false,
    }
}

#[async_trait]
impl TaskStore for PgTaskStore {
    async fn create_task(&self, task: &NewTask) -> StoreResult<Uuid> {
        let id = Uuid::new_v4();

        sqlx::query("INSERT INTO task (id, payload, deadline) VALUES ($1, $2, $3)")
            .bind(id)
            .bind(&task.payload)
            .bind(task.deadline)
            .execute(&self.pool)
            .await
            .map_err(StoreError::database("create_task"))?;

        Ok(id)
    }

    async fn get_task(&self, id: Uuid) -> StoreResult<Task> {
        sqlx::query_as::<_, Task>("SELECT id, payload, deadline FROM task WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(StoreError::database("get_task"))?
            .ok_or_else(|| StoreError::task_not_found(id))
    }

    async fn list_tasks(&self) -> StoreResult<Vec<Task>> {
        sqlx::query_as::<_, Task>("SELECT id, payload, deadline FROM task")
            .fetch_all(&self.pool)
            .await
            .map_err(StoreError::database("list_tasks"))
    }

    async fn update_task(&self, task: &Task) -> StoreResult<()> {
        let result = sqlx::query("UPDATE task SET payload = $2, deadline = $3 WHERE id = $1")
            .bind(task.id)
            .bind(&task.payload)
            .bind(task.deadline)
            .execute(&self.pool)
            .await
            .map_err(StoreError::database("update_task"))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::task_not_found(task.id));
        }
        Ok(())
    }

    async fn delete_task(&self, id: Uuid) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM task WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(StoreError::database("delete_task"))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::task_not_found(id));
        }
        Ok(())
    }

    async fn create_assignments(
        &self,
        task_id: Uuid,
        targets: &[ClassLesson],
    ) -> StoreResult<Vec<Assignment>> {
        let targets = ClassLesson::dedup(targets);
        if targets.is_empty() {
            // Still report a missing task
            self.get_task(task_id).await?;
            return Ok(Vec::new());
        }

        let mut attempt = 1;
        loop {
            match self.try_create_assignments(task_id, &targets).await {
                Err(e) if attempt < MAX_TRANSACTION_ATTEMPTS && is_retryable(&e) => {
                    warn!(error = %e, attempt = attempt, task_id = %task_id, "Retrying assignment fan-out");
                    attempt += 1;
                }
                result => return result,
            }
        }
    }

    async fn update_assignment(&self, update: &AssignmentUpdate) -> StoreResult<()> {
        let result =
            sqlx::query("UPDATE assignment SET class = $2, task_payload = $3 WHERE id = $1")
                .bind(update.id)
                .bind(&update.class)
                .bind(&update.payload)
                .execute(&self.pool)
                .await;

        let result = match result {
            Ok(result) => result,
            Err(e) => {
                if PgErrorCode::of(&e).is_some_and(|code| PgErrorCode::is_unique_violation(&code)) {
                    warn!(
                        assignment_id = %update.id,
                        class = %update.class,
                        "Assignment update collides with an existing assignment"
                    );
                }
                return Err(StoreError::database("update_assignment")(e));
            }
        };

        if result.rows_affected() == 0 {
            return Err(StoreError::assignment_not_found(update.id));
        }
        Ok(())
    }

    async fn delete_assignment(&self, id: Uuid) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM assignment WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(StoreError::database("delete_assignment"))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::assignment_not_found(id));
        }
        Ok(())
    }

    async fn assignments_by_class(&self, class: &str) -> StoreResult<Vec<Assignment>> {
        sqlx::query_as::<_, Assignment>(&format!(
            "SELECT {ASSIGNMENT_COLUMNS} FROM assignment WHERE class = $1"
        ))
        .bind(class)
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::database("assignments_by_class"))
    }

    async fn set_task_results(&self, result: &TaskResult) -> StoreResult<()> {
        // ON CONFLICT DO UPDATE cannot touch the same row twice in one statement
        let result = result.normalized();
        if result.is_empty() {
            return Ok(());
        }

        let mut attempt = 1;
        loop {
            match self.try_set_task_results(&result).await {
                Err(e) if attempt < MAX_TRANSACTION_ATTEMPTS && is_retryable(&e) => {
                    warn!(error = %e, attempt = attempt, task_id = %result.task_id, "Retrying mark upsert");
                    attempt += 1;
                }
                outcome => return outcome,
            }
        }
    }

    async fn task_results(&self, task_id: Uuid, lesson_id: Uuid) -> StoreResult<TaskResult> {
        let rows = sqlx::query_as::<_, (Uuid, i32)>(
            "SELECT user_id, mark FROM user_mark WHERE task_id = $1 AND lesson_id = $2 ORDER BY user_id",
        )
        .bind(task_id)
        .bind(lesson_id)
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::database("task_results"))?;

        Ok(TaskResult {
            task_id,
            lesson_id,
            users_mark: rows
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

        let task_id = Uuid::new_v4();
        let assignment_id = Uuid::new_v4();

        let mut tx = self.begin(OP).await?;

        sqlx::query("INSERT INTO task (id, payload, deadline) VALUES ($1, $2, $3)")
            .bind(task_id)
            .bind(&data.payload)
            .bind(data.deadline)
            .execute(&mut *tx)
            .await
            .map_err(StoreError::database(OP))?;

        sqlx::query(
            r#"
            INSERT INTO assignment (id, class, task_id, lesson_id, task_payload, deadline)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(assignment_id)
        .bind(&data.class)
        .bind(task_id)
        .bind(data.lesson_id)
        .bind(&data.payload)
        .bind(data.deadline)
        .execute(&mut *tx)
        .await
        .map_err(StoreError::database(OP))?;

        tx.commit().await.map_err(StoreError::database(OP))?;

        info!(task_id = %task_id, assignment_id = %assignment_id, class = %data.class, "Task created with assignment");

        Ok(CreatedAssignment {
            task_id,
            assignment_id,
            class: data.class.clone(),
            lesson_id: data.lesson_id,
        })
    }

    async fn health_check(&self) -> StoreResult<bool> {
        let value = sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map_err(StoreError::database("health_check"))?;
        Ok(value == 1)
    }

    fn store_name(&self) -> &'static str {
        "postgres"
    }
}
