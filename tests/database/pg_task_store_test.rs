use chrono::{TimeZone, Utc};
use lesson_tasks::database::{PgErrorCode, PgTaskStore, TaskStore};
use lesson_tasks::StoreError;
use lesson_tasks::models::{
    AssignmentUpdate, ClassLesson, NewTask, NewTaskWithAssignment, Task, TaskResult, UserMark,
};
use sqlx::PgPool;
use uuid::Uuid;

async fn row_count(pool: &PgPool, table: &str) -> i64 {
    sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM {table}"))
        .fetch_one(pool)
        .await
        .unwrap()
}

#[sqlx::test(migrations = "./migrations")]
async fn test_task_crud(pool: PgPool) {
    let store = PgTaskStore::new(pool);
    let deadline = Utc.with_ymd_and_hms(2025, 5, 20, 9, 0, 0).unwrap();

    let id = store
        .create_task(&NewTask::new("2+2=?").with_deadline(deadline))
        .await
        .unwrap();
    let task = store.get_task(id).await.unwrap();
    assert_eq!(task.payload, "2+2=?");
    assert_eq!(task.deadline, Some(deadline));

    store
        .update_task(&Task {
            payload: "3+3=?".to_string(),
            ..task
        })
        .await
        .unwrap();
    assert_eq!(store.get_task(id).await.unwrap().payload, "3+3=?");
    assert_eq!(store.list_tasks().await.unwrap().len(), 1);

    store.delete_task(id).await.unwrap();
    assert!(store.get_task(id).await.unwrap_err().is_not_found());
    assert!(store.delete_task(id).await.unwrap_err().is_not_found());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_update_missing_task_is_not_found(pool: PgPool) {
    let store = PgTaskStore::new(pool);
    let err = store
        .update_task(&Task {
            id: Uuid::new_v4(),
            payload: "ghost".to_string(),
            deadline: None,
        })
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_fan_out_twice_keeps_one_row(pool: PgPool) {
    let store = PgTaskStore::new(pool.clone());
    let lesson = Uuid::new_v4();
    let task_id = store.create_task(&NewTask::new("2+2=?")).await.unwrap();
    let targets = [ClassLesson::new("9A", lesson)];

    let first = store.create_assignments(task_id, &targets).await.unwrap();
    let second = store.create_assignments(task_id, &targets).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(first[0].payload, "2+2=?");
    assert_eq!(row_count(&pool, "assignment").await, 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_fan_out_mixed_new_and_existing_in_request_order(pool: PgPool) {
    let store = PgTaskStore::new(pool.clone());
    let lesson = Uuid::new_v4();
    let task_id = store.create_task(&NewTask::new("p")).await.unwrap();
    let existing = store
        .create_assignments(task_id, &[ClassLesson::new("9B", lesson)])
        .await
        .unwrap();

    let assignments = store
        .create_assignments(
            task_id,
            &[
                ClassLesson::new("9C", lesson),
                ClassLesson::new("9B", lesson),
                ClassLesson::new("9C", lesson),
                ClassLesson::new("9A", lesson),
            ],
        )
        .await
        .unwrap();

    let classes: Vec<&str> = assignments.iter().map(|a| a.class.as_str()).collect();
    assert_eq!(classes, vec!["9C", "9B", "9A"]);
    assert_eq!(assignments[1].id, existing[0].id);
    assert_eq!(row_count(&pool, "assignment").await, 3);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_fan_out_to_missing_task(pool: PgPool) {
    let store = PgTaskStore::new(pool.clone());
    let err = store
        .create_assignments(Uuid::new_v4(), &[ClassLesson::new("9A", Uuid::new_v4())])
        .await
        .unwrap_err();

    assert!(err.is_not_found());
    assert_eq!(row_count(&pool, "assignment").await, 0);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_fan_out_rolls_back_on_oversized_class(pool: PgPool) {
    let store = PgTaskStore::new(pool.clone());
    let lesson = Uuid::new_v4();
    let task_id = store.create_task(&NewTask::new("p")).await.unwrap();

    // class is VARCHAR(64); one bad row fails the whole batch
    let result = store
        .create_assignments(
            task_id,
            &[
                ClassLesson::new("9A", lesson),
                ClassLesson::new("X".repeat(65), lesson),
            ],
        )
        .await;

    assert!(result.is_err());
    assert_eq!(row_count(&pool, "assignment").await, 0);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_joint_creation_is_atomic(pool: PgPool) {
    let store = PgTaskStore::new(pool.clone());

    let created = store
        .create_task_with_assignment(&NewTaskWithAssignment {
            class: "10B".to_string(),
            lesson_id: Uuid::new_v4(),
            payload: "Essay".to_string(),
            deadline: None,
        })
        .await
        .unwrap();
    assert_eq!(store.get_task(created.task_id).await.unwrap().payload, "Essay");

    // The assignment insert fails, so the task insert must not survive
    let result = store
        .create_task_with_assignment(&NewTaskWithAssignment {
            class: "Y".repeat(65),
            lesson_id: Uuid::new_v4(),
            payload: "Orphan".to_string(),
            deadline: None,
        })
        .await;

    assert!(result.is_err());
    assert_eq!(row_count(&pool, "task").await, 1);
    assert_eq!(row_count(&pool, "assignment").await, 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_assignment_update_and_delete(pool: PgPool) {
    let store = PgTaskStore::new(pool);
    let task_id = store.create_task(&NewTask::new("p")).await.unwrap();
    let assignment = store
        .create_assignments(task_id, &[ClassLesson::new("9A", Uuid::new_v4())])
        .await
        .unwrap()
        .remove(0);

    store
        .update_assignment(&AssignmentUpdate {
            id: assignment.id,
            class: "9Z".to_string(),
            payload: "edited".to_string(),
        })
        .await
        .unwrap();
    let moved = store.assignments_by_class("9Z").await.unwrap();
    assert_eq!(moved[0].payload, "edited");

    store.delete_assignment(assignment.id).await.unwrap();
    assert!(store
        .delete_assignment(assignment.id)
        .await
        .unwrap_err()
        .is_not_found());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_assignment_moved_onto_occupied_slot_is_unique_violation(pool: PgPool) {
    let store = PgTaskStore::new(pool);
    let task_id = store.create_task(&NewTask::new("p")).await.unwrap();
    let lesson = Uuid::new_v4();
    let assignments = store
        .create_assignments(
            task_id,
            &[ClassLesson::new("9A", lesson), ClassLesson::new("9B", lesson)],
        )
        .await
        .unwrap();

    let err = store
        .update_assignment(&AssignmentUpdate {
            id: assignments[1].id,
            class: "9A".to_string(),
            payload: "p".to_string(),
        })
        .await
        .unwrap_err();

    match err {
        StoreError::Database { source, .. } => {
            assert_eq!(
                PgErrorCode::of(&source).as_deref(),
                Some(PgErrorCode::UNIQUE_VIOLATION)
            );
        }
        other => panic!("expected a database error, got {other:?}"),
    }
    assert_eq!(store.assignments_by_class("9B").await.unwrap().len(), 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_mark_upsert_overwrites(pool: PgPool) {
    let store = PgTaskStore::new(pool.clone());
    let (task, lesson, user) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());

    store
        .set_task_results(&TaskResult::new(task, lesson).with_mark(user, 5))
        .await
        .unwrap();
    store
        .set_task_results(
            &TaskResult::new(task, lesson)
                .with_mark(user, 7)
                .with_mark(user, 9),
        )
        .await
        .unwrap();

    let stored = store.task_results(task, lesson).await.unwrap();
    assert_eq!(stored.users_mark, vec![UserMark { user_id: user, mark: 9 }]);
    assert_eq!(row_count(&pool, "user_mark").await, 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_health_check(pool: PgPool) {
    let store = PgTaskStore::new(pool);
    assert!(store.health_check().await.unwrap());
}
