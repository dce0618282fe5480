use crate::common::TestHarness;
use lesson_tasks::models::{TaskResult, UserMark};
use uuid::Uuid;

#[tokio::test]
async fn test_later_mark_overwrites_earlier() {
    let harness = TestHarness::new();
    let (task, lesson, user) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());

    harness
        .service
        .set_task_results(TaskResult::new(task, lesson).with_mark(user, 5))
        .await
        .unwrap();
    harness
        .service
        .set_task_results(TaskResult::new(task, lesson).with_mark(user, 9))
        .await
        .unwrap();

    let stored = harness.service.task_results(task, lesson).await.unwrap();
    assert_eq!(stored.users_mark, vec![UserMark { user_id: user, mark: 9 }]);
    assert_eq!(harness.store.mark_count(), 1);
}

#[tokio::test]
async fn test_marks_are_announced_in_one_event() {
    let harness = TestHarness::new();
    let (task, lesson) = (Uuid::new_v4(), Uuid::new_v4());
    let (alice, bob) = (Uuid::new_v4(), Uuid::new_v4());

    harness
        .service
        .set_task_results(
            TaskResult::new(task, lesson)
                .with_mark(alice, 4)
                .with_mark(bob, 5),
        )
        .await
        .unwrap();

    let events = harness.mark_events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].task_id, task);
    assert_eq!(events[0].lesson_id, lesson);
    assert_eq!(
        events[0].users_mark,
        vec![
            UserMark { user_id: alice, mark: 4 },
            UserMark { user_id: bob, mark: 5 },
        ]
    );
}

#[tokio::test]
async fn test_duplicate_user_in_one_submission_keeps_last_mark() {
    let harness = TestHarness::new();
    let (task, lesson, user) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());

    harness
        .service
        .set_task_results(
            TaskResult::new(task, lesson)
                .with_mark(user, 2)
                .with_mark(user, 7),
        )
        .await
        .unwrap();

    let stored = harness.service.task_results(task, lesson).await.unwrap();
    assert_eq!(stored.users_mark, vec![UserMark { user_id: user, mark: 7 }]);
    assert_eq!(harness.mark_events()[0].users_mark, stored.users_mark);
}

#[tokio::test]
async fn test_marks_are_scoped_to_task_and_lesson() {
    let harness = TestHarness::new();
    let (task, user) = (Uuid::new_v4(), Uuid::new_v4());
    let (monday, tuesday) = (Uuid::new_v4(), Uuid::new_v4());

    harness
        .service
        .set_task_results(TaskResult::new(task, monday).with_mark(user, 3))
        .await
        .unwrap();
    harness
        .service
        .set_task_results(TaskResult::new(task, tuesday).with_mark(user, 8))
        .await
        .unwrap();

    let monday_marks = harness.service.task_results(task, monday).await.unwrap();
    assert_eq!(monday_marks.users_mark[0].mark, 3);
    assert_eq!(harness.store.mark_count(), 2);
}

#[tokio::test]
async fn test_empty_submission_is_a_no_op() {
    let harness = TestHarness::new();

    harness
        .service
        .set_task_results(TaskResult::new(Uuid::new_v4(), Uuid::new_v4()))
        .await
        .unwrap();

    assert_eq!(harness.store.mark_count(), 0);
    assert_eq!(harness.events.attempts(), 0);
}

#[tokio::test]
async fn test_sink_outage_does_not_fail_mark_recording() {
    let harness = TestHarness::new();
    harness.events.set_available(false);
    let (task, lesson, user) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());

    harness
        .service
        .set_task_results(TaskResult::new(task, lesson).with_mark(user, 6))
        .await
        .unwrap();

    assert_eq!(harness.store.mark_count(), 1);
    assert!(harness.mark_events().is_empty());
}

#[tokio::test]
async fn test_store_outage_produces_no_event() {
    let harness = TestHarness::new();
    harness.store.set_available(false);

    let result = harness
        .service
        .set_task_results(TaskResult::new(Uuid::new_v4(), Uuid::new_v4()).with_mark(Uuid::new_v4(), 1))
        .await;

    assert!(result.is_err());
    assert_eq!(harness.events.attempts(), 0);
}
