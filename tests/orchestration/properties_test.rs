use crate::common::TestHarness;
use lesson_tasks::models::{ClassLesson, NewTask, TaskResult};
use proptest::prelude::*;
use std::collections::{BTreeMap, HashSet};
use uuid::Uuid;

fn class_strategy() -> impl Strategy<Value = String> {
    prop::sample::select(vec!["9A", "9B", "10A", "10B", "11C"]).prop_map(str::to_string)
}

/// Targets drawn from a small pool so repeats are common
fn targets_strategy() -> impl Strategy<Value = Vec<(String, usize)>> {
    prop::collection::vec((class_strategy(), 0..3usize), 0..12)
}

/// Submissions of (user index, mark) pairs
fn submissions_strategy() -> impl Strategy<Value = Vec<Vec<(usize, i32)>>> {
    prop::collection::vec(prop::collection::vec((0..4usize, 0..=10i32), 1..6), 1..5)
}

proptest! {
    /// Property: repeating a fan-out changes nothing and returns the same assignments
    #[test]
    fn fan_out_is_idempotent(raw_targets in targets_strategy()) {
        tokio_test::block_on(async {
            let harness = TestHarness::new();
            let lessons: Vec<Uuid> = (0..3).map(|_| Uuid::new_v4()).collect();
            let targets: Vec<ClassLesson> = raw_targets
                .iter()
                .map(|(class, lesson)| ClassLesson::new(class.clone(), lessons[*lesson]))
                .collect();
            let distinct: HashSet<&ClassLesson> = targets.iter().collect();

            let task_id = harness.service.create_task(NewTask::new("p")).await.unwrap();
            let first = harness.service.create_assignments(task_id, &targets).await.unwrap();
            let second = harness.service.create_assignments(task_id, &targets).await.unwrap();

            prop_assert_eq!(&first, &second);
            prop_assert_eq!(first.len(), distinct.len());
            prop_assert_eq!(harness.store.assignment_count(), distinct.len());
            prop_assert_eq!(harness.assigned_events().len(), 2 * distinct.len());
            Ok(())
        })?;
    }

    /// Property: the stored mark of every user is the last one submitted
    #[test]
    fn stored_marks_are_last_submitted(submissions in submissions_strategy()) {
        tokio_test::block_on(async {
            let harness = TestHarness::new();
            let users: Vec<Uuid> = (0..4).map(|_| Uuid::new_v4()).collect();
            let (task, lesson) = (Uuid::new_v4(), Uuid::new_v4());
            let mut expected = BTreeMap::new();

            for submission in &submissions {
                let mut result = TaskResult::new(task, lesson);
                for (user, mark) in submission {
                    result = result.with_mark(users[*user], *mark);
                    expected.insert(users[*user], *mark);
                }
                harness.service.set_task_results(result).await.unwrap();
            }

            let stored: BTreeMap<Uuid, i32> = harness
                .service
                .task_results(task, lesson)
                .await
                .unwrap()
                .users_mark
                .into_iter()
                .map(|m| (m.user_id, m.mark))
                .collect();

            prop_assert_eq!(stored, expected);
            prop_assert_eq!(harness.mark_events().len(), submissions.len());
            Ok(())
        })?;
    }
}
