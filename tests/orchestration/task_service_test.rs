use crate::common::TestHarness;
use chrono::{TimeZone, Utc};
use lesson_tasks::cache::{CacheProvider, InMemoryCacheService};
use lesson_tasks::config::CacheConfig;
use lesson_tasks::database::{InMemoryTaskStore, TaskStore};
use lesson_tasks::events::InMemoryEventSink;
use lesson_tasks::models::{NewTask, Task};
use lesson_tasks::{ErrorClass, TaskService};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

#[tokio::test]
async fn test_created_task_reads_back_unchanged() {
    let harness = TestHarness::new();
    let deadline = Utc.with_ymd_and_hms(2025, 9, 1, 8, 30, 0).unwrap();

    let id = harness
        .service
        .create_task(NewTask::new("Solve 2+2").with_deadline(deadline))
        .await
        .unwrap();
    let task = harness.service.get_task(id).await.unwrap();

    assert_eq!(task.id, id);
    assert_eq!(task.payload, "Solve 2+2");
    assert_eq!(task.deadline, Some(deadline));
}

#[tokio::test]
async fn test_cache_hit_skips_store() {
    let harness = TestHarness::new();
    let id = harness
        .service
        .create_task(NewTask::new("cached"))
        .await
        .unwrap();

    harness.service.get_task(id).await.unwrap();
    harness.service.get_task(id).await.unwrap();

    assert_eq!(harness.store.task_reads(), 0);
}

#[tokio::test]
async fn test_cache_miss_populates_cache() {
    let harness = TestHarness::new();
    // Written behind the service's back, so the cache knows nothing about it
    let id = harness
        .store
        .create_task(&NewTask::new("cold"))
        .await
        .unwrap();

    harness.service.get_task(id).await.unwrap();
    harness.service.get_task(id).await.unwrap();

    assert_eq!(harness.store.task_reads(), 1);
    assert!(harness.cache.contains_key(&harness.service.cache().key_for(id)));
}

#[tokio::test]
async fn test_unreachable_cache_does_not_fail_reads_or_writes() {
    let harness = TestHarness::with_unreachable_cache();

    let id = harness
        .service
        .create_task(NewTask::new("resilient"))
        .await
        .unwrap();
    let task = harness.service.get_task(id).await.unwrap();
    assert_eq!(task.payload, "resilient");

    harness
        .service
        .update_task(Task {
            payload: "still resilient".to_string(),
            ..task
        })
        .await
        .unwrap();
    harness.service.delete_task(id).await.unwrap();

    assert_eq!(harness.store.task_count(), 0);
}

#[tokio::test]
async fn test_update_refreshes_cache_and_returns_id() {
    let harness = TestHarness::new();
    let id = harness.service.create_task(NewTask::new("v1")).await.unwrap();

    let returned = harness
        .service
        .update_task(Task {
            id,
            payload: "v2".to_string(),
            deadline: None,
        })
        .await
        .unwrap();

    assert_eq!(returned, id);
    assert_eq!(harness.service.get_task(id).await.unwrap().payload, "v2");
    assert_eq!(harness.store.task_reads(), 0);
}

#[tokio::test]
async fn test_update_missing_task_is_not_found() {
    let harness = TestHarness::new();
    let err = harness
        .service
        .update_task(Task {
            id: Uuid::new_v4(),
            payload: "ghost".to_string(),
            deadline: None,
        })
        .await
        .unwrap_err();

    assert!(err.is_not_found());
    assert_eq!(err.operation(), "update task");
}

#[tokio::test]
async fn test_delete_invalidates_cache() {
    let harness = TestHarness::new();
    let id = harness.service.create_task(NewTask::new("bye")).await.unwrap();
    let key = harness.service.cache().key_for(id);
    assert!(harness.cache.contains_key(&key));

    harness.service.delete_task(id).await.unwrap();

    assert!(!harness.cache.contains_key(&key));
    let err = harness.service.get_task(id).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_delete_missing_task_is_not_found() {
    let harness = TestHarness::new();
    let err = harness
        .service
        .delete_task(Uuid::new_v4())
        .await
        .unwrap_err();

    assert!(err.is_not_found());
    assert_eq!(err.classification(), ErrorClass::ClientCorrectable);
}

#[tokio::test]
async fn test_store_outage_is_a_server_failure() {
    let harness = TestHarness::new();
    harness.store.set_available(false);

    let err = harness
        .service
        .create_task(NewTask::new("lost"))
        .await
        .unwrap_err();

    assert!(!err.is_not_found());
    assert_eq!(err.classification(), ErrorClass::ServerFailure);
    assert!(harness.events.events().is_empty());
}

#[tokio::test]
async fn test_list_tasks() {
    let harness = TestHarness::new();
    assert!(harness.service.list_tasks().await.unwrap().is_empty());

    let first = harness.service.create_task(NewTask::new("a")).await.unwrap();
    let second = harness.service.create_task(NewTask::new("b")).await.unwrap();

    let mut ids: Vec<Uuid> = harness
        .service
        .list_tasks()
        .await
        .unwrap()
        .into_iter()
        .map(|t| t.id)
        .collect();
    ids.sort();
    let mut expected = vec![first, second];
    expected.sort();
    assert_eq!(ids, expected);
}

#[tokio::test]
async fn test_expired_cache_entry_reloads_from_store() {
    let store = Arc::new(InMemoryTaskStore::new());
    let cache = InMemoryCacheService::new();
    let service = TaskService::new(
        store.clone(),
        CacheProvider::in_memory(cache.clone()).with_ttl(Duration::from_millis(30)),
        Arc::new(InMemoryEventSink::new()),
    );

    let id = service.create_task(NewTask::new("fleeting")).await.unwrap();
    tokio::time::sleep(Duration::from_millis(80)).await;
    assert!(!cache.contains_key(&service.cache().key_for(id)));

    assert_eq!(service.get_task(id).await.unwrap().payload, "fleeting");
    assert_eq!(store.task_reads(), 1);
}

#[tokio::test]
async fn test_unbounded_configured_ttl_does_not_break_reads() {
    let config = CacheConfig {
        backend: "memory".to_string(),
        ttl_seconds: u64::MAX,
        ..CacheConfig::default()
    };
    let store = Arc::new(InMemoryTaskStore::new());
    let service = TaskService::new(
        store.clone(),
        CacheProvider::from_config_graceful(&config).await,
        Arc::new(InMemoryEventSink::new()),
    );

    let id = service.create_task(NewTask::new("forever")).await.unwrap();
    assert_eq!(service.get_task(id).await.unwrap().payload, "forever");
    assert_eq!(store.task_reads(), 0);
}
