//! Configuration loading against the shipped `config/` directory

use lesson_tasks::config::{ConfigManager, LogFormat};
use std::path::PathBuf;

fn shipped_config_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("config")
}

#[test]
fn test_shipped_base_configuration_loads() {
    let manager =
        ConfigManager::load_from_directory_with_env(Some(shipped_config_dir()), "development")
            .unwrap();
    let config = manager.config();

    assert_eq!(config.cache.backend, "redis");
    assert_eq!(config.cache.ttl_seconds, 3600);
    assert_eq!(config.cache.key_prefix, "task:");
    assert!(config.cache.redis.is_some());
    assert_eq!(config.events.backend, "pgmq");
    assert_eq!(config.events.queue_name, "lesson_task_events");
}

#[test]
fn test_shipped_test_overlay_uses_in_memory_backends() {
    let manager =
        ConfigManager::load_from_directory_with_env(Some(shipped_config_dir()), "test").unwrap();
    let config = manager.config();

    assert_eq!(config.cache.backend, "memory");
    assert_eq!(config.events.backend, "memory");
    assert_eq!(config.database.max_connections, 5);
    assert_eq!(config.logging.level.as_deref(), Some("warn"));
}

#[test]
fn test_shipped_production_overlay() {
    let manager =
        ConfigManager::load_from_directory_with_env(Some(shipped_config_dir()), "production")
            .unwrap();
    let config = manager.config();

    assert_eq!(config.logging.format, LogFormat::Json);
    assert_eq!(config.database.max_connections, 30);
    // Inherited from the base file
    assert_eq!(config.cache.ttl_seconds, 3600);
}
