use crate::cache::CacheProvider;
use crate::config::{ConfigManager, EventsConfig};
use crate::database::{create_pool, PgTaskStore};
use crate::error::BootstrapError;
use crate::events::{EventSink, InMemoryEventSink, NoOpEventSink, PgmqEventSink};
use crate::orchestration::TaskService;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Shared system dependencies and configuration
///
/// Dependency injection container wiring the task service to its adapters:
/// - Database connection pool and the PostgreSQL task store
/// - Cache provider (degrades to NoOp when the backend is unreachable)
/// - Event sink selected by `events.backend`
pub struct SystemContext {
    /// System instance ID
    pub system_id: Uuid,

    pub config_manager: Arc<ConfigManager>,

    pub database_pool: PgPool,

    pub task_service: TaskService,

    /// Kept separately so buffered events can be flushed on shutdown
    pgmq_sink: Option<Arc<PgmqEventSink>>,
}

impl std::fmt::Debug for SystemContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SystemContext")
            .field("system_id", &self.system_id)
            .field("environment", &self.config_manager.environment())
            .field(
                "database_pool",
                &format!("PgPool(size={})", self.database_pool.size()),
            )
            .field("cache_provider", &self.task_service.cache().provider_name())
            .finish()
    }
}

impl SystemContext {
    /// Load configuration for the detected environment and bootstrap
    pub async fn new() -> Result<Self, BootstrapError> {
        let config_manager = ConfigManager::load()?;
        Self::from_config(config_manager).await
    }

    pub async fn from_config(config_manager: Arc<ConfigManager>) -> Result<Self, BootstrapError> {
        info!(
            environment = config_manager.environment(),
            "Initializing SystemContext from configuration"
        );

        let database_pool = create_pool(&config_manager.config().database)
            .await
            .map_err(BootstrapError::Database)?;

        Self::from_pool_and_config(database_pool, config_manager).await
    }

    /// Build every component on top of an existing pool
    pub async fn from_pool_and_config(
        database_pool: PgPool,
        config_manager: Arc<ConfigManager>,
    ) -> Result<Self, BootstrapError> {
        let config = config_manager.config();

        let store = Arc::new(PgTaskStore::new(database_pool.clone()));
        let cache = CacheProvider::from_config_graceful(&config.cache).await;
        let (events, pgmq_sink) = Self::create_event_sink(&config.events, &database_pool).await?;

        let task_service = TaskService::new(store, cache, events);

        let system_id = Uuid::new_v4();
        info!(
            system_id = %system_id,
            cache_provider = task_service.cache().provider_name(),
            event_backend = %config.events.backend,
            "SystemContext initialized"
        );

        Ok(Self {
            system_id,
            config_manager,
            database_pool,
            task_service,
            pgmq_sink,
        })
    }

    async fn create_event_sink(
        config: &EventsConfig,
        pool: &PgPool,
    ) -> Result<(Arc<dyn EventSink>, Option<Arc<PgmqEventSink>>), BootstrapError> {
        match config.backend.as_str() {
            "pgmq" => {
                let sink = Arc::new(PgmqEventSink::new(pool.clone(), config).await?);
                let events: Arc<dyn EventSink> = sink.clone();
                Ok((events, Some(sink)))
            }
            "memory" | "in-memory" => {
                let events: Arc<dyn EventSink> = Arc::new(InMemoryEventSink::new());
                Ok((events, None))
            }
            "noop" | "none" => {
                let events: Arc<dyn EventSink> = Arc::new(NoOpEventSink);
                Ok((events, None))
            }
            other => {
                warn!(backend = other, "Unknown event backend, events will be discarded");
                let events: Arc<dyn EventSink> = Arc::new(NoOpEventSink);
                Ok((events, None))
            }
        }
    }

    pub fn config_manager(&self) -> &Arc<ConfigManager> {
        &self.config_manager
    }

    pub fn task_service(&self) -> &TaskService {
        &self.task_service
    }

    /// Flush buffered events and close the pool
    pub async fn shutdown(&self) {
        if let Some(sink) = &self.pgmq_sink {
            sink.shutdown().await;
        }
        self.database_pool.close().await;
        info!(system_id = %self.system_id, "SystemContext shut down");
    }
}
