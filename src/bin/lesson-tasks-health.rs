//! # Lesson Tasks Health Check
//!
//! Loads configuration, wires the system together and reports whether the
//! store, cache and event sink are usable. Exits non-zero when the store is
//! unreachable; cache problems are reported but never fatal.

use anyhow::Context;
use clap::{Parser, Subcommand};
use lesson_tasks::config::{redact_url, ConfigManager};
use lesson_tasks::database::run_migrations;
use lesson_tasks::logging::init_structured_logging;
use lesson_tasks::SystemContext;
use std::path::PathBuf;
use std::process;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "lesson-tasks-health")]
#[command(about = "Check connectivity of the lesson task core")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    /// Environment to load (defaults to LESSON_TASKS_ENV, then APP_ENV)
    #[arg(short, long)]
    environment: Option<String>,

    /// Configuration directory (default: config)
    #[arg(short, long)]
    config_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Connect to every backend and report health
    Check {
        /// Apply pending schema migrations before checking
        #[arg(long)]
        migrate: bool,
    },

    /// Print the effective configuration with secrets redacted
    Config,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Some(Commands::Config) => show_config(&cli).await,
        Some(Commands::Check { migrate }) => check(&cli, migrate).await,
        None => check(&cli, false).await,
    };

    if let Err(e) = result {
        error!("Health check failed: {e:#}");
        eprintln!("❌ {e:#}");
        process::exit(1);
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<std::sync::Arc<ConfigManager>> {
    let environment = cli
        .environment
        .clone()
        .unwrap_or_else(ConfigManager::detect_environment);

    let manager = ConfigManager::load_from_directory_with_env(cli.config_dir.clone(), &environment)
        .context("failed to load configuration")?;

    init_structured_logging(manager.environment(), &manager.config().logging);
    Ok(manager)
}

async fn show_config(cli: &Cli) -> anyhow::Result<()> {
    let manager = load_config(cli)?;
    let mut config = manager.config().clone();
    config.database.url = redact_url(&config.database.url);
    if let Some(redis) = config.cache.redis.as_mut() {
        redis.url = redact_url(&redis.url);
    }

    println!("Environment: {}", manager.environment());
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}

async fn check(cli: &Cli, migrate: bool) -> anyhow::Result<()> {
    let manager = load_config(cli)?;

    let context = SystemContext::from_config(manager)
        .await
        .context("failed to bootstrap system")?;

    if migrate {
        run_migrations(&context.database_pool)
            .await
            .context("failed to apply migrations")?;
    }

    let health = context
        .task_service()
        .health_check()
        .await
        .context("store health check failed")?;

    println!("Store:       {}", status(health.store));
    println!(
        "Cache:       {} ({})",
        status(health.cache),
        health.cache_provider
    );
    println!("Event sink:  {}", health.event_sink);

    context.shutdown().await;

    if !health.store {
        anyhow::bail!("store reported unhealthy");
    }

    info!("All checks passed");
    Ok(())
}

fn status(healthy: bool) -> &'static str {
    if healthy {
        "ok"
    } else {
        "unavailable"
    }
}
