//! EventHub server: event membership orchestration.
//!
//! Wires the store backend, the membership services, and the periodic
//! reconciler, then runs until Ctrl+C or SIGTERM.

use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{EnvFilter, fmt};

use eventhub_core::config::{AppConfig, StoreBackend};
use eventhub_database::{DatabasePool, MemoryEventStore, MemoryUserStore};
use eventhub_service::{ReconcileScheduler, RequestContext, Services};

#[tokio::main]
async fn main() {
    let env = std::env::var("EVENTHUB_ENV").unwrap_or_else(|_| "development".to_string());
    let config = match AppConfig::load(&env) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);
    tracing::info!(env = %env, backend = ?config.store.backend, "Configuration loaded");

    if let Err(e) = run(config).await {
        tracing::error!("Server error: {e:#}");
        std::process::exit(1);
    }
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

/// Main server run function
async fn run(config: AppConfig) -> anyhow::Result<()> {
    tracing::info!("Starting EventHub v{}", env!("CARGO_PKG_VERSION"));

    // ── Step 1: Store backend ────────────────────────────────────
    let (services, pool) = match config.store.backend {
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory stores; nothing survives a restart");
            let services = Services::new(
                Arc::new(MemoryEventStore::new()),
                Arc::new(MemoryUserStore::new()),
                &config.membership,
            );
            (services, None)
        }
        StoreBackend::Postgres => {
            let pool = DatabasePool::connect(&config.database)
                .await
                .context("database connection failed")?;
            eventhub_database::migration::run_migrations(pool.pool())
                .await
                .context("migrations failed")?;
            let (events, users) = pool.stores();
            let services = Services::new(Arc::new(events), Arc::new(users), &config.membership);
            (services, Some(pool))
        }
    };

    // ── Step 2: Startup reconciliation ───────────────────────────
    if config.reconciler.run_on_startup {
        tracing::info!("Running startup membership reconciliation");
        let summary = services
            .reconciler
            .reconcile_all(&RequestContext::system())
            .await
            .context("startup reconciliation failed")?;
        if !summary.failed.is_empty() {
            tracing::warn!(failed = summary.failed.len(), "Some events could not be reconciled");
        }
    }

    // ── Step 3: Periodic reconciler ──────────────────────────────
    let mut scheduler = if config.reconciler.enabled {
        let scheduler = ReconcileScheduler::new(Arc::clone(&services.reconciler)).await?;
        scheduler.register(&config.reconciler).await?;
        scheduler.start().await?;
        Some(scheduler)
    } else {
        tracing::info!("Periodic reconciliation disabled");
        None
    };

    tracing::info!("EventHub ready");
    shutdown_signal().await?;
    tracing::info!("Shutdown signal received, stopping...");

    // ── Step 4: Shutdown ─────────────────────────────────────────
    if let Some(scheduler) = scheduler.as_mut() {
        scheduler.shutdown().await?;
    }
    if let Some(pool) = pool {
        pool.close().await;
    }

    tracing::info!("EventHub shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() -> anyhow::Result<()> {
    #[cfg(unix)]
    {
        let mut terminate =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                .context("failed to install SIGTERM handler")?;
        tokio::select! {
            result = tokio::signal::ctrl_c() => result.context("failed to listen for Ctrl+C")?,
            _ = terminate.recv() => {},
        }
    }

    #[cfg(not(unix))]
    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl+C")?;

    Ok(())
}
