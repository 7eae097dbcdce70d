//! Headless driver for the Homestead farming economy.
//!
//! Opens the player's farm, reconciles it on a fixed interval and shuts
//! down cleanly on Ctrl-C. A presentation layer embeds `homestead-core`
//! directly; this binary keeps a farm's stored state current without one.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `homestead-config.yaml` (or the path in
//!    `HOMESTEAD_CONFIG`)
//! 2. Initialize structured logging (tracing)
//! 3. Select the store: `PostgreSQL` when a URL is configured, memory
//!    otherwise
//! 4. Open the farm (seeding the catalog and starting farm on first run)
//! 5. Reconcile every `tick_interval_ms` until Ctrl-C
//! 6. Log the final farm summary and journal check

mod error;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use homestead_core::{
    Homestead, HomesteadConfig, MemoryStore, Store, SystemClock, run_reconciler,
};
use homestead_db::{PgStore, PostgresPool};
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;

/// Default configuration file, relative to the working directory.
const DEFAULT_CONFIG_PATH: &str = "homestead-config.yaml";

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration, the store or the farm cannot be
/// loaded.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = load_config()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with_target(true)
        .init();

    info!(
        starting_money = %config.player.starting_money,
        tick_interval_ms = config.reconcile.tick_interval_ms,
        postgres = config.infrastructure.postgres_url.is_some(),
        "homestead-engine starting"
    );

    if let Some(url) = config.infrastructure.postgres_url.as_deref() {
        let pool = PostgresPool::connect_url(url)
            .await
            .map_err(EngineError::from)?;
        pool.run_migrations().await.map_err(EngineError::from)?;
        let result = run(PgStore::new(&pool), &config).await;
        pool.close().await;
        result?;
    } else {
        info!("no database configured, farm lives in memory for this run");
        run(MemoryStore::new(), &config).await?;
    }

    info!("homestead-engine stopped");
    Ok(())
}

/// Resolve the config path and load it, falling back to defaults when the
/// default file is absent.
fn load_config() -> Result<HomesteadConfig, EngineError> {
    let explicit = std::env::var_os("HOMESTEAD_CONFIG").map(PathBuf::from);
    let path = explicit
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
    if explicit.is_some() || path.exists() {
        Ok(HomesteadConfig::from_file(&path)?)
    } else {
        Ok(HomesteadConfig::parse("")?)
    }
}

/// Open the farm on `store` and reconcile until Ctrl-C.
async fn run<S: Store + 'static>(store: S, config: &HomesteadConfig) -> Result<(), EngineError> {
    let session = Arc::new(Homestead::open(store, SystemClock, config).await?);

    let view = session.view().await?;
    info!(
        money = %view.money,
        water = %view.water.status,
        plots = view.plots.len(),
        machines = view.machines.len(),
        "farm open"
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let interval = Duration::from_millis(config.reconcile.tick_interval_ms);
    let reconciler = tokio::spawn(run_reconciler(
        Arc::clone(&session),
        interval,
        shutdown_rx,
    ));

    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Ctrl-C received, shutting down"),
        Err(err) => tracing::warn!(error = %err, "signal handler failed, shutting down"),
    }
    let _ = shutdown_tx.send(true);

    let summary = reconciler.await.map_err(|e| EngineError::Reconciler {
        message: format!("{e}"),
    })?;
    let balance = session.verify_balance().await;
    let farm = session.snapshot().await;
    info!(
        passes = summary.passes,
        failures = summary.failures,
        corrections = summary.corrections,
        money = %farm.player.money,
        journal_balanced = balance.is_balanced(),
        "final state"
    );
    Ok(())
}
