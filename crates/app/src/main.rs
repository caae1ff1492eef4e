//! Campusloop - mentorship slot booking service
//!
//! Wires the booking engines to the SQLite store and the notification
//! server, and runs the periodic expiry sweep.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::broadcast;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod sweep;

use campusloop_core::{Database, SlotEngine};
use campusloop_notify::{ConnectionRegistry, NotifyServer};

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    tracing::info!("Starting Campusloop");

    if let Err(e) = run().await {
        tracing::error!("Fatal: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> campusloop_core::Result<()> {
    let config = config::Config::load()?;

    let db_path = config.resolve_database_path()?;
    let db = Arc::new(Mutex::new(Database::open(&db_path)?));
    tracing::info!(path = %db_path.display(), "Database opened");

    // The registry is the engines' notifier; constructed once and
    // injected, never reached through globals
    let registry = Arc::new(ConnectionRegistry::new());
    let server = NotifyServer::start(config.port, registry.clone())
        .await
        .map_err(|e| campusloop_core::Error::Io(std::io::Error::other(e)))?;

    let slot_engine = Arc::new(SlotEngine::new(db, registry));

    // Expiry sweep on a fixed timer, independent of request handling
    let (shutdown_tx, _) = broadcast::channel(1);
    let sweep_handle = tokio::spawn(sweep::sweep_task(
        slot_engine,
        Duration::from_secs(config.sweep_interval_minutes * 60),
        shutdown_tx.subscribe(),
    ));

    tracing::info!(port = server.addr().port(), "Campusloop running");

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down");

    let _ = shutdown_tx.send(());
    server.shutdown();
    let _ = sweep_handle.await;

    Ok(())
}
