//! Periodic expiry sweep
//!
//! Runs the slot engine's expiry sweep on a fixed interval, independent
//! of request handling, until shutdown is signalled.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tracing::{debug, warn};

use campusloop_core::SlotEngine;

/// Sweep task - advances expired slots to completed on a fixed interval
pub async fn sweep_task(
    engine: Arc<SlotEngine>,
    interval: Duration,
    mut shutdown_rx: broadcast::Receiver<()>,
) {
    loop {
        tokio::select! {
            _ = tokio::time::sleep(interval) => {
                match engine.sweep_expired() {
                    Ok(swept) if !swept.is_empty() => {
                        debug!(count = swept.len(), "Expiry sweep completed slots");
                    }
                    Ok(_) => {}
                    Err(e) => {
                        // The next tick retries; a failed sweep only
                        // delays completion
                        warn!(error = %e, "Expiry sweep failed");
                    }
                }
            }
            _ = shutdown_rx.recv() => {
                debug!("Sweep task shutting down");
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use campusloop_core::{Database, NullNotifier};

    #[tokio::test]
    async fn test_sweep_task_stops_on_shutdown() {
        let db = Arc::new(Mutex::new(Database::open_in_memory().unwrap()));
        let engine = Arc::new(SlotEngine::new(db, Arc::new(NullNotifier)));

        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let handle = tokio::spawn(sweep_task(
            engine,
            Duration::from_millis(10),
            shutdown_rx,
        ));

        tokio::time::sleep(Duration::from_millis(50)).await;
        shutdown_tx.send(()).unwrap();

        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("Sweep task did not stop")
            .unwrap();
    }
}
