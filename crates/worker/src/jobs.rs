//! Scheduled job loops.
//!
//! Each loop body is one idempotent engine call, so the same operation is
//! equally invocable from a one-off trigger; the loops only add cadence.
//! Runs until the shared cancellation token fires.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use cardvault_sync::{AlertEngine, PriceSyncEngine, TrendingEngine};

/// Run the stale-price sync on a fixed interval.
pub async fn price_sync(
    engine: Arc<PriceSyncEngine>,
    batch_size: i64,
    every: Duration,
    cancel: CancellationToken,
) {
    tracing::info!(interval_secs = every.as_secs(), batch_size, "price sync job started");
    let mut interval = tokio::time::interval(every);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("price sync job stopping");
                break;
            }
            _ = interval.tick() => {
                match engine.sync_stale_cards(batch_size).await {
                    Ok(outcome) => {
                        tracing::info!(
                            updated = outcome.updated,
                            failed = outcome.failed,
                            "price sync cycle done"
                        );
                        for error in &outcome.errors {
                            tracing::warn!(error, "price sync item failed");
                        }
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "price sync cycle failed");
                    }
                }
            }
        }
    }
}

/// Run the trending recompute on a fixed interval.
pub async fn trending(engine: Arc<TrendingEngine>, every: Duration, cancel: CancellationToken) {
    tracing::info!(interval_secs = every.as_secs(), "trending job started");
    let mut interval = tokio::time::interval(every);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("trending job stopping");
                break;
            }
            _ = interval.tick() => {
                match engine.recompute().await {
                    Ok(outcome) => {
                        tracing::info!(
                            scored = outcome.cards_scored,
                            failed = outcome.failed,
                            "trending cycle done"
                        );
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "trending cycle failed");
                    }
                }
            }
        }
    }
}

/// Run the alert sweep on a fixed interval.
pub async fn alerts(engine: Arc<AlertEngine>, every: Duration, cancel: CancellationToken) {
    tracing::info!(interval_secs = every.as_secs(), "alert job started");
    let mut interval = tokio::time::interval(every);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("alert job stopping");
                break;
            }
            _ = interval.tick() => {
                match engine.check_all_alerts().await {
                    Ok(outcome) => {
                        tracing::info!(
                            checked = outcome.checked,
                            triggered = outcome.triggered,
                            "alert sweep done"
                        );
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "alert sweep failed");
                    }
                }
            }
        }
    }
}
