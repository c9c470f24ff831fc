//! The expiration engine (§4.4): on each tick, moves every `PENDING` booking
//! past its `expiresAt` to `EXPIRED` and frees its seats, then — every Nth
//! tick — sweeps Redis holds that outlived their owning booking. Goes
//! through `Coordinator::expire_due`/`sweep_orphans` so the same
//! Postgres-lock-then-Redis-release path used by `confirm`/`cancel` also
//! backs expiry.

use std::sync::Arc;
use std::time::Instant;

use seatflow_core::Coordinator;
use seatflow_db::queries;
use sqlx::PgPool;

pub async fn run_expiration_tick(coordinator: &Arc<Coordinator>, pool: &PgPool, tick: u64) -> anyhow::Result<()> {
    let started = Instant::now();

    let events = coordinator.expire_due().await?;
    if !events.is_empty() {
        tracing::info!(count = events.len(), "expired pending bookings");
    }

    let config = coordinator.config();
    if tick % config.orphan_sweep_every_n_ticks as u64 == 0 {
        let session_ids = queries::sessions::list_active_ids(pool).await?;
        let mut swept = 0;
        for session_id in session_ids {
            swept += coordinator.sweep_orphans(session_id).await?;
        }
        if swept > 0 {
            tracing::info!(count = swept, "orphan holds swept this tick");
        }
    }

    let elapsed = started.elapsed();
    if elapsed > config.tick_duration_warn_threshold {
        tracing::warn!(?elapsed, tick, "expiration tick exceeded warn threshold");
    } else {
        tracing::debug!(?elapsed, tick, "expiration tick completed");
    }

    Ok(())
}
