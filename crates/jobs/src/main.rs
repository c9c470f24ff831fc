mod jobs;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use seatflow_core::{Coordinator, PgCatalog, RedisHolds};
use seatflow_holds::HoldStore;
use seatflow_types::Config;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "seatflow_jobs=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Seatflow background jobs...");

    let config = Arc::new(Config::from_env()?);
    let pool = seatflow_db::create_pool(&config.database_url).await?;
    tracing::info!("database connection established");

    let holds = HoldStore::connect(&config.redis_url).await?;
    tracing::info!("hold store connection established");

    let coordinator = Arc::new(Coordinator::new(
        Arc::new(PgCatalog::new(pool.clone())),
        Arc::new(RedisHolds::new(holds)),
        config.clone(),
    ));

    let scheduler = JobScheduler::new().await?;

    // Guards against a tick still running when the next one fires — ticks
    // are fast in practice, but a slow Postgres round-trip shouldn't let two
    // overlap and race each other's `expire_due_pending` scan.
    let running = Arc::new(AtomicBool::new(false));
    let tick_count = Arc::new(std::sync::atomic::AtomicU64::new(0));

    let coordinator_clone = coordinator.clone();
    let pool_clone = pool.clone();
    let running_clone = running.clone();
    let expiration_job = Job::new_repeated_async(config.expiration_tick, move |_uuid, _l| {
        let coordinator = coordinator_clone.clone();
        let pool = pool_clone.clone();
        let running = running_clone.clone();
        let tick = tick_count.fetch_add(1, Ordering::SeqCst);
        Box::pin(async move {
            if running.swap(true, Ordering::SeqCst) {
                tracing::warn!("expiration tick skipped, previous tick still running");
                return;
            }
            if let Err(e) = jobs::run_expiration_tick(&coordinator, &pool, tick).await {
                tracing::error!("expiration tick failed: {e}");
            }
            running.store(false, Ordering::SeqCst);
        })
    })?;

    scheduler.add(expiration_job).await?;
    tracing::info!(interval = ?config.expiration_tick, "registered expiration engine tick");

    scheduler.start().await?;
    tracing::info!("job scheduler started");

    loop {
        tokio::time::sleep(std::time::Duration::from_secs(3600)).await;
    }
}
