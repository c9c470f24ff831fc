//! In-memory fakes for `SeatCatalog`/`HoldBackend`, driving the property and
//! scenario tests below without a live Postgres/Redis — the same
//! fake-adapter style the retrieval pack's `jonathanbelolo-composable-rust`
//! examples use for port testing.

mod fakes;
mod scenarios;

use std::sync::Arc;
use std::time::Duration;

use seatflow_types::Config;
use uuid::Uuid;

use crate::coordinator::Coordinator;
use fakes::{InMemoryCatalog, InMemoryHolds};

fn test_config() -> Config {
    Config {
        database_url: String::new(),
        redis_url: String::new(),
        api_port: 0,
        cors_origin: String::new(),
        bearer_signing_secret: "test-secret".into(),
        selection_ttl: Duration::from_secs(30),
        reservation_ttl: Duration::from_secs(600),
        max_seats_per_booking: 10,
        rate_limit_max_actions: 20,
        rate_limit_window: Duration::from_secs(60),
        expiration_tick: Duration::from_secs(30),
        orphan_sweep_every_n_ticks: 10,
        tick_duration_warn_threshold: Duration::from_millis(500),
        ws_ping_interval: Duration::from_secs(25),
        ws_idle_timeout: Duration::from_secs(90),
        payme_merchant_id: String::new(),
        payme_key: String::new(),
        click_secret_key: String::new(),
        click_service_id: String::new(),
        click_merchant_id: String::new(),
    }
}

/// Builds a coordinator wired to fresh in-memory fakes, seeded with one
/// session holding `seat_count` available seats under a single tariff.
fn harness(seat_count: usize) -> (Coordinator, Uuid, Vec<Uuid>) {
    let (catalog, session_id, seat_ids) = InMemoryCatalog::seeded(seat_count);
    let holds = InMemoryHolds::default();
    let coordinator = Coordinator::new(Arc::new(catalog), Arc::new(holds), Arc::new(test_config()));
    (coordinator, session_id, seat_ids)
}
