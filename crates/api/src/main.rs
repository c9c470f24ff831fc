mod middleware;
mod response;
mod routes;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use seatflow_core::{Coordinator, PgCatalog, RedisHolds};
use seatflow_holds::HoldStore;
use seatflow_integrations::click::ClickGateway;
use seatflow_integrations::payme::PaymeGateway;
use seatflow_realtime::{ws_handler, RealtimeState, RoomRegistry};
use seatflow_types::Config;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use middleware::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "seatflow_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Seatflow API server...");

    let config = Arc::new(Config::from_env()?);

    let pool = seatflow_db::create_pool(&config.database_url).await?;
    seatflow_db::MIGRATOR.run(&pool).await?;
    tracing::info!("database connection established");

    let holds = HoldStore::connect(&config.redis_url).await?;
    tracing::info!("hold store connection established");

    let coordinator = Arc::new(Coordinator::new(
        Arc::new(PgCatalog::new(pool.clone())),
        Arc::new(RedisHolds::new(holds.clone())),
        config.clone(),
    ));

    let payme = Arc::new(PaymeGateway::new(pool.clone(), coordinator.clone()));
    let click = Arc::new(ClickGateway::new(pool.clone(), coordinator.clone(), config.click_secret_key.clone()));

    let state = AppState {
        db: pool,
        coordinator: coordinator.clone(),
        config: config.clone(),
        payme,
        click,
    };

    let realtime_state = RealtimeState {
        coordinator,
        rooms: RoomRegistry::new(holds),
    };

    let cors = CorsLayer::new()
        .allow_origin(config.cors_origin.parse::<axum::http::HeaderValue>()?)
        .allow_methods(Any)
        .allow_headers(Any);

    let realtime_routes = Router::new()
        .route("/ws/bookings", get(ws_handler))
        .with_state(realtime_state);

    let app = Router::new()
        .route("/health", get(health_check))
        .route("/payments", post(routes::payments::create_payment).get(routes::payments::list_payments))
        .route("/payments/refund", post(routes::payments::refund_payment))
        .route("/payments/payme/callback", post(routes::payments::payme_callback))
        .route("/payments/click/prepare", post(routes::payments::click_prepare))
        .route("/payments/click/complete", post(routes::payments::click_complete))
        .route("/payments/:id", get(routes::payments::get_payment))
        .route("/payments/:id/transactions", get(routes::payments::list_transactions))
        .with_state(state)
        .merge(realtime_routes)
        .layer(cors);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.api_port));
    let listener = TcpListener::bind(addr).await?;

    tracing::info!("server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

async fn health_check() -> &'static str {
    "OK"
}
