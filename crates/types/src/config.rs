//! Centralized process configuration, loaded once at startup.
//!
//! Three binaries here (`api`, `jobs`, and the WebSocket gateway mounted
//! inside `api`) share the same knobs, so they are centralized into one
//! typed struct instead of scattering `std::env::var` calls per binary.

use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub redis_url: String,
    pub api_port: u16,
    pub cors_origin: String,

    pub bearer_signing_secret: String,

    /// How long a `select` hold survives without activity (§3/§4.3).
    pub selection_ttl: Duration,
    /// How long a `reserve`d booking survives before the expiration engine
    /// releases it (§4.3/§4.4).
    pub reservation_ttl: Duration,
    /// Max seats a single booking/selection batch may cover (§4.3).
    pub max_seats_per_booking: usize,

    /// Sliding-window rate limit for selection/reservation actions (§4.3).
    pub rate_limit_max_actions: u64,
    pub rate_limit_window: Duration,

    /// Expiration engine tick interval (§4.4).
    pub expiration_tick: Duration,
    /// Every Nth tick also sweeps orphaned holds with no backing booking.
    pub orphan_sweep_every_n_ticks: u32,
    /// Log a `warn` if a tick takes longer than this.
    pub tick_duration_warn_threshold: Duration,

    pub ws_ping_interval: Duration,
    pub ws_idle_timeout: Duration,

    pub payme_merchant_id: String,
    pub payme_key: String,
    pub click_secret_key: String,
    pub click_service_id: String,
    pub click_merchant_id: String,
}

impl Config {
    /// Reads configuration from the environment, falling back to sane
    /// defaults for local development.
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            database_url: require_env("DATABASE_URL")?,
            redis_url: env_or("REDIS_URL", "redis://127.0.0.1:6379"),
            api_port: env_or("API_PORT", "3000").parse()?,
            cors_origin: env_or("CORS_ORIGIN", "http://localhost:5173"),

            bearer_signing_secret: require_env("BEARER_SIGNING_SECRET")?,

            selection_ttl: secs_env("SELECTION_TTL_SECS", 30),
            reservation_ttl: secs_env("RESERVATION_TTL_SECS", 600),
            max_seats_per_booking: env_or("MAX_SEATS_PER_BOOKING", "10").parse()?,

            rate_limit_max_actions: env_or("RATE_LIMIT_MAX_ACTIONS", "20").parse()?,
            rate_limit_window: secs_env("RATE_LIMIT_WINDOW_SECS", 60),

            expiration_tick: secs_env("EXPIRATION_TICK_SECS", 30),
            orphan_sweep_every_n_ticks: env_or("ORPHAN_SWEEP_EVERY_N_TICKS", "10").parse()?,
            tick_duration_warn_threshold: ms_env("TICK_WARN_THRESHOLD_MS", 500),

            ws_ping_interval: secs_env("WS_PING_INTERVAL_SECS", 25),
            ws_idle_timeout: secs_env("WS_IDLE_TIMEOUT_SECS", 90),

            payme_merchant_id: env_or("PAYME_MERCHANT_ID", ""),
            payme_key: env_or("PAYME_KEY", ""),
            click_secret_key: env_or("CLICK_SECRET_KEY", ""),
            click_service_id: env_or("CLICK_SERVICE_ID", ""),
            click_merchant_id: env_or("CLICK_MERCHANT_ID", ""),
        })
    }
}

fn require_env(key: &str) -> anyhow::Result<String> {
    std::env::var(key).map_err(|_| anyhow::anyhow!("{key} must be set"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn secs_env(key: &str, default: u64) -> Duration {
    let secs: u64 = env_or(key, &default.to_string()).parse().unwrap_or(default);
    Duration::from_secs(secs)
}

fn ms_env(key: &str, default: u64) -> Duration {
    let ms: u64 = env_or(key, &default.to_string()).parse().unwrap_or(default);
    Duration::from_millis(ms)
}
