pub mod coordinator;
pub mod pricing;
pub mod ports;

pub use coordinator::Coordinator;
pub use ports::{HoldBackend, PgCatalog, RateLimitOutcome, RedisEventPublisher, RedisHolds, SeatCatalog, SelectOutcome};

#[cfg(test)]
mod tests;
