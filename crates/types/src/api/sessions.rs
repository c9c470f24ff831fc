use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single seat as rendered to clients: durable status plus who (if anyone)
/// currently holds it, per §4.5's `session_state` event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeatSnapshot {
    pub id: Uuid,
    pub label: String,
    pub tariff_id: Uuid,
    pub status: String,
    /// Present when `status == "reserved"` and the caller is the holder, so
    /// the client can distinguish "you" from "another_user" per §4.5.
    pub held_by_you: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub id: Uuid,
    pub title: String,
    pub starts_at: DateTime<Utc>,
    pub status: String,
    pub available_seats: i32,
    pub total_seats: i32,
    pub seats: Vec<SeatSnapshot>,
}
