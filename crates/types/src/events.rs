//! Domain events the seat-state coordinator (C3) emits after a successful
//! mutation. These are transport-agnostic: the `realtime` crate (C5)
//! translates them into WebSocket wire messages, and the `jobs` binary (C4)
//! publishes them over the hold store's pub/sub bus for cross-worker
//! delivery (§4.2/§4.5).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SeatEvent {
    SeatSelected {
        session_id: Uuid,
        seat_id: Uuid,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    },
    SeatReleased {
        session_id: Uuid,
        seat_id: Uuid,
        user_id: Uuid,
    },
    SeatsReserved {
        session_id: Uuid,
        seat_ids: Vec<Uuid>,
        user_id: Uuid,
        booking_id: Uuid,
        expires_at: DateTime<Utc>,
    },
    BookingConfirmed {
        session_id: Uuid,
        seat_ids: Vec<Uuid>,
        booking_id: Uuid,
    },
    BookingCancelled {
        session_id: Uuid,
        seat_ids: Vec<Uuid>,
        booking_id: Uuid,
        reason: &'static str,
    },
    SessionUpdated {
        session_id: Uuid,
        available_count: i32,
        status: &'static str,
    },
}

impl SeatEvent {
    pub fn session_id(&self) -> Uuid {
        match self {
            Self::SeatSelected { session_id, .. }
            | Self::SeatReleased { session_id, .. }
            | Self::SeatsReserved { session_id, .. }
            | Self::BookingConfirmed { session_id, .. }
            | Self::BookingCancelled { session_id, .. }
            | Self::SessionUpdated { session_id, .. } => *session_id,
        }
    }
}
