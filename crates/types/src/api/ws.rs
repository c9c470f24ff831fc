//! Wire shapes for the `/ws/bookings` WebSocket namespace (§4.5/§6).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::sessions::SessionSnapshot;

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientEvent {
    JoinSession { session_id: Uuid },
    LeaveSession { session_id: Uuid },
    SelectSeat { session_id: Uuid, seat_id: Uuid },
    ReleaseSeat { session_id: Uuid, seat_id: Uuid },
    ReserveSeats { session_id: Uuid, seat_ids: Vec<Uuid> },
    Ping,
}

/// Whether an event's recipient is the actor who caused it or another
/// connected client, per §4.5's "you" vs. "another_user" broadcast policy.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Actor {
    You,
    AnotherUser,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    SessionState {
        session: SessionSnapshot,
    },
    SeatSelected {
        session_id: Uuid,
        seat_id: Uuid,
        actor: Actor,
        expires_at: DateTime<Utc>,
    },
    SeatReleased {
        session_id: Uuid,
        seat_id: Uuid,
        actor: Actor,
    },
    SeatReserved {
        session_id: Uuid,
        seat_ids: Vec<Uuid>,
        booking_id: Uuid,
        actor: Actor,
        expires_at: DateTime<Utc>,
    },
    BookingConfirmed {
        session_id: Uuid,
        booking_id: Uuid,
        seat_ids: Vec<Uuid>,
        actor: Actor,
    },
    SessionUpdated {
        session_id: Uuid,
        available_seats: i32,
        status: String,
    },
    Error {
        code: String,
        message: String,
    },
    RateLimited {
        retry_after: u64,
    },
    Pong,
}
