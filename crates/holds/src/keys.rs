//! Redis key/channel naming for the hold store (§3).

use uuid::Uuid;

pub fn seat_key(session_id: Uuid, seat_id: Uuid) -> String {
    format!("seat:{session_id}:{seat_id}")
}

pub fn seat_prefix(session_id: Uuid) -> String {
    format!("seat:{session_id}:")
}

pub fn presence_key(session_id: Uuid) -> String {
    format!("session:{session_id}:users")
}

pub fn rate_key(action: &str, user_id: Uuid) -> String {
    format!("rate:{action}:{user_id}")
}

pub fn session_channel(session_id: Uuid) -> String {
    format!("events:{session_id}")
}
