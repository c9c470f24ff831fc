use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The JSON value stored at `seat:{session_id}:{seat_id}` in the hold store,
/// per §3's hold-store key/structure table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HoldValue {
    pub user_id: Uuid,
    pub connection_id: String,
    pub taken_at: DateTime<Utc>,
    pub booking_id: Option<Uuid>,
}

impl HoldValue {
    pub fn selection(user_id: Uuid, connection_id: impl Into<String>, taken_at: DateTime<Utc>) -> Self {
        Self {
            user_id,
            connection_id: connection_id.into(),
            taken_at,
            booking_id: None,
        }
    }

    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.user_id == user_id
    }
}
