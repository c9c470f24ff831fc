use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::enums::SeatStatus;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Seat {
    pub id: Uuid,
    pub session_id: Uuid,
    pub tariff_id: Uuid,
    pub label: String,
    pub status: String,
    pub booking_id: Option<Uuid>,
    pub updated_at: DateTime<Utc>,
}

impl Seat {
    pub fn status(&self) -> SeatStatus {
        self.status.parse().unwrap_or_default()
    }
}
