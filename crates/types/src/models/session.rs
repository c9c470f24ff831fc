use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::enums::SessionStatus;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Session {
    pub id: Uuid,
    pub venue_id: Uuid,
    pub title: String,
    pub starts_at: DateTime<Utc>,
    pub status: String,
    pub total_seats: i32,
    pub available_seats: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    pub fn status(&self) -> SessionStatus {
        self.status.parse().unwrap_or_default()
    }
}
