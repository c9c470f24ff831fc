use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Tariff {
    pub id: Uuid,
    pub session_id: Uuid,
    pub name: String,
    /// Integer minor currency units (e.g. tiyin for UZS), per §3.
    pub price_minor: i64,
    pub currency: String,
    pub created_at: DateTime<Utc>,
}
