use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::enums::{PaymentProvider, PaymentStatus};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Payment {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub provider: String,
    pub status: String,
    pub amount_minor: i64,
    pub currency: String,
    /// The provider's id for this payment once it creates one
    /// (Payme transaction id, Click `merchant_trans_id`).
    pub external_id: Option<String>,
    pub refunded_amount_minor: i64,
    pub refunded_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Payment {
    pub fn status(&self) -> PaymentStatus {
        self.status.parse().unwrap_or_default()
    }

    pub fn provider(&self) -> Option<PaymentProvider> {
        self.provider.parse().ok()
    }
}
