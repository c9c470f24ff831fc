use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::enums::TransactionType;

/// One entry in the append-only transaction log backing idempotent gateway
/// callbacks, per §3/§4.6. Uniqueness of `(provider, operation, external_id)`
/// is enforced by a database constraint, not application logic.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Transaction {
    pub id: Uuid,
    pub payment_id: Uuid,
    pub provider: String,
    pub operation: String,
    /// The provider-supplied id this operation is keyed on (Payme's `id`
    /// param, Click's `click_trans_id`).
    pub external_id: String,
    pub amount_minor: Option<i64>,
    pub state: Option<i32>,
    pub request_payload: serde_json::Value,
    pub response_payload: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    pub fn operation(&self) -> Option<TransactionType> {
        self.operation.parse().ok()
    }
}
