use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::enums::PaymentProvider;
use crate::models::Payment;
use crate::models::Transaction;

#[derive(Debug, Deserialize, Validate)]
pub struct CreatePaymentRequest {
    pub booking_id: Uuid,
    pub provider: PaymentProvider,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RefundPaymentRequest {
    pub payment_id: Uuid,
    #[validate(range(min = 0.0))]
    pub amount: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentResponse {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub provider: String,
    pub status: String,
    pub amount_minor: i64,
    pub currency: String,
    pub external_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionLogEntry {
    pub id: Uuid,
    pub operation: String,
    pub external_id: String,
    pub amount_minor: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl From<Payment> for PaymentResponse {
    fn from(payment: Payment) -> Self {
        Self {
            id: payment.id,
            booking_id: payment.booking_id,
            provider: payment.provider,
            status: payment.status,
            amount_minor: payment.amount_minor,
            currency: payment.currency,
            external_id: payment.external_id,
            created_at: payment.created_at,
            completed_at: payment.completed_at,
        }
    }
}

impl From<Transaction> for TransactionLogEntry {
    fn from(transaction: Transaction) -> Self {
        Self {
            id: transaction.id,
            operation: transaction.operation,
            external_id: transaction.external_id,
            amount_minor: transaction.amount_minor,
            created_at: transaction.created_at,
        }
    }
}
