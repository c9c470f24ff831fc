//! Refunds, exposed through one internal API shared by both gateways
//! (§4.6's refund paragraph). Not provider-specific: the admin endpoint
//! calls this directly regardless of which gateway originally settled the
//! payment.

use std::sync::Arc;

use seatflow_core::Coordinator;
use seatflow_db::queries;
use seatflow_types::enums::CancelReason;
use seatflow_types::models::Payment;
use seatflow_types::{AppError, ConflictCode, Result};
use sqlx::PgPool;
use uuid::Uuid;

/// Refunds `amount_minor` off a completed payment (defaulting to the full
/// refundable balance), cancelling the underlying booking and releasing its
/// seats once the payment is fully refunded.
pub async fn refund(
    pool: &PgPool,
    coordinator: &Arc<Coordinator>,
    payment_id: Uuid,
    amount_minor: Option<i64>,
) -> Result<Payment> {
    let payment = queries::payments::find_by_id(pool, payment_id)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
        .ok_or_else(|| AppError::NotFound(format!("payment {payment_id}")))?;

    let refundable = payment.amount_minor - payment.refunded_amount_minor;
    let amount = amount_minor.unwrap_or(refundable);

    if amount <= 0 || amount > refundable {
        return Err(AppError::BadRequest(format!(
            "refund amount {amount} exceeds refundable balance {refundable}"
        )));
    }

    let fully_refunded = amount == refundable;

    let mut tx = pool.begin().await.map_err(AppError::Database)?;
    let updated = queries::payments::record_refund(&mut tx, payment_id, amount, fully_refunded)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;
    tx.commit().await.map_err(AppError::Database)?;

    if fully_refunded {
        match coordinator.cancel(payment.booking_id, CancelReason::PaymentFailed).await {
            Ok(_) => {}
            Err(AppError::Conflict { code: ConflictCode::AlreadyCancelled, .. }) => {}
            Err(e) => return Err(e),
        }
    }

    Ok(updated)
}
