use std::sync::Arc;

use seatflow_core::Coordinator;
use seatflow_db::queries;
use seatflow_types::enums::{CancelReason, PaymentStatus};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

use super::signature;

/// Amount tolerance of 0.01 currency units, expressed in minor units (§4.6).
const AMOUNT_TOLERANCE_MINOR: i64 = 1;

const SIGN_CHECK_FAILED: i32 = -1;

#[derive(Debug, Deserialize)]
pub struct ClickPrepareRequest {
    pub click_trans_id: i64,
    pub service_id: String,
    pub merchant_trans_id: String,
    pub amount: String,
    pub action: i32,
    pub sign_time: String,
    pub sign_string: String,
    pub error: i32,
}

#[derive(Debug, Deserialize)]
pub struct ClickCompleteRequest {
    pub click_trans_id: i64,
    pub service_id: String,
    pub merchant_trans_id: String,
    pub merchant_prepare_id: i64,
    pub amount: String,
    pub action: i32,
    pub sign_time: String,
    pub sign_string: String,
    pub error: i32,
}

#[derive(Debug, Serialize)]
pub struct ClickResponse {
    pub click_trans_id: i64,
    pub merchant_trans_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merchant_prepare_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merchant_confirm_id: Option<i64>,
    pub error: i32,
    pub error_note: String,
}

pub struct ClickGateway {
    pool: PgPool,
    coordinator: Arc<Coordinator>,
    secret_key: String,
}

impl ClickGateway {
    pub fn new(pool: PgPool, coordinator: Arc<Coordinator>, secret_key: String) -> Self {
        Self { pool, coordinator, secret_key }
    }

    async fn log_failure(&self, payment_id: Option<Uuid>, operation: &str, external_id: &str, request: serde_json::Value) {
        let Some(payment_id) = payment_id else { return };
        let _ = queries::transactions::insert_idempotent(&self.pool, payment_id, "click", operation, external_id, None, Some(SIGN_CHECK_FAILED as i32), request).await;
    }

    pub async fn prepare(&self, req: ClickPrepareRequest) -> ClickResponse {
        let external_id = req.click_trans_id.to_string();

        if !signature::verify(req.click_trans_id, &req.service_id, &self.secret_key, &req.merchant_trans_id, None, &req.amount, req.action, &req.sign_time, &req.sign_string) {
            self.log_failure(None, "prepare", &external_id, json!({ "error": "sign check failed" })).await;
            return self.error_response(req.click_trans_id, req.merchant_trans_id, None, SIGN_CHECK_FAILED, "SIGN CHECK FAILED");
        }

        if req.error < 0 {
            return self.error_response(req.click_trans_id, req.merchant_trans_id, None, req.error, "Received error from Click");
        }

        let Ok(booking_id) = Uuid::parse_str(&req.merchant_trans_id) else {
            return self.error_response(req.click_trans_id, req.merchant_trans_id, None, -5, "Invalid merchant_trans_id");
        };

        let Ok(Some(payment)) = queries::payments::find_by_booking(&self.pool, booking_id).await else {
            return self.error_response(req.click_trans_id, req.merchant_trans_id, None, -5, "Payment not found");
        };

        let amount_minor: i64 = req.amount.parse::<f64>().map(|a| (a * 100.0).round() as i64).unwrap_or(-1);
        if (amount_minor - payment.amount_minor).abs() > AMOUNT_TOLERANCE_MINOR {
            return self.error_response(req.click_trans_id, req.merchant_trans_id, None, -2, "Incorrect amount");
        }

        if matches!(payment.status(), PaymentStatus::Completed | PaymentStatus::Cancelled) {
            return self.error_response(req.click_trans_id, req.merchant_trans_id, None, -4, "Payment already settled");
        }

        let request_payload = json!({
            "click_trans_id": req.click_trans_id,
            "merchant_trans_id": req.merchant_trans_id,
            "amount": req.amount,
        });

        let inserted = match queries::transactions::insert_idempotent(&self.pool, payment.id, "click", "prepare", &external_id, Some(payment.amount_minor), Some(0), request_payload).await {
            Ok(inserted) => inserted,
            Err(_) => return self.error_response(req.click_trans_id, req.merchant_trans_id, None, -7, "Failed to record transaction"),
        };

        if !inserted.is_new() {
            let cached = inserted.into_inner();
            if let Some(response) = cached.response_payload.as_ref().and_then(|v| v["merchant_prepare_id"].as_i64()) {
                return ClickResponse {
                    click_trans_id: req.click_trans_id,
                    merchant_trans_id: req.merchant_trans_id,
                    merchant_prepare_id: Some(response),
                    merchant_confirm_id: None,
                    error: 0,
                    error_note: "Success".into(),
                };
            }
        }

        let prepare_id = match queries::click_sequence::next_click_id(&self.pool).await {
            Ok(id) => id,
            Err(_) => return self.error_response(req.click_trans_id, req.merchant_trans_id, None, -7, "Failed to allocate prepare id"),
        };

        let mut tx = match self.pool.begin().await {
            Ok(tx) => tx,
            Err(_) => return self.error_response(req.click_trans_id, req.merchant_trans_id, Some(prepare_id), -7, "Internal error"),
        };
        if queries::payments::update_status(&mut tx, payment.id, "pending", Some(&external_id)).await.is_err() || tx.commit().await.is_err() {
            return self.error_response(req.click_trans_id, req.merchant_trans_id, Some(prepare_id), -7, "Internal error");
        }

        let response_payload = json!({ "merchant_prepare_id": prepare_id });
        let transaction_id = queries::transactions::find_by_key(&self.pool, "click", "prepare", &external_id).await.ok().flatten().map(|t| t.id);
        if let Some(transaction_id) = transaction_id {
            let _ = queries::transactions::update_response(&self.pool, transaction_id, response_payload).await;
        }

        ClickResponse {
            click_trans_id: req.click_trans_id,
            merchant_trans_id: req.merchant_trans_id,
            merchant_prepare_id: Some(prepare_id),
            merchant_confirm_id: None,
            error: 0,
            error_note: "Success".into(),
        }
    }

    pub async fn complete(&self, req: ClickCompleteRequest) -> ClickResponse {
        let external_id = req.click_trans_id.to_string();

        if !signature::verify(
            req.click_trans_id,
            &req.service_id,
            &self.secret_key,
            &req.merchant_trans_id,
            Some(req.merchant_prepare_id),
            &req.amount,
            req.action,
            &req.sign_time,
            &req.sign_string,
        ) {
            self.log_failure(None, "complete", &external_id, json!({ "error": "sign check failed" })).await;
            return self.error_response(req.click_trans_id, req.merchant_trans_id, Some(req.merchant_prepare_id), SIGN_CHECK_FAILED, "SIGN CHECK FAILED");
        }

        let Some(prepare) = queries::transactions::find_by_key(&self.pool, "click", "prepare", &external_id).await.ok().flatten() else {
            return self.error_response(req.click_trans_id, req.merchant_trans_id, Some(req.merchant_prepare_id), -5, "Prepare transaction not found");
        };

        let Ok(Some(payment)) = queries::payments::find_by_id(&self.pool, prepare.payment_id).await else {
            return self.error_response(req.click_trans_id, req.merchant_trans_id, Some(req.merchant_prepare_id), -5, "Payment not found");
        };

        if req.error < 0 {
            let _ = self.coordinator.cancel(payment.booking_id, CancelReason::PaymentFailed).await;
            let mut tx = self.pool.begin().await;
            if let Ok(tx) = tx.as_mut() {
                let _ = queries::payments::update_status(tx, payment.id, "cancelled", None).await;
            }
            if let Ok(tx) = tx { let _ = tx.commit().await; }
            return self.error_response(req.click_trans_id, req.merchant_trans_id, Some(req.merchant_prepare_id), req.error, "Received error from Click");
        }

        let request_payload = json!({
            "click_trans_id": req.click_trans_id,
            "merchant_trans_id": req.merchant_trans_id,
            "merchant_prepare_id": req.merchant_prepare_id,
            "amount": req.amount,
        });

        let inserted = match queries::transactions::insert_idempotent(&self.pool, payment.id, "click", "complete", &external_id, Some(payment.amount_minor), Some(2), request_payload).await {
            Ok(inserted) => inserted,
            Err(_) => return self.error_response(req.click_trans_id, req.merchant_trans_id, Some(req.merchant_prepare_id), -7, "Failed to record transaction"),
        };

        if !inserted.is_new() {
            let cached = inserted.into_inner();
            let confirm_id = cached.response_payload.as_ref().and_then(|v| v["merchant_confirm_id"].as_i64());
            return ClickResponse {
                click_trans_id: req.click_trans_id,
                merchant_trans_id: req.merchant_trans_id,
                merchant_prepare_id: Some(req.merchant_prepare_id),
                merchant_confirm_id: confirm_id,
                error: 0,
                error_note: "Success".into(),
            };
        }

        if self.coordinator.confirm(payment.booking_id).await.is_err() {
            return self.error_response(req.click_trans_id, req.merchant_trans_id, Some(req.merchant_prepare_id), -7, "Failed to confirm booking");
        }

        let confirm_id = match queries::click_sequence::next_click_id(&self.pool).await {
            Ok(id) => id,
            Err(_) => return self.error_response(req.click_trans_id, req.merchant_trans_id, Some(req.merchant_prepare_id), -7, "Failed to allocate confirm id"),
        };

        let mut tx = self.pool.begin().await;
        if let Ok(tx) = tx.as_mut() {
            let _ = queries::payments::update_status(tx, payment.id, "completed", None).await;
        }
        if let Ok(tx) = tx { let _ = tx.commit().await; }

        let response_payload = json!({ "merchant_confirm_id": confirm_id });
        if let Some(transaction_id) = queries::transactions::find_by_key(&self.pool, "click", "complete", &external_id).await.ok().flatten().map(|t| t.id) {
            let _ = queries::transactions::update_response(&self.pool, transaction_id, response_payload).await;
        }

        ClickResponse {
            click_trans_id: req.click_trans_id,
            merchant_trans_id: req.merchant_trans_id,
            merchant_prepare_id: Some(req.merchant_prepare_id),
            merchant_confirm_id: Some(confirm_id),
            error: 0,
            error_note: "Success".into(),
        }
    }

    fn error_response(&self, click_trans_id: i64, merchant_trans_id: String, prepare_id: Option<i64>, error: i32, note: &str) -> ClickResponse {
        ClickResponse {
            click_trans_id,
            merchant_trans_id,
            merchant_prepare_id: prepare_id,
            merchant_confirm_id: None,
            error,
            error_note: note.to_string(),
        }
    }
}
