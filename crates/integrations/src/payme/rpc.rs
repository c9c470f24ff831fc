use std::sync::Arc;

use chrono::{TimeZone, Utc};
use seatflow_core::Coordinator;
use seatflow_db::queries;
use seatflow_types::enums::{CancelReason, PaymentStatus};
use seatflow_types::models::Payment;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sqlx::PgPool;
use uuid::Uuid;

use super::errors::PaymeError;

#[derive(Debug, Deserialize)]
pub struct RpcRequest {
    pub method: String,
    #[serde(default)]
    pub params: Value,
    #[serde(default)]
    pub id: Value,
}

#[derive(Debug, Serialize)]
pub struct RpcResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<Value>,
    pub id: Value,
}

#[derive(Debug, Deserialize)]
struct Account {
    booking_id: Uuid,
}

const PROVIDER: &str = "payme";

fn err(code: PaymeError) -> Value {
    code.to_json(Value::Null)
}

pub struct PaymeGateway {
    pool: PgPool,
    coordinator: Arc<Coordinator>,
}

impl PaymeGateway {
    pub fn new(pool: PgPool, coordinator: Arc<Coordinator>) -> Self {
        Self { pool, coordinator }
    }

    pub async fn handle(&self, request: RpcRequest) -> RpcResponse {
        let id = request.id.clone();
        let outcome = match request.method.as_str() {
            "CheckPerformTransaction" => self.check_perform_transaction(&request.params).await,
            "CreateTransaction" => self.create_transaction(&request.params).await,
            "PerformTransaction" => self.perform_transaction(&request.params).await,
            "CancelTransaction" => self.cancel_transaction(&request.params).await,
            "CheckTransaction" => self.check_transaction(&request.params).await,
            "GetStatement" => self.get_statement(&request.params).await,
            other => {
                tracing::warn!(method = other, "unknown Payme RPC method");
                Err(err(PaymeError::CannotPerform))
            }
        };

        match outcome {
            Ok(result) => RpcResponse { result: Some(result), error: None, id },
            Err(error) => RpcResponse { result: None, error: Some(error), id },
        }
    }

    async fn find_pending_payment(&self, booking_id: Uuid, amount: i64) -> Result<Payment, Value> {
        let payment = queries::payments::find_by_booking(&self.pool, booking_id)
            .await
            .map_err(|_| err(PaymeError::InvalidAmount))?
            .ok_or_else(|| err(PaymeError::InvalidAmount))?;

        if payment.provider != PROVIDER || payment.amount_minor != amount {
            return Err(err(PaymeError::InvalidAmount));
        }

        Ok(payment)
    }

    async fn check_perform_transaction(&self, params: &Value) -> Result<Value, Value> {
        let account: Account = serde_json::from_value(params["account"].clone()).map_err(|_| err(PaymeError::InvalidAmount))?;
        let amount = params["amount"].as_i64().ok_or_else(|| err(PaymeError::InvalidAmount))?;

        let payment = self.find_pending_payment(account.booking_id, amount).await?;
        if matches!(payment.status(), PaymentStatus::Cancelled | PaymentStatus::Refunded) {
            return Err(err(PaymeError::CannotPerform));
        }

        Ok(json!({ "allow": true }))
    }

    async fn create_transaction(&self, params: &Value) -> Result<Value, Value> {
        let external_id = params["id"].as_str().ok_or_else(|| err(PaymeError::InvalidAmount))?;
        let time_ms = params["time"].as_i64().unwrap_or_default();
        let account: Account = serde_json::from_value(params["account"].clone()).map_err(|_| err(PaymeError::InvalidAmount))?;
        let amount = params["amount"].as_i64().ok_or_else(|| err(PaymeError::InvalidAmount))?;

        let payment = self.find_pending_payment(account.booking_id, amount).await?;

        let inserted = queries::transactions::insert_idempotent(
            &self.pool,
            payment.id,
            PROVIDER,
            "create",
            external_id,
            Some(amount),
            Some(1),
            params.clone(),
        )
        .await
        .map_err(|_| err(PaymeError::CannotPerform))?;

        if inserted.is_new() {
            let mut tx = self.pool.begin().await.map_err(|_| err(PaymeError::CannotPerform))?;
            queries::payments::update_status(&mut tx, payment.id, "pending", Some(external_id))
                .await
                .map_err(|_| err(PaymeError::CannotPerform))?;
            tx.commit().await.map_err(|_| err(PaymeError::CannotPerform))?;
        }

        Ok(json!({ "create_time": time_ms, "transaction": payment.id.to_string(), "state": 1 }))
    }

    async fn perform_transaction(&self, params: &Value) -> Result<Value, Value> {
        let external_id = params["id"].as_str().ok_or_else(|| err(PaymeError::TransactionNotFound))?;
        let transaction = queries::transactions::find_by_key(&self.pool, PROVIDER, "create", external_id)
            .await
            .map_err(|_| err(PaymeError::TransactionNotFound))?
            .ok_or_else(|| err(PaymeError::TransactionNotFound))?;

        let payment = queries::payments::find_by_id(&self.pool, transaction.payment_id)
            .await
            .map_err(|_| err(PaymeError::TransactionNotFound))?
            .ok_or_else(|| err(PaymeError::TransactionNotFound))?;

        if payment.status() == PaymentStatus::Completed {
            let perform_time = payment.completed_at.map(|t| t.timestamp_millis()).unwrap_or_default();
            return Ok(json!({ "transaction": payment.id.to_string(), "perform_time": perform_time, "state": 2 }));
        }
        if matches!(payment.status(), PaymentStatus::Cancelled | PaymentStatus::Refunded) {
            return Err(err(PaymeError::InvalidState));
        }

        self.coordinator.confirm(payment.booking_id).await.map_err(|_| err(PaymeError::CannotPerform))?;

        let now = Utc::now();
        let mut tx = self.pool.begin().await.map_err(|_| err(PaymeError::CannotPerform))?;
        queries::payments::update_status(&mut tx, payment.id, "completed", None)
            .await
            .map_err(|_| err(PaymeError::CannotPerform))?;
        tx.commit().await.map_err(|_| err(PaymeError::CannotPerform))?;

        let _ = queries::transactions::insert_idempotent(&self.pool, payment.id, PROVIDER, "perform", external_id, None, Some(2), params.clone()).await;

        Ok(json!({ "transaction": payment.id.to_string(), "perform_time": now.timestamp_millis(), "state": 2 }))
    }

    async fn cancel_transaction(&self, params: &Value) -> Result<Value, Value> {
        let external_id = params["id"].as_str().ok_or_else(|| err(PaymeError::TransactionNotFound))?;
        let reason = params["reason"].as_i64().unwrap_or(0);

        let transaction = queries::transactions::find_by_key(&self.pool, PROVIDER, "create", external_id)
            .await
            .map_err(|_| err(PaymeError::TransactionNotFound))?
            .ok_or_else(|| err(PaymeError::TransactionNotFound))?;

        let payment = queries::payments::find_by_id(&self.pool, transaction.payment_id)
            .await
            .map_err(|_| err(PaymeError::TransactionNotFound))?
            .ok_or_else(|| err(PaymeError::TransactionNotFound))?;

        if payment.status() == PaymentStatus::Cancelled {
            let cancel_time = cancel_transaction_time(&self.pool, payment.id).await;
            return Ok(json!({ "transaction": payment.id.to_string(), "cancel_time": cancel_time, "state": -1 }));
        }
        if payment.status() == PaymentStatus::Completed {
            return Err(err(PaymeError::InvalidState));
        }

        self.coordinator
            .cancel(payment.booking_id, CancelReason::PaymentFailed)
            .await
            .map_err(|_| err(PaymeError::CannotPerform))?;

        let now = Utc::now();
        let mut tx = self.pool.begin().await.map_err(|_| err(PaymeError::CannotPerform))?;
        queries::payments::update_status(&mut tx, payment.id, "cancelled", None)
            .await
            .map_err(|_| err(PaymeError::CannotPerform))?;
        tx.commit().await.map_err(|_| err(PaymeError::CannotPerform))?;

        let _ = queries::transactions::insert_idempotent(&self.pool, payment.id, PROVIDER, "cancel", external_id, None, Some(-1), json!({ "reason": reason })).await;

        Ok(json!({ "transaction": payment.id.to_string(), "cancel_time": now.timestamp_millis(), "state": -1 }))
    }

    async fn check_transaction(&self, params: &Value) -> Result<Value, Value> {
        let external_id = params["id"].as_str().ok_or_else(|| err(PaymeError::TransactionNotFound))?;
        let transaction = queries::transactions::find_by_key(&self.pool, PROVIDER, "create", external_id)
            .await
            .map_err(|_| err(PaymeError::TransactionNotFound))?
            .ok_or_else(|| err(PaymeError::TransactionNotFound))?;

        let payment = queries::payments::find_by_id(&self.pool, transaction.payment_id)
            .await
            .map_err(|_| err(PaymeError::TransactionNotFound))?
            .ok_or_else(|| err(PaymeError::TransactionNotFound))?;

        let (state, cancel_time) = match payment.status() {
            PaymentStatus::Cancelled => (-1, cancel_transaction_time(&self.pool, payment.id).await),
            PaymentStatus::Completed => (2, 0),
            _ => (1, 0),
        };

        Ok(json!({
            "create_time": transaction.created_at.timestamp_millis(),
            "perform_time": payment.completed_at.map(|t| t.timestamp_millis()).unwrap_or(0),
            "cancel_time": cancel_time,
            "transaction": payment.id.to_string(),
            "state": state,
            "reason": Value::Null,
        }))
    }

    async fn get_statement(&self, params: &Value) -> Result<Value, Value> {
        let from = params["from"].as_i64().unwrap_or(0);
        let to = params["to"].as_i64().unwrap_or_else(|| Utc::now().timestamp_millis());

        let from = Utc.timestamp_millis_opt(from).single().unwrap_or_else(Utc::now);
        let to = Utc.timestamp_millis_opt(to).single().unwrap_or_else(Utc::now);

        let transactions = queries::transactions::list_by_provider_between(&self.pool, PROVIDER, from, to)
            .await
            .map_err(|_| err(PaymeError::CannotPerform))?;

        let entries: Vec<Value> = transactions
            .iter()
            .map(|t| {
                json!({
                    "id": t.external_id,
                    "time": t.created_at.timestamp_millis(),
                    "amount": t.amount_minor,
                    "transaction": t.payment_id.to_string(),
                    "state": t.state,
                })
            })
            .collect();

        Ok(json!({ "transactions": entries }))
    }
}

async fn cancel_transaction_time(pool: &PgPool, payment_id: Uuid) -> i64 {
    queries::transactions::list_by_payment(pool, payment_id)
        .await
        .ok()
        .and_then(|rows| rows.into_iter().find(|t| t.operation == "cancel"))
        .map(|t| t.created_at.timestamp_millis())
        .unwrap_or(0)
}
