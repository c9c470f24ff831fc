//! `/payments` endpoints (§6): the only REST surface this system owns —
//! venue/session/booking CRUD are external collaborators' responsibility.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::{Form, Json};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use seatflow_db::queries;
use seatflow_integrations::click::{ClickCompleteRequest, ClickGateway, ClickPrepareRequest, ClickResponse};
use seatflow_integrations::payme::{PaymeGateway, RpcRequest, RpcResponse};
use seatflow_types::api::{CreatePaymentRequest, PaymentResponse, RefundPaymentRequest, TransactionLogEntry};
use seatflow_types::enums::BookingStatus;
use seatflow_types::{AppError, ConflictCode};
use serde::Deserialize;
use uuid::Uuid;

use crate::middleware::{AdminUser, AppState, AuthUser, PaymeAuth};
use crate::response::ApiError;

/// `POST /payments`: a user starts paying for their own pending booking.
/// The amount is derived from the booking's own `total_price_minor` rather
/// than trusted from the request body — a client-supplied amount would let
/// a caller settle a payment for less than the booking actually costs.
pub async fn create_payment(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreatePaymentRequest>,
) -> Result<(StatusCode, Json<PaymentResponse>), ApiError> {
    let booking = queries::bookings::find_by_id(&state.db, payload.booking_id)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
        .ok_or_else(|| AppError::NotFound(format!("booking {}", payload.booking_id)))?;

    if booking.user_id != user.id {
        return Err(AppError::Forbidden.into());
    }
    if booking.status() != BookingStatus::Pending {
        return Err(AppError::conflict(
            ConflictCode::BookingNotPending,
            format!("booking {} is {}", booking.id, booking.status),
        )
        .into());
    }
    if let Some(existing) = queries::payments::find_by_booking(&state.db, booking.id)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    {
        if existing.status == "completed" {
            return Err(AppError::conflict(ConflictCode::PaymentAlreadySettled, "payment already settled").into());
        }
        return Ok((StatusCode::OK, Json(existing.into())));
    }

    let payment = queries::payments::create(&state.db, booking.id, payload.provider.as_str(), booking.total_price_minor, &booking.currency)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok((StatusCode::CREATED, Json(payment.into())))
}

/// `GET /payments/:id`: the paying user, or any admin.
pub async fn get_payment(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PaymentResponse>, ApiError> {
    let payment = queries::payments::find_by_id(&state.db, id)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
        .ok_or_else(|| AppError::NotFound(format!("payment {id}")))?;

    if !user.is_admin() {
        let booking = queries::bookings::find_by_id(&state.db, payment.booking_id)
            .await
            .map_err(|e| AppError::Internal(e.to_string()))?
            .ok_or_else(|| AppError::NotFound(format!("booking {}", payment.booking_id)))?;
        if booking.user_id != user.id {
            return Err(AppError::Forbidden.into());
        }
    }

    Ok(Json(payment.into()))
}

#[derive(Debug, Deserialize)]
pub struct ListPaymentsQuery {
    status: Option<String>,
    provider: Option<String>,
}

/// `GET /payments?…`: admin-only listing, optionally filtered.
pub async fn list_payments(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
    Query(query): Query<ListPaymentsQuery>,
) -> Result<Json<Vec<PaymentResponse>>, ApiError> {
    let payments = queries::payments::list(&state.db, query.status.as_deref(), query.provider.as_deref())
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(Json(payments.into_iter().map(PaymentResponse::from).collect()))
}

/// `POST /payments/refund`: admin-only. Delegates to the one refund path
/// shared by both gateways (§4.6).
pub async fn refund_payment(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
    Json(payload): Json<RefundPaymentRequest>,
) -> Result<Json<PaymentResponse>, ApiError> {
    let amount_minor = payload.amount.map(decimal_to_minor);
    let payment = seatflow_integrations::refund(&state.db, &state.coordinator, payload.payment_id, amount_minor).await?;
    Ok(Json(payment.into()))
}

/// `GET /payments/:id/transactions`: admin-only transaction log.
pub async fn list_transactions(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<TransactionLogEntry>>, ApiError> {
    let transactions = queries::transactions::list_by_payment(&state.db, id)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(Json(transactions.into_iter().map(TransactionLogEntry::from).collect()))
}

/// `POST /payments/payme/callback`: Payme's JSON-RPC 2.0 endpoint, gated by
/// HTTP basic-auth on the merchant credentials (§6).
pub async fn payme_callback(
    _auth: PaymeAuth,
    State(state): State<AppState>,
    Json(request): Json<RpcRequest>,
) -> Json<RpcResponse> {
    Json(state.payme.handle(request).await)
}

/// `POST /payments/click/prepare`: signature verified inside the gateway
/// itself, same as the real Click merchant API (errors ride in the JSON
/// body's `error` field, never the HTTP status).
pub async fn click_prepare(State(state): State<AppState>, Form(request): Form<ClickPrepareRequest>) -> Json<ClickResponse> {
    Json(state.click.prepare(request).await)
}

/// `POST /payments/click/complete`
pub async fn click_complete(State(state): State<AppState>, Form(request): Form<ClickCompleteRequest>) -> Json<ClickResponse> {
    Json(state.click.complete(request).await)
}

fn decimal_to_minor(amount: Decimal) -> i64 {
    (amount * Decimal::from(100)).round().to_i64().unwrap_or(0)
}
