use anyhow::Result;
use seatflow_types::models::Payment;
use sqlx::PgPool;
use uuid::Uuid;

pub async fn create(
    pool: &PgPool,
    booking_id: Uuid,
    provider: &str,
    amount_minor: i64,
    currency: &str,
) -> Result<Payment> {
    let payment = sqlx::query_as::<_, Payment>(
        "INSERT INTO payments (id, booking_id, provider, status, amount_minor, currency) \
         VALUES ($1, $2, $3, 'pending', $4, $5) RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(booking_id)
    .bind(provider)
    .bind(amount_minor)
    .bind(currency)
    .fetch_one(pool)
    .await?;

    Ok(payment)
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Payment>> {
    let payment = sqlx::query_as::<_, Payment>("SELECT * FROM payments WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(payment)
}

pub async fn find_by_id_for_update(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    id: Uuid,
) -> Result<Option<Payment>> {
    let payment = sqlx::query_as::<_, Payment>("SELECT * FROM payments WHERE id = $1 FOR UPDATE")
        .bind(id)
        .fetch_optional(&mut **tx)
        .await?;

    Ok(payment)
}

/// Admin listing, optionally filtered by status and/or provider (§6's
/// `GET /payments?…`).
pub async fn list(pool: &PgPool, status: Option<&str>, provider: Option<&str>) -> Result<Vec<Payment>> {
    let payments = sqlx::query_as::<_, Payment>(
        "SELECT * FROM payments \
         WHERE ($1::text IS NULL OR status = $1) AND ($2::text IS NULL OR provider = $2) \
         ORDER BY created_at DESC LIMIT 200",
    )
    .bind(status)
    .bind(provider)
    .fetch_all(pool)
    .await?;

    Ok(payments)
}

pub async fn find_by_booking(pool: &PgPool, booking_id: Uuid) -> Result<Option<Payment>> {
    let payment = sqlx::query_as::<_, Payment>(
        "SELECT * FROM payments WHERE booking_id = $1 ORDER BY created_at DESC LIMIT 1",
    )
    .bind(booking_id)
    .fetch_optional(pool)
    .await?;

    Ok(payment)
}

pub async fn find_by_external_id(pool: &PgPool, provider: &str, external_id: &str) -> Result<Option<Payment>> {
    let payment = sqlx::query_as::<_, Payment>(
        "SELECT * FROM payments WHERE provider = $1 AND external_id = $2",
    )
    .bind(provider)
    .bind(external_id)
    .fetch_optional(pool)
    .await?;

    Ok(payment)
}

/// Adds `amount_minor` to the payment's running refund total and flips its
/// status to `refunded` once the full amount has been returned (§4.6's
/// refund note).
pub async fn record_refund(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    id: Uuid,
    amount_minor: i64,
    fully_refunded: bool,
) -> Result<Payment> {
    let payment = sqlx::query_as::<_, Payment>(
        "UPDATE payments SET refunded_amount_minor = refunded_amount_minor + $2, refunded_at = now(), \
         status = CASE WHEN $3 THEN 'refunded' ELSE status END, updated_at = now() \
         WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(amount_minor)
    .bind(fully_refunded)
    .fetch_one(&mut **tx)
    .await?;

    Ok(payment)
}

pub async fn update_status(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    id: Uuid,
    status: &str,
    external_id: Option<&str>,
) -> Result<Payment> {
    let payment = sqlx::query_as::<_, Payment>(
        "UPDATE payments SET status = $2, external_id = COALESCE($3, external_id), \
         completed_at = CASE WHEN $2 = 'completed' THEN now() ELSE completed_at END, updated_at = now() \
         WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(status)
    .bind(external_id)
    .fetch_one(&mut **tx)
    .await?;

    Ok(payment)
}
