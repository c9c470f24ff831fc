use anyhow::Result;
use chrono::{DateTime, Utc};
use seatflow_types::models::Booking;
use sqlx::PgPool;
use uuid::Uuid;

pub async fn create_pending(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    session_id: Uuid,
    user_id: Uuid,
    total_price_minor: i64,
    currency: &str,
    expires_at: DateTime<Utc>,
) -> Result<Booking> {
    let booking = sqlx::query_as::<_, Booking>(
        "INSERT INTO bookings (id, session_id, user_id, status, total_price_minor, currency, expires_at) \
         VALUES ($1, $2, $3, 'pending', $4, $5, $6) RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(session_id)
    .bind(user_id)
    .bind(total_price_minor)
    .bind(currency)
    .bind(expires_at)
    .fetch_one(&mut **tx)
    .await?;

    Ok(booking)
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Booking>> {
    let booking = sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(booking)
}

pub async fn find_by_id_for_update(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    id: Uuid,
) -> Result<Option<Booking>> {
    let booking = sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE id = $1 FOR UPDATE")
        .bind(id)
        .fetch_optional(&mut **tx)
        .await?;

    Ok(booking)
}

pub async fn confirm(tx: &mut sqlx::Transaction<'_, sqlx::Postgres>, id: Uuid) -> Result<Booking> {
    let booking = sqlx::query_as::<_, Booking>(
        "UPDATE bookings SET status = 'confirmed', confirmed_at = now(), updated_at = now() \
         WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .fetch_one(&mut **tx)
    .await?;

    Ok(booking)
}

pub async fn cancel(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    id: Uuid,
    reason: &str,
) -> Result<Booking> {
    let booking = sqlx::query_as::<_, Booking>(
        "UPDATE bookings SET status = 'cancelled', cancelled_at = now(), cancel_reason = $2, updated_at = now() \
         WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(reason)
    .fetch_one(&mut **tx)
    .await?;

    Ok(booking)
}

/// Flips every `pending` booking whose hold has expired straight to
/// `expired`, in one statement. The `WHERE status = 'pending'` guard makes
/// concurrent expiration-engine ticks converge without a separate lock step
/// (§4.1/§4.4's idempotency note) — a second tick racing the first simply
/// finds zero rows.
pub async fn expire_due_pending(pool: &PgPool, now: DateTime<Utc>) -> Result<Vec<Booking>> {
    let bookings = sqlx::query_as::<_, Booking>(
        "UPDATE bookings SET status = 'expired', cancelled_at = $1, cancel_reason = 'timeout', updated_at = $1 \
         WHERE status = 'pending' AND expires_at < $1 RETURNING *",
    )
    .bind(now)
    .fetch_all(pool)
    .await?;

    Ok(bookings)
}
