use anyhow::Result;
use seatflow_types::models::Seat;
use sqlx::PgPool;
use uuid::Uuid;

pub async fn list_by_session(pool: &PgPool, session_id: Uuid) -> Result<Vec<Seat>> {
    let seats = sqlx::query_as::<_, Seat>("SELECT * FROM seats WHERE session_id = $1 ORDER BY label")
        .bind(session_id)
        .fetch_all(pool)
        .await?;

    Ok(seats)
}

pub async fn find_by_ids(pool: &PgPool, session_id: Uuid, seat_ids: &[Uuid]) -> Result<Vec<Seat>> {
    let seats = sqlx::query_as::<_, Seat>(
        "SELECT * FROM seats WHERE session_id = $1 AND id = ANY($2) ORDER BY id",
    )
    .bind(session_id)
    .bind(seat_ids)
    .fetch_all(pool)
    .await?;

    Ok(seats)
}

pub async fn find_by_booking(pool: &PgPool, booking_id: Uuid) -> Result<Vec<Seat>> {
    let seats = sqlx::query_as::<_, Seat>("SELECT * FROM seats WHERE booking_id = $1 ORDER BY id")
        .bind(booking_id)
        .fetch_all(pool)
        .await?;

    Ok(seats)
}

/// Locks the given seat rows for the transaction's lifetime, sorted by id so
/// concurrent callers acquire locks in the same order and never deadlock.
pub async fn find_by_ids_for_update(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    session_id: Uuid,
    seat_ids: &[Uuid],
) -> Result<Vec<Seat>> {
    let seats = sqlx::query_as::<_, Seat>(
        "SELECT * FROM seats WHERE session_id = $1 AND id = ANY($2) ORDER BY id FOR UPDATE",
    )
    .bind(session_id)
    .bind(seat_ids)
    .fetch_all(&mut **tx)
    .await?;

    Ok(seats)
}

pub async fn reserve_for_booking(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    seat_ids: &[Uuid],
    booking_id: Uuid,
) -> Result<()> {
    sqlx::query(
        "UPDATE seats SET status = 'reserved', booking_id = $1, updated_at = now() WHERE id = ANY($2)",
    )
    .bind(booking_id)
    .bind(seat_ids)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

pub async fn occupy_for_booking(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    booking_id: Uuid,
) -> Result<()> {
    sqlx::query(
        "UPDATE seats SET status = 'occupied', updated_at = now() WHERE booking_id = $1",
    )
    .bind(booking_id)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

/// Releases every seat attached to a booking back to `available`, clearing
/// the booking link. Used by both explicit cancellation and the expiration
/// engine's sweep (§4.4).
pub async fn release_for_booking(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    booking_id: Uuid,
) -> Result<Vec<Uuid>> {
    let rows: Vec<(Uuid,)> = sqlx::query_as(
        "UPDATE seats SET status = 'available', booking_id = NULL, updated_at = now() \
         WHERE booking_id = $1 RETURNING id",
    )
    .bind(booking_id)
    .fetch_all(&mut **tx)
    .await?;

    Ok(rows.into_iter().map(|(id,)| id).collect())
}
