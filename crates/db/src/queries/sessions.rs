use anyhow::Result;
use seatflow_types::models::Session;
use sqlx::PgPool;
use uuid::Uuid;

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Session>> {
    let session = sqlx::query_as::<_, Session>("SELECT * FROM sessions WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(session)
}

/// Locks the session row for the duration of the caller's transaction.
pub async fn find_by_id_for_update(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    id: Uuid,
) -> Result<Option<Session>> {
    let session = sqlx::query_as::<_, Session>("SELECT * FROM sessions WHERE id = $1 FOR UPDATE")
        .bind(id)
        .fetch_optional(&mut **tx)
        .await?;

    Ok(session)
}

pub async fn decrement_available_seats(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    id: Uuid,
    by: i32,
) -> Result<()> {
    sqlx::query(
        "UPDATE sessions SET available_seats = available_seats - $1, updated_at = now() WHERE id = $2",
    )
    .bind(by)
    .bind(id)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

pub async fn increment_available_seats(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    id: Uuid,
    by: i32,
) -> Result<()> {
    sqlx::query(
        "UPDATE sessions SET available_seats = available_seats + $1, updated_at = now() WHERE id = $2",
    )
    .bind(by)
    .bind(id)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

pub async fn update_status(pool: &PgPool, id: Uuid, status: &str) -> Result<()> {
    sqlx::query("UPDATE sessions SET status = $1, updated_at = now() WHERE id = $2")
        .bind(status)
        .bind(id)
        .execute(pool)
        .await?;

    Ok(())
}

/// Session ids the expiration engine's orphan sweep should visit — any
/// session still sellable enough to carry live holds.
pub async fn list_active_ids(pool: &PgPool) -> Result<Vec<Uuid>> {
    let ids: Vec<(Uuid,)> = sqlx::query_as(
        "SELECT id FROM sessions WHERE status IN ('active', 'sold_out')",
    )
    .fetch_all(pool)
    .await?;

    Ok(ids.into_iter().map(|(id,)| id).collect())
}
