use anyhow::Result;
use seatflow_types::models::Tariff;
use sqlx::PgPool;
use uuid::Uuid;

pub async fn find_by_ids(pool: &PgPool, ids: &[Uuid]) -> Result<Vec<Tariff>> {
    let tariffs = sqlx::query_as::<_, Tariff>("SELECT * FROM tariffs WHERE id = ANY($1)")
        .bind(ids)
        .fetch_all(pool)
        .await?;

    Ok(tariffs)
}
