use anyhow::Result;
use sqlx::PgPool;

/// Allocates the next Click `merchant_prepare_id`/`merchant_confirm_id` from
/// a dedicated sequence, per the Open Question 2 resolution in DESIGN.md:
/// these ids are never parsed out of any text id, only ever minted here.
pub async fn next_click_id(pool: &PgPool) -> Result<i64> {
    let (id,): (i64,) = sqlx::query_as("SELECT nextval('click_prepare_id_seq')")
        .fetch_one(pool)
        .await?;

    Ok(id)
}
