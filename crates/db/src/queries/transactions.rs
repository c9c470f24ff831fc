use anyhow::Result;
use chrono::{DateTime, Utc};
use seatflow_types::models::Transaction;
use sqlx::PgPool;
use uuid::Uuid;

/// The outcome of an idempotent transaction-log insert: either this call
/// created the row, or an identical `(provider, operation, external_id)`
/// already existed and is returned unchanged so the caller can replay the
/// gateway's original response instead of re-running side effects.
pub enum Inserted {
    New(Transaction),
    Existing(Transaction),
}

impl Inserted {
    pub fn into_inner(self) -> Transaction {
        match self {
            Self::New(t) | Self::Existing(t) => t,
        }
    }

    pub fn is_new(&self) -> bool {
        matches!(self, Self::New(_))
    }
}

/// Inserts a transaction-log row, relying on the database's unique index on
/// `(provider, operation, external_id)` for idempotency rather than a
/// check-then-insert race.
pub async fn insert_idempotent(
    pool: &PgPool,
    payment_id: Uuid,
    provider: &str,
    operation: &str,
    external_id: &str,
    amount_minor: Option<i64>,
    state: Option<i32>,
    request_payload: serde_json::Value,
) -> Result<Inserted> {
    let inserted = sqlx::query_as::<_, Transaction>(
        "INSERT INTO transactions \
         (id, payment_id, provider, operation, external_id, amount_minor, state, request_payload) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
         ON CONFLICT (provider, operation, external_id) DO NOTHING \
         RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(payment_id)
    .bind(provider)
    .bind(operation)
    .bind(external_id)
    .bind(amount_minor)
    .bind(state)
    .bind(request_payload)
    .fetch_optional(pool)
    .await?;

    match inserted {
        Some(t) => Ok(Inserted::New(t)),
        None => {
            let existing = find_by_key(pool, provider, operation, external_id)
                .await?
                .ok_or_else(|| anyhow::anyhow!("transaction conflict with no existing row"))?;
            Ok(Inserted::Existing(existing))
        }
    }
}

pub async fn find_by_key(
    pool: &PgPool,
    provider: &str,
    operation: &str,
    external_id: &str,
) -> Result<Option<Transaction>> {
    let transaction = sqlx::query_as::<_, Transaction>(
        "SELECT * FROM transactions WHERE provider = $1 AND operation = $2 AND external_id = $3",
    )
    .bind(provider)
    .bind(operation)
    .bind(external_id)
    .fetch_optional(pool)
    .await?;

    Ok(transaction)
}

/// Backs Payme's `GetStatement`: every transaction-log row for the provider
/// created within `[from, to]`.
pub async fn list_by_provider_between(
    pool: &PgPool,
    provider: &str,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> Result<Vec<Transaction>> {
    let transactions = sqlx::query_as::<_, Transaction>(
        "SELECT * FROM transactions WHERE provider = $1 AND created_at BETWEEN $2 AND $3 ORDER BY created_at ASC",
    )
    .bind(provider)
    .bind(from)
    .bind(to)
    .fetch_all(pool)
    .await?;

    Ok(transactions)
}

pub async fn list_by_payment(pool: &PgPool, payment_id: Uuid) -> Result<Vec<Transaction>> {
    let transactions = sqlx::query_as::<_, Transaction>(
        "SELECT * FROM transactions WHERE payment_id = $1 ORDER BY created_at ASC",
    )
    .bind(payment_id)
    .fetch_all(pool)
    .await?;

    Ok(transactions)
}

pub async fn update_response(pool: &PgPool, id: Uuid, response_payload: serde_json::Value) -> Result<()> {
    sqlx::query("UPDATE transactions SET response_payload = $2 WHERE id = $1")
        .bind(id)
        .bind(response_payload)
        .execute(pool)
        .await?;

    Ok(())
}
