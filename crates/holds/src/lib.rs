//! The ephemeral hold store (C2): seat selection locks, per-session
//! presence sets, and sliding-window rate-limit counters, all backed by
//! Redis. Grounded on the `SET ... NX PX` seat-reservation pattern in the
//! retrieval pack's `rorobotics` booking controller, generalized from a
//! single-key lock to the full set of §4.2 operations.

pub mod keys;

use std::time::Duration;

use redis::{aio::ConnectionManager, AsyncCommands};
use seatflow_types::models::HoldValue;
use seatflow_types::{AppError, Result};

#[derive(Clone)]
pub struct HoldStore {
    conn: ConnectionManager,
    client: redis::Client,
}

impl HoldStore {
    pub async fn connect(redis_url: &str) -> anyhow::Result<Self> {
        let client = redis::Client::open(redis_url)?;
        let conn = client.get_connection_manager().await?;
        Ok(Self { conn, client })
    }

    fn conn(&self) -> ConnectionManager {
        self.conn.clone()
    }

    /// `SET key value NX PX ttl_ms` — the atomic primitive every coordinator
    /// mutation that creates a new hold relies on.
    pub async fn set_if_absent(&self, key: &str, value: &HoldValue, ttl: Duration) -> Result<bool> {
        let payload = serde_json::to_string(value).map_err(|e| AppError::HoldStore(e.to_string()))?;
        let ok: Option<String> = redis::cmd("SET")
            .arg(key)
            .arg(payload)
            .arg("NX")
            .arg("PX")
            .arg(ttl.as_millis() as u64)
            .query_async(&mut self.conn())
            .await
            .map_err(|e| AppError::HoldStore(e.to_string()))?;

        Ok(ok.is_some())
    }

    /// Unconditional `SET key value PX ttl_ms`, used for the same-user TTL
    /// refresh on a re-`select` of a seat the caller already holds.
    pub async fn set_with_ttl(&self, key: &str, value: &HoldValue, ttl: Duration) -> Result<()> {
        let payload = serde_json::to_string(value).map_err(|e| AppError::HoldStore(e.to_string()))?;
        let _: () = redis::cmd("SET")
            .arg(key)
            .arg(payload)
            .arg("PX")
            .arg(ttl.as_millis() as u64)
            .query_async(&mut self.conn())
            .await
            .map_err(|e| AppError::HoldStore(e.to_string()))?;

        Ok(())
    }

    pub async fn get(&self, key: &str) -> Result<Option<HoldValue>> {
        let raw: Option<String> = self
            .conn()
            .get(key)
            .await
            .map_err(|e| AppError::HoldStore(e.to_string()))?;

        match raw {
            Some(raw) => {
                let value = serde_json::from_str(&raw).map_err(|e| AppError::HoldStore(e.to_string()))?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    pub async fn delete(&self, key: &str) -> Result<bool> {
        let removed: i64 = self
            .conn()
            .del(key)
            .await
            .map_err(|e| AppError::HoldStore(e.to_string()))?;

        Ok(removed > 0)
    }

    /// Milliseconds remaining on a key's TTL, or `None` if the key has no
    /// TTL or does not exist (Redis's `-1`/`-2` `PTTL` sentinels).
    pub async fn ttl_millis(&self, key: &str) -> Result<Option<i64>> {
        let ttl: i64 = self
            .conn()
            .pttl(key)
            .await
            .map_err(|e| AppError::HoldStore(e.to_string()))?;

        Ok(if ttl < 0 { None } else { Some(ttl) })
    }

    /// Cursor-based prefix scan. Production code never uses `KEYS` — only
    /// one-off test/reset tooling does, and that never ships (§4.2).
    pub async fn scan_by_prefix(&self, prefix: &str) -> Result<Vec<String>> {
        let mut conn = self.conn();
        let pattern = format!("{prefix}*");
        let mut cursor: u64 = 0;
        let mut out = Vec::new();

        loop {
            let (next, batch): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(200)
                .query_async(&mut conn)
                .await
                .map_err(|e| AppError::HoldStore(e.to_string()))?;

            out.extend(batch);
            cursor = next;
            if cursor == 0 {
                break;
            }
        }

        Ok(out)
    }

    pub async fn set_add(&self, key: &str, member: &str) -> Result<()> {
        let _: () = self
            .conn()
            .sadd(key, member)
            .await
            .map_err(|e| AppError::HoldStore(e.to_string()))?;
        Ok(())
    }

    pub async fn set_remove(&self, key: &str, member: &str) -> Result<()> {
        let _: () = self
            .conn()
            .srem(key, member)
            .await
            .map_err(|e| AppError::HoldStore(e.to_string()))?;
        Ok(())
    }

    pub async fn set_cardinality(&self, key: &str) -> Result<usize> {
        let count: usize = self
            .conn()
            .scard(key)
            .await
            .map_err(|e| AppError::HoldStore(e.to_string()))?;
        Ok(count)
    }

    pub async fn set_members(&self, key: &str) -> Result<Vec<String>> {
        let members: Vec<String> = self
            .conn()
            .smembers(key)
            .await
            .map_err(|e| AppError::HoldStore(e.to_string()))?;
        Ok(members)
    }

    /// Increments a sliding-window rate-limit counter, setting its
    /// expiration only on the increment that creates it. Uses a pipeline so
    /// the increment and the conditional expire round-trip together.
    pub async fn increment_and_expire(&self, key: &str, window: Duration) -> Result<u64> {
        let mut conn = self.conn();
        let count: u64 = redis::cmd("INCR")
            .arg(key)
            .query_async(&mut conn)
            .await
            .map_err(|e| AppError::HoldStore(e.to_string()))?;

        if count == 1 {
            let _: () = redis::cmd("PEXPIRE")
                .arg(key)
                .arg(window.as_millis() as u64)
                .query_async(&mut conn)
                .await
                .map_err(|e| AppError::HoldStore(e.to_string()))?;
        }

        Ok(count)
    }

    pub async fn publish(&self, channel: &str, payload: &str) -> Result<()> {
        let _: () = self
            .conn()
            .publish(channel, payload)
            .await
            .map_err(|e| AppError::HoldStore(e.to_string()))?;
        Ok(())
    }

    /// A dedicated pub/sub connection subscribed to `channel`. Callers drive
    /// the returned stream themselves (the `realtime` crate forwards each
    /// message into its local broadcast room).
    pub async fn subscribe(&self, channel: &str) -> Result<redis::aio::PubSub> {
        let mut pubsub = self
            .client
            .get_async_pubsub()
            .await
            .map_err(|e| AppError::HoldStore(e.to_string()))?;
        pubsub
            .subscribe(channel)
            .await
            .map_err(|e| AppError::HoldStore(e.to_string()))?;
        Ok(pubsub)
    }
}
