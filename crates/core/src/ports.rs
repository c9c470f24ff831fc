//! Port/adapter seam between the coordinator (C3) and the durable catalog
//! (C1) / ephemeral hold store (C2). Defining the traits here — rather than
//! in `db`/`holds` — lets this crate `impl` them for the Postgres/Redis
//! adapters (the trait is local, so the orphan rule allows it even though
//! `PgPool`/`HoldStore` are foreign types) while also giving tests an
//! in-memory fake with no live services, per §8's testability requirement.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use seatflow_db::queries;
use seatflow_holds::{keys, HoldStore};
use seatflow_types::enums::CancelReason;
use seatflow_types::events::SeatEvent;
use seatflow_types::models::{Booking, HoldValue, Seat, Session};
use seatflow_types::{AppError, ConflictCode, Result};
use sqlx::PgPool;
use uuid::Uuid;

/// C1's operations, exactly as §4.1 enumerates them: the coordinator only
/// ever sees these composite, already-locked mutations, never raw rows.
#[async_trait]
pub trait SeatCatalog: Send + Sync {
    async fn get_session(&self, session_id: Uuid) -> Result<Session>;
    async fn list_seats(&self, session_id: Uuid) -> Result<Vec<Seat>>;
    async fn get_seats(&self, session_id: Uuid, seat_ids: &[Uuid]) -> Result<Vec<Seat>>;
    async fn get_seats_by_booking(&self, booking_id: Uuid) -> Result<Vec<Seat>>;

    /// Locks the session and the requested seats, verifies every seat is
    /// `available` and the session is sellable, computes the price, inserts
    /// a `pending` booking, marks the seats `reserved`, and decrements the
    /// session's available-seat counter — all inside one transaction.
    async fn reserve_seats(
        &self,
        session_id: Uuid,
        user_id: Uuid,
        seat_ids: &[Uuid],
        ttl: Duration,
    ) -> Result<Booking>;

    /// Flips a `pending` booking to `confirmed` and its seats to `occupied`.
    async fn confirm_booking(&self, booking_id: Uuid) -> Result<Booking>;

    /// Flips a non-terminal booking to `cancelled`, releases its seats back
    /// to `available`, and restores the session's available-seat counter.
    /// Returns the booking and the seat ids that were released.
    async fn cancel_booking(&self, booking_id: Uuid, reason: CancelReason) -> Result<(Booking, Vec<Uuid>)>;

    async fn get_booking(&self, booking_id: Uuid) -> Result<Booking>;

    /// Expires every `pending` booking whose hold has lapsed, releasing its
    /// seats. Each booking is processed independently so one failure never
    /// stops the rest of the tick (§4.4).
    async fn expire_due_pending(&self, now: DateTime<Utc>) -> Result<Vec<(Booking, Vec<Uuid>)>>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectOutcome {
    Selected { expires_at: DateTime<Utc> },
    /// The same user re-selected a seat they already hold — the hold's TTL
    /// is refreshed rather than rejected (Open Question 1, DESIGN.md).
    RefreshedOwnHold { expires_at: DateTime<Utc> },
    HeldByAnother,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitOutcome {
    Allowed,
    Exceeded { retry_after: Duration },
}

/// C2's operations, exactly as §4.2 enumerates them.
#[async_trait]
pub trait HoldBackend: Send + Sync {
    async fn try_select(
        &self,
        session_id: Uuid,
        seat_id: Uuid,
        user_id: Uuid,
        connection_id: &str,
        ttl: Duration,
    ) -> Result<SelectOutcome>;

    async fn get_hold(&self, session_id: Uuid, seat_id: Uuid) -> Result<Option<HoldValue>>;

    /// Removes a hold iff it is owned by `user_id`. Returns whether it was
    /// removed.
    async fn release(&self, session_id: Uuid, seat_id: Uuid, user_id: Uuid) -> Result<bool>;

    /// Marks a hold as attached to a booking (used when `reserve` succeeds,
    /// so an orphan sweep doesn't reclaim a seat mid-payment) and refreshes
    /// its TTL to the reservation window.
    async fn attach_booking(
        &self,
        session_id: Uuid,
        seat_id: Uuid,
        booking_id: Uuid,
        ttl: Duration,
    ) -> Result<()>;

    async fn presence_join(&self, session_id: Uuid, connection_id: &str) -> Result<()>;
    async fn presence_leave(&self, session_id: Uuid, connection_id: &str) -> Result<()>;
    async fn presence_count(&self, session_id: Uuid) -> Result<usize>;

    async fn rate_limit_check(
        &self,
        action: &str,
        user_id: Uuid,
        max_actions: u64,
        window: Duration,
    ) -> Result<RateLimitOutcome>;

    /// Every Nth expiration-engine tick: finds holds with no TTL (orphaned
    /// by a crashed process before it could `SET ... PX`) and drops them.
    async fn sweep_orphans(&self, session_id: Uuid) -> Result<Vec<Uuid>>;

    async fn publish_event(&self, event: &SeatEvent) -> Result<()>;
}

/// `SeatCatalog` over Postgres via `seatflow_db`, grounded on
/// `core/src/booking/create.rs`'s transaction-and-`FOR UPDATE` shape.
pub struct PgCatalog {
    pool: PgPool,
}

impl PgCatalog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SeatCatalog for PgCatalog {
    async fn get_session(&self, session_id: Uuid) -> Result<Session> {
        queries::sessions::find_by_id(&self.pool, session_id)
            .await
            .map_err(|e| AppError::Internal(e.to_string()))?
            .ok_or_else(|| AppError::NotFound(format!("session {session_id}")))
    }

    async fn list_seats(&self, session_id: Uuid) -> Result<Vec<Seat>> {
        queries::seats::list_by_session(&self.pool, session_id)
            .await
            .map_err(|e| AppError::Internal(e.to_string()))
    }

    async fn get_seats(&self, session_id: Uuid, seat_ids: &[Uuid]) -> Result<Vec<Seat>> {
        queries::seats::find_by_ids(&self.pool, session_id, seat_ids)
            .await
            .map_err(|e| AppError::Internal(e.to_string()))
    }

    async fn get_seats_by_booking(&self, booking_id: Uuid) -> Result<Vec<Seat>> {
        queries::seats::find_by_booking(&self.pool, booking_id)
            .await
            .map_err(|e| AppError::Internal(e.to_string()))
    }

    async fn reserve_seats(
        &self,
        session_id: Uuid,
        user_id: Uuid,
        seat_ids: &[Uuid],
        ttl: Duration,
    ) -> Result<Booking> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        let session = queries::sessions::find_by_id_for_update(&mut tx, session_id)
            .await
            .map_err(|e| AppError::Internal(e.to_string()))?
            .ok_or_else(|| AppError::NotFound(format!("session {session_id}")))?;

        if !session.status().is_sellable() {
            return Err(AppError::conflict(
                ConflictCode::SessionNotActive,
                format!("session {session_id} is {}", session.status),
            ));
        }

        let seats = queries::seats::find_by_ids_for_update(&mut tx, session_id, seat_ids)
            .await
            .map_err(|e| AppError::Internal(e.to_string()))?;

        if seats.len() != seat_ids.len() {
            return Err(AppError::NotFound("one or more seats do not exist".into()));
        }

        for seat in &seats {
            if !seat.status().is_selectable() {
                return Err(AppError::seat_conflict(ConflictCode::SeatNotAvailable, seat.id, seat.status.clone()));
            }
        }

        let tariff_ids: Vec<Uuid> = seats.iter().map(|s| s.tariff_id).collect();
        let tariffs = queries::tariffs::find_by_ids(&self.pool, &tariff_ids)
            .await
            .map_err(|e| AppError::Internal(e.to_string()))?;
        let total_price_minor = crate::pricing::total_price_minor(&tariff_ids, &tariffs);
        let currency = tariffs
            .first()
            .map(|t| t.currency.clone())
            .unwrap_or_else(|| "UZS".to_string());

        let expires_at = Utc::now() + chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::seconds(600));
        let booking = queries::bookings::create_pending(&mut tx, session_id, user_id, total_price_minor, &currency, expires_at)
            .await
            .map_err(|e| AppError::Internal(e.to_string()))?;

        queries::seats::reserve_for_booking(&mut tx, seat_ids, booking.id)
            .await
            .map_err(|e| AppError::Internal(e.to_string()))?;

        queries::sessions::decrement_available_seats(&mut tx, session_id, seat_ids.len() as i32)
            .await
            .map_err(|e| AppError::Internal(e.to_string()))?;

        tx.commit().await.map_err(AppError::Database)?;

        Ok(booking)
    }

    async fn confirm_booking(&self, booking_id: Uuid) -> Result<Booking> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        let booking = queries::bookings::find_by_id_for_update(&mut tx, booking_id)
            .await
            .map_err(|e| AppError::Internal(e.to_string()))?
            .ok_or_else(|| AppError::NotFound(format!("booking {booking_id}")))?;

        if booking.status() != seatflow_types::enums::BookingStatus::Pending {
            return Err(AppError::conflict(
                ConflictCode::BookingNotPending,
                format!("booking {booking_id} is {}", booking.status),
            ));
        }

        let confirmed = queries::bookings::confirm(&mut tx, booking_id)
            .await
            .map_err(|e| AppError::Internal(e.to_string()))?;

        queries::seats::occupy_for_booking(&mut tx, booking_id)
            .await
            .map_err(|e| AppError::Internal(e.to_string()))?;

        tx.commit().await.map_err(AppError::Database)?;

        Ok(confirmed)
    }

    async fn cancel_booking(&self, booking_id: Uuid, reason: CancelReason) -> Result<(Booking, Vec<Uuid>)> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        let booking = queries::bookings::find_by_id_for_update(&mut tx, booking_id)
            .await
            .map_err(|e| AppError::Internal(e.to_string()))?
            .ok_or_else(|| AppError::NotFound(format!("booking {booking_id}")))?;

        if booking.status().is_terminal() {
            return Err(AppError::conflict(
                ConflictCode::AlreadyCancelled,
                format!("booking {booking_id} is already {}", booking.status),
            ));
        }

        let cancelled = queries::bookings::cancel(&mut tx, booking_id, reason.as_str())
            .await
            .map_err(|e| AppError::Internal(e.to_string()))?;

        let seat_ids = queries::seats::release_for_booking(&mut tx, booking_id)
            .await
            .map_err(|e| AppError::Internal(e.to_string()))?;

        queries::sessions::increment_available_seats(&mut tx, cancelled.session_id, seat_ids.len() as i32)
            .await
            .map_err(|e| AppError::Internal(e.to_string()))?;

        tx.commit().await.map_err(AppError::Database)?;

        Ok((cancelled, seat_ids))
    }

    async fn get_booking(&self, booking_id: Uuid) -> Result<Booking> {
        queries::bookings::find_by_id(&self.pool, booking_id)
            .await
            .map_err(|e| AppError::Internal(e.to_string()))?
            .ok_or_else(|| AppError::NotFound(format!("booking {booking_id}")))
    }

    async fn expire_due_pending(&self, now: DateTime<Utc>) -> Result<Vec<(Booking, Vec<Uuid>)>> {
        let due = queries::bookings::expire_due_pending(&self.pool, now)
            .await
            .map_err(|e| AppError::Internal(e.to_string()))?;

        let mut results = Vec::with_capacity(due.len());
        for booking in due {
            let mut tx = match self.pool.begin().await {
                Ok(tx) => tx,
                Err(e) => {
                    tracing::warn!(booking_id = %booking.id, error = %e, "failed to open tx for expired booking");
                    continue;
                }
            };

            let seat_ids = match queries::seats::release_for_booking(&mut tx, booking.id).await {
                Ok(ids) => ids,
                Err(e) => {
                    tracing::warn!(booking_id = %booking.id, error = %e, "failed to release seats for expired booking");
                    continue;
                }
            };

            if let Err(e) = queries::sessions::increment_available_seats(&mut tx, booking.session_id, seat_ids.len() as i32).await {
                tracing::warn!(booking_id = %booking.id, error = %e, "failed to restore available seats for expired booking");
                continue;
            }

            if let Err(e) = tx.commit().await {
                tracing::warn!(booking_id = %booking.id, error = %e, "failed to commit expiration for booking");
                continue;
            }

            results.push((booking, seat_ids));
        }

        Ok(results)
    }
}

/// `HoldBackend` over Redis via `seatflow_holds`.
pub struct RedisHolds {
    store: HoldStore,
}

impl RedisHolds {
    pub fn new(store: HoldStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl HoldBackend for RedisHolds {
    async fn try_select(
        &self,
        session_id: Uuid,
        seat_id: Uuid,
        user_id: Uuid,
        connection_id: &str,
        ttl: Duration,
    ) -> Result<SelectOutcome> {
        let key = keys::seat_key(session_id, seat_id);
        let now = Utc::now();
        let value = HoldValue::selection(user_id, connection_id, now);

        if self.store.set_if_absent(&key, &value, ttl).await? {
            return Ok(SelectOutcome::Selected { expires_at: now + chrono::Duration::from_std(ttl).unwrap() });
        }

        match self.store.get(&key).await? {
            Some(existing) if existing.is_owned_by(user_id) => {
                let refreshed = HoldValue::selection(user_id, connection_id, now);
                self.store.set_with_ttl(&key, &refreshed, ttl).await?;
                Ok(SelectOutcome::RefreshedOwnHold { expires_at: now + chrono::Duration::from_std(ttl).unwrap() })
            }
            _ => Ok(SelectOutcome::HeldByAnother),
        }
    }

    async fn get_hold(&self, session_id: Uuid, seat_id: Uuid) -> Result<Option<HoldValue>> {
        self.store.get(&keys::seat_key(session_id, seat_id)).await
    }

    async fn release(&self, session_id: Uuid, seat_id: Uuid, user_id: Uuid) -> Result<bool> {
        let key = keys::seat_key(session_id, seat_id);
        match self.store.get(&key).await? {
            Some(existing) if existing.is_owned_by(user_id) => {
                self.store.delete(&key).await?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn attach_booking(&self, session_id: Uuid, seat_id: Uuid, booking_id: Uuid, ttl: Duration) -> Result<()> {
        let key = keys::seat_key(session_id, seat_id);
        if let Some(mut value) = self.store.get(&key).await? {
            value.booking_id = Some(booking_id);
            self.store.set_with_ttl(&key, &value, ttl).await?;
        }
        Ok(())
    }

    async fn presence_join(&self, session_id: Uuid, connection_id: &str) -> Result<()> {
        self.store.set_add(&keys::presence_key(session_id), connection_id).await
    }

    async fn presence_leave(&self, session_id: Uuid, connection_id: &str) -> Result<()> {
        self.store.set_remove(&keys::presence_key(session_id), connection_id).await
    }

    async fn presence_count(&self, session_id: Uuid) -> Result<usize> {
        self.store.set_cardinality(&keys::presence_key(session_id)).await
    }

    async fn rate_limit_check(&self, action: &str, user_id: Uuid, max_actions: u64, window: Duration) -> Result<RateLimitOutcome> {
        let key = keys::rate_key(action, user_id);
        let count = self.store.increment_and_expire(&key, window).await?;
        if count > max_actions {
            let retry_after = self
                .store
                .ttl_millis(&key)
                .await?
                .map(|ms| Duration::from_millis(ms as u64))
                .unwrap_or(window);
            Ok(RateLimitOutcome::Exceeded { retry_after })
        } else {
            Ok(RateLimitOutcome::Allowed)
        }
    }

    async fn sweep_orphans(&self, session_id: Uuid) -> Result<Vec<Uuid>> {
        let prefix = keys::seat_prefix(session_id);
        let candidates = self.store.scan_by_prefix(&prefix).await?;
        let mut dropped = Vec::new();

        for key in candidates {
            if self.store.ttl_millis(&key).await?.is_none() {
                self.store.delete(&key).await?;
                if let Some(seat_id) = key.rsplit(':').next().and_then(|s| Uuid::parse_str(s).ok()) {
                    dropped.push(seat_id);
                }
            }
        }

        Ok(dropped)
    }

    async fn publish_event(&self, event: &SeatEvent) -> Result<()> {
        let channel = keys::session_channel(event.session_id());
        let payload = serde_json::to_string(event).map_err(|e| AppError::HoldStore(e.to_string()))?;
        self.store.publish(&channel, &payload).await
    }
}

/// A no-op `EventPublisher`-style wrapper kept for binaries (like `jobs`)
/// that only need `HoldBackend::publish_event` and don't hold a live
/// WebSocket connection registry themselves.
pub type RedisEventPublisher = RedisHolds;
