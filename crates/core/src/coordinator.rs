//! C3: the coordinator sitting between transports (HTTP/WebSocket) and the
//! two stores. Every public method here is a single user-facing action —
//! `select`, `release`, `reserve`, `confirm`, `cancel` — generalizing the
//! teacher's `booking::create`/`booking::cancel` orchestration functions
//! into provider-agnostic operations over the `SeatCatalog`/`HoldBackend`
//! ports.

use std::sync::Arc;

use chrono::Utc;
use seatflow_types::api::{SeatSnapshot, SessionSnapshot};
use seatflow_types::enums::CancelReason;
use seatflow_types::events::SeatEvent;
use seatflow_types::models::Booking;
use seatflow_types::{AppError, Config, ConflictCode, Result};
use uuid::Uuid;

use crate::ports::{HoldBackend, RateLimitOutcome, SeatCatalog, SelectOutcome};

pub struct Coordinator {
    catalog: Arc<dyn SeatCatalog>,
    holds: Arc<dyn HoldBackend>,
    config: Arc<Config>,
}

impl Coordinator {
    pub fn new(catalog: Arc<dyn SeatCatalog>, holds: Arc<dyn HoldBackend>, config: Arc<Config>) -> Self {
        Self { catalog, holds, config }
    }

    async fn enforce_rate_limit(&self, action: &str, user_id: Uuid) -> Result<()> {
        match self
            .holds
            .rate_limit_check(action, user_id, self.config.rate_limit_max_actions, self.config.rate_limit_window)
            .await?
        {
            RateLimitOutcome::Allowed => Ok(()),
            RateLimitOutcome::Exceeded { retry_after } => Err(AppError::RateLimited {
                retry_after: retry_after.as_secs(),
            }),
        }
    }

    /// `SESSION_NOT_ACTIVE` if the session isn't in a sellable state —
    /// shared by `select` and by the WebSocket `join_session` handler,
    /// which both need this check before doing anything else (§4.3 step 1,
    /// §4.5 step 3).
    pub async fn ensure_session_active(&self, session_id: Uuid) -> Result<()> {
        let session = self.catalog.get_session(session_id).await?;
        if !session.status().is_sellable() {
            return Err(AppError::conflict(
                ConflictCode::SessionNotActive,
                format!("session {session_id} is {}", session.status),
            ));
        }
        Ok(())
    }

    /// A user claims a seat for the duration of the selection TTL. Selecting
    /// a seat the same user already holds refreshes the hold instead of
    /// failing (Open Question 1, DESIGN.md) — this keeps a user's UI from
    /// erroring out on a double-click or a reconnect that re-sends state.
    pub async fn select(&self, session_id: Uuid, seat_id: Uuid, user_id: Uuid, connection_id: &str) -> Result<SeatEvent> {
        self.enforce_rate_limit("select", user_id).await?;
        self.ensure_session_active(session_id).await?;

        let seats = self.catalog.get_seats(session_id, &[seat_id]).await?;
        let seat = seats.first().ok_or_else(|| AppError::NotFound(format!("seat {seat_id}")))?;
        if !seat.status().is_selectable() {
            return Err(AppError::seat_conflict(ConflictCode::SeatNotAvailable, seat.id, seat.status.clone()));
        }

        let outcome = self
            .holds
            .try_select(session_id, seat_id, user_id, connection_id, self.config.selection_ttl)
            .await?;

        let expires_at = match outcome {
            SelectOutcome::Selected { expires_at } => {
                tracing::info!(%session_id, %seat_id, %user_id, "seat selected");
                expires_at
            }
            SelectOutcome::RefreshedOwnHold { expires_at } => {
                tracing::info!(%session_id, %seat_id, %user_id, marker = "same_user_refresh", "hold ttl refreshed");
                expires_at
            }
            SelectOutcome::HeldByAnother => {
                return Err(AppError::seat_conflict(ConflictCode::SeatAlreadyHeld, seat_id, "reserved".into()));
            }
        };

        let event = SeatEvent::SeatSelected { session_id, seat_id, user_id, expires_at };
        self.holds.publish_event(&event).await?;
        Ok(event)
    }

    /// Releases a hold the caller owns. Releasing a seat you don't hold (or
    /// that has already expired) is a no-op, not an error — the client's
    /// local state may simply be stale.
    pub async fn release(&self, session_id: Uuid, seat_id: Uuid, user_id: Uuid) -> Result<Option<SeatEvent>> {
        let released = self.holds.release(session_id, seat_id, user_id).await?;
        if !released {
            return Ok(None);
        }

        tracing::info!(%session_id, %seat_id, %user_id, "seat released");
        let event = SeatEvent::SeatReleased { session_id, seat_id, user_id };
        self.holds.publish_event(&event).await?;
        Ok(Some(event))
    }

    /// Converts one or more held seats into a `pending` booking. Every seat
    /// must currently be held by `user_id` — reserving bypasses nothing the
    /// selection step already enforced.
    pub async fn reserve(&self, session_id: Uuid, user_id: Uuid, seat_ids: &[Uuid]) -> Result<(Booking, SeatEvent)> {
        self.enforce_rate_limit("reserve", user_id).await?;
        if seat_ids.len() > self.config.max_seats_per_booking {
            return Err(AppError::conflict(
                ConflictCode::MaxSeatsExceeded,
                format!("at most {} seats may be reserved at once", self.config.max_seats_per_booking),
            ));
        }
        seatflow_types::validation::validate_seat_batch(seat_ids, self.config.max_seats_per_booking)
            .map_err(AppError::Validation)?;

        for seat_id in seat_ids {
            match self.holds.get_hold(session_id, *seat_id).await? {
                Some(hold) if hold.is_owned_by(user_id) => {}
                _ => return Err(AppError::seat_conflict(ConflictCode::SeatNotAvailable, *seat_id, "not held by caller".into())),
            }
        }

        let booking = self
            .catalog
            .reserve_seats(session_id, user_id, seat_ids, self.config.reservation_ttl)
            .await?;

        for seat_id in seat_ids {
            self.holds
                .attach_booking(session_id, *seat_id, booking.id, self.config.reservation_ttl)
                .await?;
        }

        tracing::info!(%session_id, booking_id = %booking.id, %user_id, seat_count = seat_ids.len(), "seats reserved");

        let event = SeatEvent::SeatsReserved {
            session_id,
            seat_ids: seat_ids.to_vec(),
            user_id,
            booking_id: booking.id,
            expires_at: booking.expires_at.unwrap_or_else(Utc::now),
        };
        self.holds.publish_event(&event).await?;
        Ok((booking, event))
    }

    /// Called once a payment has settled. Confirms the booking and clears
    /// its holds — the seats are now `occupied`, not merely held.
    pub async fn confirm(&self, booking_id: Uuid) -> Result<(Booking, SeatEvent)> {
        let booking = self.catalog.confirm_booking(booking_id).await?;
        let seats = self.catalog.get_seats_by_booking(booking.id).await?;
        let seat_ids: Vec<Uuid> = seats.iter().map(|s| s.id).collect();

        for seat_id in &seat_ids {
            let _ = self.holds.release(booking.session_id, *seat_id, booking.user_id).await;
        }

        tracing::info!(booking_id = %booking.id, "booking confirmed");
        let event = SeatEvent::BookingConfirmed {
            session_id: booking.session_id,
            seat_ids,
            booking_id: booking.id,
        };
        self.holds.publish_event(&event).await?;
        Ok((booking, event))
    }

    /// Cancels a booking — by user request, payment failure, or admin
    /// action — releasing its seats back to the catalog and clearing any
    /// residual holds.
    pub async fn cancel(&self, booking_id: Uuid, reason: CancelReason) -> Result<(Booking, SeatEvent)> {
        let (booking, released_seat_ids) = self.catalog.cancel_booking(booking_id, reason).await?;

        for seat_id in &released_seat_ids {
            let _ = self.holds.release(booking.session_id, *seat_id, booking.user_id).await;
        }

        tracing::info!(booking_id = %booking.id, reason = reason.as_str(), "booking cancelled");
        let event = SeatEvent::BookingCancelled {
            session_id: booking.session_id,
            seat_ids: released_seat_ids,
            booking_id: booking.id,
            reason: reason.as_str(),
        };
        self.holds.publish_event(&event).await?;
        Ok((booking, event))
    }

    /// Run by the expiration engine (C4) on every tick: expires any
    /// `pending` bookings past their hold deadline and publishes one event
    /// per affected session.
    pub async fn expire_due(&self) -> Result<Vec<SeatEvent>> {
        let expired = self.catalog.expire_due_pending(Utc::now()).await?;
        let mut events = Vec::with_capacity(expired.len());

        for (booking, seat_ids) in expired {
            for seat_id in &seat_ids {
                let _ = self.holds.release(booking.session_id, *seat_id, booking.user_id).await;
            }

            tracing::info!(booking_id = %booking.id, %booking.session_id, "booking expired");
            let event = SeatEvent::BookingCancelled {
                session_id: booking.session_id,
                seat_ids,
                booking_id: booking.id,
                reason: CancelReason::Timeout.as_str(),
            };
            self.holds.publish_event(&event).await?;
            events.push(event);
        }

        Ok(events)
    }

    /// Run by the expiration engine every Nth tick: drops holds left behind
    /// by a connection that disconnected without sending `release` (crash,
    /// network drop) and whose key somehow lost its TTL.
    pub async fn sweep_orphans(&self, session_id: Uuid) -> Result<usize> {
        let dropped = self.holds.sweep_orphans(session_id).await?;
        if !dropped.is_empty() {
            tracing::info!(%session_id, count = dropped.len(), "orphan holds swept");
        }
        Ok(dropped.len())
    }

    /// Called when a WebSocket connection closes (or leaves/rejoins a
    /// session): releases every hold that connection owns in the session,
    /// then removes that connection — not the user — from the session's
    /// presence set, since one user may have more than one connection
    /// joined to the same session.
    pub async fn cleanup_connection(&self, session_id: Uuid, user_id: Uuid, connection_id: &str, held_seat_ids: &[Uuid]) -> Result<()> {
        for seat_id in held_seat_ids {
            let _ = self.holds.release(session_id, *seat_id, user_id).await;
        }
        self.holds.presence_leave(session_id, connection_id).await
    }

    pub async fn presence_count(&self, session_id: Uuid) -> Result<usize> {
        self.holds.presence_count(session_id).await
    }

    pub async fn join_presence(&self, session_id: Uuid, connection_id: &str) -> Result<()> {
        self.holds.presence_join(session_id, connection_id).await
    }

    /// The full seat snapshot a `session_state` event carries (§4.5): every
    /// seat's durable status plus whether `viewer_id` is the one holding it,
    /// so the client can render "you" vs. "another_user" without a second
    /// round-trip.
    pub async fn session_snapshot(&self, session_id: Uuid, viewer_id: Uuid) -> Result<SessionSnapshot> {
        let session = self.catalog.get_session(session_id).await?;
        let seats = self.catalog.list_seats(session_id).await?;

        let mut snapshots = Vec::with_capacity(seats.len());
        for seat in seats {
            let held_by_you = matches!(
                self.holds.get_hold(session_id, seat.id).await?,
                Some(hold) if hold.is_owned_by(viewer_id)
            );
            snapshots.push(SeatSnapshot {
                id: seat.id,
                label: seat.label,
                tariff_id: seat.tariff_id,
                status: seat.status,
                held_by_you,
            });
        }

        Ok(SessionSnapshot {
            id: session.id,
            title: session.title,
            starts_at: session.starts_at,
            status: session.status,
            available_seats: session.available_seats,
            total_seats: session.total_seats,
            seats: snapshots,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}

