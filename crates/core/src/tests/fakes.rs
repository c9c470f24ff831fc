use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use seatflow_types::enums::CancelReason;
use seatflow_types::events::SeatEvent;
use seatflow_types::models::{Booking, HoldValue, Seat, Session, Tariff};
use seatflow_types::{AppError, ConflictCode, Result};
use uuid::Uuid;

use crate::ports::{HoldBackend, RateLimitOutcome, SeatCatalog, SelectOutcome};

struct CatalogState {
    session: Session,
    seats: HashMap<Uuid, Seat>,
    tariffs: HashMap<Uuid, Tariff>,
    bookings: HashMap<Uuid, Booking>,
}

/// `SeatCatalog` over a single in-memory session, mutex-guarded to mimic the
/// serialization a real transaction's row locks provide.
pub struct InMemoryCatalog {
    state: Mutex<CatalogState>,
}

impl InMemoryCatalog {
    /// Seeds one active session with `seat_count` available seats, all under
    /// one 1000-minor-unit tariff.
    pub fn seeded(seat_count: usize) -> (Self, Uuid, Vec<Uuid>) {
        let session_id = Uuid::new_v4();
        let tariff_id = Uuid::new_v4();
        let now = Utc::now();

        let session = Session {
            id: session_id,
            venue_id: Uuid::new_v4(),
            title: "Test session".into(),
            starts_at: now,
            status: "active".into(),
            total_seats: seat_count as i32,
            available_seats: seat_count as i32,
            created_at: now,
            updated_at: now,
        };

        let tariff = Tariff {
            id: tariff_id,
            session_id,
            name: "standard".into(),
            price_minor: 1_000,
            currency: "UZS".into(),
            created_at: now,
        };

        let mut seats = HashMap::new();
        let mut seat_ids = Vec::with_capacity(seat_count);
        for i in 0..seat_count {
            let id = Uuid::new_v4();
            seat_ids.push(id);
            seats.insert(
                id,
                Seat {
                    id,
                    session_id,
                    tariff_id,
                    label: format!("A{i}"),
                    status: "available".into(),
                    booking_id: None,
                    updated_at: now,
                },
            );
        }

        let mut tariffs = HashMap::new();
        tariffs.insert(tariff_id, tariff);

        let catalog = Self {
            state: Mutex::new(CatalogState { session, seats, tariffs, bookings: HashMap::new() }),
        };

        (catalog, session_id, seat_ids)
    }
}

#[async_trait]
impl SeatCatalog for InMemoryCatalog {
    async fn get_session(&self, session_id: Uuid) -> Result<Session> {
        let state = self.state.lock().unwrap();
        if state.session.id != session_id {
            return Err(AppError::NotFound(format!("session {session_id}")));
        }
        Ok(state.session.clone())
    }

    async fn list_seats(&self, _session_id: Uuid) -> Result<Vec<Seat>> {
        let state = self.state.lock().unwrap();
        Ok(state.seats.values().cloned().collect())
    }

    async fn get_seats(&self, _session_id: Uuid, seat_ids: &[Uuid]) -> Result<Vec<Seat>> {
        let state = self.state.lock().unwrap();
        Ok(seat_ids.iter().filter_map(|id| state.seats.get(id).cloned()).collect())
    }

    async fn get_seats_by_booking(&self, booking_id: Uuid) -> Result<Vec<Seat>> {
        let state = self.state.lock().unwrap();
        Ok(state.seats.values().filter(|s| s.booking_id == Some(booking_id)).cloned().collect())
    }

    async fn reserve_seats(&self, session_id: Uuid, user_id: Uuid, seat_ids: &[Uuid], ttl: Duration) -> Result<Booking> {
        let mut state = self.state.lock().unwrap();
        if state.session.id != session_id {
            return Err(AppError::NotFound(format!("session {session_id}")));
        }
        if !state.session.status().is_sellable() {
            return Err(AppError::conflict(ConflictCode::SessionNotActive, "session not active"));
        }

        for seat_id in seat_ids {
            let seat = state.seats.get(seat_id).ok_or_else(|| AppError::NotFound(format!("seat {seat_id}")))?;
            if !seat.status().is_selectable() {
                return Err(AppError::seat_conflict(ConflictCode::SeatNotAvailable, *seat_id, seat.status.clone()));
            }
        }

        let tariff_ids: Vec<Uuid> = seat_ids.iter().map(|id| state.seats[id].tariff_id).collect();
        let tariffs: Vec<Tariff> = state.tariffs.values().cloned().collect();
        let total_price_minor = crate::pricing::total_price_minor(&tariff_ids, &tariffs);
        let currency = tariffs.first().map(|t| t.currency.clone()).unwrap_or_else(|| "UZS".into());

        let now = Utc::now();
        let expires_at = now + chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::seconds(600));
        let booking = Booking {
            id: Uuid::new_v4(),
            session_id,
            user_id,
            status: "pending".into(),
            total_price_minor,
            currency,
            expires_at: Some(expires_at),
            confirmed_at: None,
            cancelled_at: None,
            cancel_reason: None,
            created_at: now,
            updated_at: now,
        };

        for seat_id in seat_ids {
            let seat = state.seats.get_mut(seat_id).unwrap();
            seat.status = "reserved".into();
            seat.booking_id = Some(booking.id);
        }
        state.session.available_seats -= seat_ids.len() as i32;
        state.bookings.insert(booking.id, booking.clone());

        Ok(booking)
    }

    async fn confirm_booking(&self, booking_id: Uuid) -> Result<Booking> {
        let mut state = self.state.lock().unwrap();
        let booking = state.bookings.get(&booking_id).cloned().ok_or_else(|| AppError::NotFound(format!("booking {booking_id}")))?;
        if booking.status() != seatflow_types::enums::BookingStatus::Pending {
            return Err(AppError::conflict(ConflictCode::BookingNotPending, "booking not pending"));
        }

        let now = Utc::now();
        let updated = Booking { status: "confirmed".into(), confirmed_at: Some(now), updated_at: now, ..booking };
        state.bookings.insert(booking_id, updated.clone());

        for seat in state.seats.values_mut() {
            if seat.booking_id == Some(booking_id) {
                seat.status = "occupied".into();
            }
        }

        Ok(updated)
    }

    async fn cancel_booking(&self, booking_id: Uuid, reason: CancelReason) -> Result<(Booking, Vec<Uuid>)> {
        let mut state = self.state.lock().unwrap();
        let booking = state.bookings.get(&booking_id).cloned().ok_or_else(|| AppError::NotFound(format!("booking {booking_id}")))?;
        if booking.status().is_terminal() {
            return Err(AppError::conflict(ConflictCode::AlreadyCancelled, "booking already terminal"));
        }

        let now = Utc::now();
        let updated = Booking {
            status: "cancelled".into(),
            cancelled_at: Some(now),
            cancel_reason: Some(reason.as_str().to_string()),
            updated_at: now,
            ..booking
        };
        state.bookings.insert(booking_id, updated.clone());

        let mut released = Vec::new();
        for seat in state.seats.values_mut() {
            if seat.booking_id == Some(booking_id) {
                seat.status = "available".into();
                seat.booking_id = None;
                released.push(seat.id);
            }
        }
        state.session.available_seats += released.len() as i32;

        Ok((updated, released))
    }

    async fn get_booking(&self, booking_id: Uuid) -> Result<Booking> {
        let state = self.state.lock().unwrap();
        state.bookings.get(&booking_id).cloned().ok_or_else(|| AppError::NotFound(format!("booking {booking_id}")))
    }

    async fn expire_due_pending(&self, now: DateTime<Utc>) -> Result<Vec<(Booking, Vec<Uuid>)>> {
        let due_ids: Vec<Uuid> = {
            let state = self.state.lock().unwrap();
            state
                .bookings
                .values()
                .filter(|b| b.status() == seatflow_types::enums::BookingStatus::Pending && b.expires_at.map(|e| e < now).unwrap_or(false))
                .map(|b| b.id)
                .collect()
        };

        let mut results = Vec::with_capacity(due_ids.len());
        for booking_id in due_ids {
            let mut state = self.state.lock().unwrap();
            let booking = state.bookings.get(&booking_id).cloned().unwrap();
            let updated = Booking {
                status: "expired".into(),
                cancelled_at: Some(now),
                cancel_reason: Some(CancelReason::Timeout.as_str().to_string()),
                updated_at: now,
                ..booking
            };
            state.bookings.insert(booking_id, updated.clone());

            let mut released = Vec::new();
            for seat in state.seats.values_mut() {
                if seat.booking_id == Some(booking_id) {
                    seat.status = "available".into();
                    seat.booking_id = None;
                    released.push(seat.id);
                }
            }
            state.session.available_seats += released.len() as i32;
            drop(state);

            results.push((updated, released));
        }

        Ok(results)
    }
}

#[derive(Default)]
struct HoldsState {
    holds: HashMap<String, HoldValue>,
    presence: HashMap<Uuid, Vec<String>>,
    rate_counts: HashMap<String, u64>,
    published: Vec<SeatEvent>,
}

/// `HoldBackend` over an in-process map, standing in for Redis in tests.
#[derive(Default)]
pub struct InMemoryHolds {
    state: Mutex<HoldsState>,
}

fn seat_key(session_id: Uuid, seat_id: Uuid) -> String {
    format!("seat:{session_id}:{seat_id}")
}

#[async_trait]
impl HoldBackend for InMemoryHolds {
    async fn try_select(&self, session_id: Uuid, seat_id: Uuid, user_id: Uuid, connection_id: &str, _ttl: Duration) -> Result<SelectOutcome> {
        let mut state = self.state.lock().unwrap();
        let key = seat_key(session_id, seat_id);
        let now = Utc::now();

        match state.holds.get(&key) {
            None => {
                state.holds.insert(key, HoldValue::selection(user_id, connection_id, now));
                Ok(SelectOutcome::Selected { expires_at: now })
            }
            Some(existing) if existing.is_owned_by(user_id) => {
                state.holds.insert(key, HoldValue::selection(user_id, connection_id, now));
                Ok(SelectOutcome::RefreshedOwnHold { expires_at: now })
            }
            Some(_) => Ok(SelectOutcome::HeldByAnother),
        }
    }

    async fn get_hold(&self, session_id: Uuid, seat_id: Uuid) -> Result<Option<HoldValue>> {
        let state = self.state.lock().unwrap();
        Ok(state.holds.get(&seat_key(session_id, seat_id)).cloned())
    }

    async fn release(&self, session_id: Uuid, seat_id: Uuid, user_id: Uuid) -> Result<bool> {
        let mut state = self.state.lock().unwrap();
        let key = seat_key(session_id, seat_id);
        match state.holds.get(&key) {
            Some(existing) if existing.is_owned_by(user_id) => {
                state.holds.remove(&key);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn attach_booking(&self, session_id: Uuid, seat_id: Uuid, booking_id: Uuid, _ttl: Duration) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if let Some(hold) = state.holds.get_mut(&seat_key(session_id, seat_id)) {
            hold.booking_id = Some(booking_id);
        }
        Ok(())
    }

    async fn presence_join(&self, session_id: Uuid, connection_id: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.presence.entry(session_id).or_default().push(connection_id.to_string());
        Ok(())
    }

    async fn presence_leave(&self, session_id: Uuid, connection_id: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if let Some(conns) = state.presence.get_mut(&session_id) {
            conns.retain(|c| c != connection_id);
        }
        Ok(())
    }

    async fn presence_count(&self, session_id: Uuid) -> Result<usize> {
        let state = self.state.lock().unwrap();
        Ok(state.presence.get(&session_id).map(|c| c.len()).unwrap_or(0))
    }

    async fn rate_limit_check(&self, action: &str, user_id: Uuid, max_actions: u64, _window: Duration) -> Result<RateLimitOutcome> {
        let mut state = self.state.lock().unwrap();
        let key = format!("rate:{action}:{user_id}");
        let count = state.rate_counts.entry(key).or_insert(0);
        *count += 1;
        if *count > max_actions {
            Ok(RateLimitOutcome::Exceeded { retry_after: Duration::from_secs(60) })
        } else {
            Ok(RateLimitOutcome::Allowed)
        }
    }

    async fn sweep_orphans(&self, _session_id: Uuid) -> Result<Vec<Uuid>> {
        Ok(Vec::new())
    }

    async fn publish_event(&self, event: &SeatEvent) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.published.push(event.clone());
        Ok(())
    }
}
