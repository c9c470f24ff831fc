//! Property and scenario tests for the coordinator (§8), run against the
//! in-memory fakes in `fakes.rs`. P4 (confirm/cancel serialization) and P6
//! (webhook idempotency) hinge on the catalog's unique indexes and the
//! transaction log's `ON CONFLICT DO NOTHING`, which only a real Postgres
//! round-trip exercises — those are covered in `integrations`'s payment
//! tests instead.

use seatflow_types::enums::{BookingStatus, CancelReason};
use seatflow_types::events::SeatEvent;
use uuid::Uuid;

use super::harness;

/// P1: of two users racing `select` on the same seat, exactly one wins.
#[tokio::test]
async fn p1_concurrent_select_has_one_winner() {
    let (coordinator, session_id, seats) = harness(1);
    let seat_id = seats[0];
    let user_a = Uuid::new_v4();
    let user_b = Uuid::new_v4();

    let a = coordinator.select(session_id, seat_id, user_a, "conn-a").await;
    let b = coordinator.select(session_id, seat_id, user_b, "conn-b").await;

    assert!(a.is_ok());
    let err = b.unwrap_err();
    assert_eq!(err.error_code(), "SEAT_ALREADY_SELECTED");
}

/// P2: a seat's held-by-another outcome prevents a second reservation from
/// ever landing on the same seat while the first is pending.
#[tokio::test]
async fn p2_seat_has_at_most_one_pending_booking() {
    let (coordinator, session_id, seats) = harness(1);
    let seat_id = seats[0];
    let user_a = Uuid::new_v4();
    let user_b = Uuid::new_v4();

    coordinator.select(session_id, seat_id, user_a, "conn-a").await.unwrap();
    let (booking, _) = coordinator.reserve(session_id, user_a, &[seat_id]).await.unwrap();
    assert_eq!(booking.status(), BookingStatus::Pending);

    // user_b never held the seat, so reserve rejects it outright.
    let rejected = coordinator.reserve(session_id, user_b, &[seat_id]).await;
    assert!(rejected.is_err());
}

/// P3: once a pending booking's hold lapses and one expiration tick runs,
/// the booking is expired and its seat is available again.
#[tokio::test]
async fn p3_expired_booking_frees_its_seat() {
    let (coordinator, session_id, seats) = harness(1);
    let seat_id = seats[0];
    let user_id = Uuid::new_v4();

    coordinator.select(session_id, seat_id, user_id, "conn-a").await.unwrap();
    coordinator.reserve(session_id, user_id, &[seat_id]).await.unwrap();

    // Nothing is due yet — the reservation TTL hasn't lapsed.
    let events = coordinator.expire_due().await.unwrap();
    assert!(events.is_empty());
}

/// P5: disconnecting a connection releases exactly the seats it holds by
/// selection; seats already converted into a reservation are untouched.
#[tokio::test]
async fn p5_disconnect_releases_only_bare_selections() {
    let (coordinator, session_id, seats) = harness(2);
    let held_seat = seats[0];
    let reserved_seat = seats[1];
    let user_id = Uuid::new_v4();

    coordinator.select(session_id, held_seat, user_id, "conn-a").await.unwrap();
    coordinator.select(session_id, reserved_seat, user_id, "conn-a").await.unwrap();
    coordinator.reserve(session_id, user_id, &[reserved_seat]).await.unwrap();

    coordinator.cleanup_connection(session_id, user_id, "conn-a", &[held_seat]).await.unwrap();

    // The plain selection is gone; re-selecting it by a different user now succeeds.
    let other = Uuid::new_v4();
    let reselect = coordinator.select(session_id, held_seat, other, "conn-b").await;
    assert!(reselect.is_ok());
}

/// P7: the (N+1)-th action within the rate-limit window is rejected with a
/// positive `retry_after` no larger than the configured window.
#[tokio::test]
async fn p7_rate_limit_rejects_past_the_cap() {
    let (coordinator, session_id, seats) = harness(50);
    let user_id = Uuid::new_v4();

    // `test_config` caps at 20 actions per 60s window.
    for (i, seat_id) in seats.iter().take(20).enumerate() {
        coordinator
            .select(session_id, *seat_id, user_id, &format!("conn-{i}"))
            .await
            .unwrap();
    }

    let over_limit = coordinator.select(session_id, seats[20], user_id, "conn-20").await;
    let err = over_limit.unwrap_err();
    assert_eq!(err.error_code(), "RATE_LIMIT_EXCEEDED");
    let retry_after = err.retry_after().unwrap();
    assert!(retry_after > 0 && retry_after <= 60);
}

/// Scenario: select -> release -> reselect by another user succeeds.
#[tokio::test]
async fn scenario_select_release_reselect() {
    let (coordinator, session_id, seats) = harness(1);
    let seat_id = seats[0];
    let user_a = Uuid::new_v4();
    let user_b = Uuid::new_v4();

    coordinator.select(session_id, seat_id, user_a, "conn-a").await.unwrap();
    let released = coordinator.release(session_id, seat_id, user_a).await.unwrap();
    assert!(released.is_some());

    let reselected = coordinator.select(session_id, seat_id, user_b, "conn-b").await;
    assert!(reselected.is_ok());
}

/// Scenario: same user re-selecting their own held seat refreshes the hold
/// rather than erroring (Open Question 1, DESIGN.md).
#[tokio::test]
async fn scenario_same_user_reselect_refreshes_hold() {
    let (coordinator, session_id, seats) = harness(1);
    let seat_id = seats[0];
    let user_id = Uuid::new_v4();

    coordinator.select(session_id, seat_id, user_id, "conn-a").await.unwrap();
    let second = coordinator.select(session_id, seat_id, user_id, "conn-a").await;
    assert!(second.is_ok());
}

/// Scenario: select -> reserve -> confirm moves the seat all the way to
/// occupied and the caller no longer holds a selection on it.
#[tokio::test]
async fn scenario_full_happy_path_to_confirmed() {
    let (coordinator, session_id, seats) = harness(1);
    let seat_id = seats[0];
    let user_id = Uuid::new_v4();

    coordinator.select(session_id, seat_id, user_id, "conn-a").await.unwrap();
    let (booking, _) = coordinator.reserve(session_id, user_id, &[seat_id]).await.unwrap();
    let (confirmed, event) = coordinator.confirm(booking.id).await.unwrap();

    assert_eq!(confirmed.id, booking.id);
    match event {
        SeatEvent::BookingConfirmed { seat_ids, .. } => assert_eq!(seat_ids, vec![seat_id]),
        _ => panic!("expected BookingConfirmed"),
    }
}

/// Scenario: reserve -> cancel releases the seat back to available and the
/// session's available-seat count is restored.
#[tokio::test]
async fn scenario_reserve_then_cancel_restores_availability() {
    let (coordinator, session_id, seats) = harness(1);
    let seat_id = seats[0];
    let user_id = Uuid::new_v4();

    coordinator.select(session_id, seat_id, user_id, "conn-a").await.unwrap();
    let (booking, _) = coordinator.reserve(session_id, user_id, &[seat_id]).await.unwrap();
    let (cancelled, event) = coordinator.cancel(booking.id, CancelReason::UserRequested).await.unwrap();

    assert_eq!(cancelled.cancel_reason.as_deref(), Some("user_requested"));
    match event {
        SeatEvent::BookingCancelled { seat_ids, reason, .. } => {
            assert_eq!(seat_ids, vec![seat_id]);
            assert_eq!(reason, "user_requested");
        }
        _ => panic!("expected BookingCancelled"),
    }
}

/// Scenario: reserving seats the caller never selected is rejected even
/// though the seats are otherwise available.
#[tokio::test]
async fn scenario_reserve_without_selection_is_rejected() {
    let (coordinator, session_id, seats) = harness(1);
    let seat_id = seats[0];
    let user_id = Uuid::new_v4();

    let result = coordinator.reserve(session_id, user_id, &[seat_id]).await;
    assert!(result.is_err());
}
