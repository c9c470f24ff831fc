//! The `/ws/bookings` WebSocket namespace (§4.5): one axum route handling
//! every session room, grounded on the pack's `ws_handler`/`handle_socket`
//! split and the ticketing example's typed `#[serde(tag = "type")]` message
//! enum. A connection joins at most one session room at a time; `select`s
//! and `release`s it made there are cleaned up on disconnect.
//!
//! The socket is driven by three tasks: this function reads inbound frames
//! and answers idle/ping timing, a dedicated writer task owns the `SinkExt`
//! half so outbound frames never contend with it, and (while a session is
//! joined) a forwarder task drains that session's broadcast room and
//! serializes events onto the same outbound channel. Routing everything
//! through one `mpsc` channel means the read loop never needs a second
//! mutable borrow of the socket to deliver server-pushed events.

use std::collections::HashSet;
use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use seatflow_core::Coordinator;
use seatflow_types::api::auth::verify_bearer_token;
use seatflow_types::api::ws::{Actor, ClientEvent, ServerEvent};
use seatflow_types::events::SeatEvent;
use seatflow_types::AppError;
use tokio::sync::{broadcast, mpsc};
use uuid::Uuid;

use crate::rooms::RoomRegistry;

#[derive(Clone)]
pub struct RealtimeState {
    pub coordinator: Arc<Coordinator>,
    pub rooms: RoomRegistry,
}

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    token: Option<String>,
}

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<RealtimeState>,
    Query(query): Query<WsQuery>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let token = bearer_from_headers(&headers).or(query.token);

    let user = match token
        .as_deref()
        .map(|t| verify_bearer_token(&state.coordinator.config().bearer_signing_secret, t))
    {
        Some(Ok(user)) => user,
        _ => return (axum::http::StatusCode::UNAUTHORIZED, "missing or invalid bearer token").into_response(),
    };

    ws.on_upgrade(move |socket| handle_socket(socket, state, user.id))
}

fn bearer_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_string)
}

struct JoinedSession {
    session_id: Uuid,
    connection_id: String,
    held_seats: HashSet<Uuid>,
    forwarder: tokio::task::JoinHandle<()>,
}

async fn handle_socket(socket: WebSocket, state: RealtimeState, user_id: Uuid) {
    let (mut ws_sender, mut ws_receiver) = socket.split();
    let coordinator = state.coordinator.clone();
    let (out_tx, mut out_rx) = mpsc::unbounded_channel::<Message>();

    let writer = tokio::spawn(async move {
        while let Some(msg) = out_rx.recv().await {
            if ws_sender.send(msg).await.is_err() {
                break;
            }
        }
    });

    let mut joined: Option<JoinedSession> = None;
    let mut ping_tick = tokio::time::interval(coordinator.config().ws_ping_interval);
    let idle_timeout = coordinator.config().ws_idle_timeout;

    loop {
        tokio::select! {
            biased;

            _ = ping_tick.tick() => {
                if out_tx.send(Message::Ping(Vec::new())).is_err() {
                    break;
                }
            }

            msg = tokio::time::timeout(idle_timeout, ws_receiver.next()) => {
                match msg {
                    Ok(Some(Ok(Message::Text(text)))) => {
                        if !handle_client_message(&text, &mut joined, &state, user_id, &out_tx).await {
                            break;
                        }
                    }
                    Ok(Some(Ok(Message::Close(_)))) | Ok(None) => break,
                    Ok(Some(Ok(_))) => {}
                    Ok(Some(Err(_))) => break,
                    Err(_) => {
                        tracing::info!(%user_id, "websocket connection idle timeout");
                        break;
                    }
                }
            }
        }
    }

    if let Some(session) = joined {
        session.forwarder.abort();
        let seat_ids: Vec<Uuid> = session.held_seats.into_iter().collect();
        let _ = coordinator
            .cleanup_connection(session.session_id, user_id, &session.connection_id, &seat_ids)
            .await;
    }

    drop(out_tx);
    let _ = writer.await;
}

/// Drains one session's broadcast room for the lifetime of a join, pushing
/// translated wire events onto the connection's outbound channel. Aborted
/// on leave, rejoin, or disconnect rather than waiting for it to end on its
/// own — the room outlives any one connection.
fn spawn_forwarder(
    mut events: broadcast::Receiver<SeatEvent>,
    out_tx: mpsc::UnboundedSender<Message>,
    viewer_id: Uuid,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => {
                    for server_event in translate(event, viewer_id) {
                        let Ok(payload) = serde_json::to_string(&server_event) else { continue };
                        if out_tx.send(Message::Text(payload)).is_err() {
                            return;
                        }
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(%viewer_id, skipped, "dropped websocket events, room overflowed");
                }
                Err(broadcast::error::RecvError::Closed) => return,
            }
        }
    })
}

async fn handle_client_message(
    text: &str,
    joined: &mut Option<JoinedSession>,
    state: &RealtimeState,
    user_id: Uuid,
    out_tx: &mpsc::UnboundedSender<Message>,
) -> bool {
    let event: ClientEvent = match serde_json::from_str(text) {
        Ok(event) => event,
        Err(e) => {
            let _ = send_json(out_tx, &ServerEvent::Error { code: "VALIDATION_ERROR".into(), message: e.to_string() });
            return true;
        }
    };

    match event {
        ClientEvent::JoinSession { session_id } => {
            if let Some(previous) = joined.take() {
                previous.forwarder.abort();
                let seat_ids: Vec<Uuid> = previous.held_seats.into_iter().collect();
                let _ = state
                    .coordinator
                    .cleanup_connection(previous.session_id, user_id, &previous.connection_id, &seat_ids)
                    .await;
            }

            if let Err(e) = state.coordinator.ensure_session_active(session_id).await {
                let _ = send_json(out_tx, &error_event(&e));
                return true;
            }

            let connection_id = Uuid::new_v4().to_string();
            if let Err(e) = state.coordinator.join_presence(session_id, &connection_id).await {
                let _ = send_json(out_tx, &error_event(&e));
                return true;
            }

            match state.coordinator.session_snapshot(session_id, user_id).await {
                Ok(snapshot) => {
                    if send_json(out_tx, &ServerEvent::SessionState { session: snapshot }).is_err() {
                        return false;
                    }
                }
                Err(e) => {
                    let _ = send_json(out_tx, &error_event(&e));
                    return true;
                }
            }

            let events = state.rooms.join(session_id);
            let forwarder = spawn_forwarder(events, out_tx.clone(), user_id);
            *joined = Some(JoinedSession { session_id, connection_id, held_seats: HashSet::new(), forwarder });
        }

        ClientEvent::LeaveSession { session_id } => {
            if let Some(session) = joined.as_ref() {
                if session.session_id == session_id {
                    let session = joined.take().unwrap();
                    session.forwarder.abort();
                    let seat_ids: Vec<Uuid> = session.held_seats.into_iter().collect();
                    let _ = state
                        .coordinator
                        .cleanup_connection(session_id, user_id, &session.connection_id, &seat_ids)
                        .await;
                }
            }
        }

        ClientEvent::SelectSeat { session_id, seat_id } => {
            let Some(session) = joined.as_mut().filter(|s| s.session_id == session_id) else {
                let _ = send_json(out_tx, &ServerEvent::Error { code: "NOT_FOUND".into(), message: "join the session first".into() });
                return true;
            };
            match state.coordinator.select(session_id, seat_id, user_id, &session.connection_id).await {
                Ok(_) => { session.held_seats.insert(seat_id); }
                Err(e) => { let _ = send_json(out_tx, &error_event(&e)); }
            }
        }

        ClientEvent::ReleaseSeat { session_id, seat_id } => {
            let Some(session) = joined.as_mut().filter(|s| s.session_id == session_id) else {
                return true;
            };
            match state.coordinator.release(session_id, seat_id, user_id).await {
                Ok(_) => { session.held_seats.remove(&seat_id); }
                Err(e) => { let _ = send_json(out_tx, &error_event(&e)); }
            }
        }

        ClientEvent::ReserveSeats { session_id, seat_ids } => {
            let Some(session) = joined.as_mut().filter(|s| s.session_id == session_id) else {
                let _ = send_json(out_tx, &ServerEvent::Error { code: "NOT_FOUND".into(), message: "join the session first".into() });
                return true;
            };
            match state.coordinator.reserve(session_id, user_id, &seat_ids).await {
                Ok(_) => {
                    for seat_id in &seat_ids {
                        session.held_seats.remove(seat_id);
                    }
                }
                Err(e) => { let _ = send_json(out_tx, &error_event(&e)); }
            }
        }

        ClientEvent::Ping => {
            let _ = send_json(out_tx, &ServerEvent::Pong);
        }
    }

    true
}

fn error_event(error: &AppError) -> ServerEvent {
    if let AppError::RateLimited { retry_after } = error {
        return ServerEvent::RateLimited { retry_after: *retry_after };
    }
    ServerEvent::Error { code: error.error_code(), message: error.to_string() }
}

/// One `SeatEvent` can fan out to more than one wire message — cancelling a
/// multi-seat booking releases every one of its seats, and §4.5 only names
/// `seat_released` on the wire, not a dedicated cancellation event.
fn translate(event: SeatEvent, viewer_id: Uuid) -> Vec<ServerEvent> {
    let actor = |event_user_id: Uuid| if event_user_id == viewer_id { Actor::You } else { Actor::AnotherUser };

    match event {
        SeatEvent::SeatSelected { session_id, seat_id, user_id, expires_at } => {
            vec![ServerEvent::SeatSelected { session_id, seat_id, actor: actor(user_id), expires_at }]
        }
        SeatEvent::SeatReleased { session_id, seat_id, user_id } => {
            vec![ServerEvent::SeatReleased { session_id, seat_id, actor: actor(user_id) }]
        }
        SeatEvent::SeatsReserved { session_id, seat_ids, user_id, booking_id, expires_at } => {
            vec![ServerEvent::SeatReserved { session_id, seat_ids, booking_id, actor: actor(user_id), expires_at }]
        }
        SeatEvent::BookingConfirmed { session_id, seat_ids, booking_id } => {
            vec![ServerEvent::BookingConfirmed { session_id, seat_ids, booking_id, actor: Actor::AnotherUser }]
        }
        SeatEvent::BookingCancelled { session_id, seat_ids, .. } => seat_ids
            .into_iter()
            .map(|seat_id| ServerEvent::SeatReleased { session_id, seat_id, actor: Actor::AnotherUser })
            .collect(),
        SeatEvent::SessionUpdated { session_id, available_count, status } => {
            vec![ServerEvent::SessionUpdated { session_id, available_seats: available_count, status: status.to_string() }]
        }
    }
}

fn send_json(out_tx: &mpsc::UnboundedSender<Message>, event: &ServerEvent) -> Result<(), ()> {
    let payload = serde_json::to_string(event).map_err(|_| ())?;
    out_tx.send(Message::Text(payload)).map_err(|_| ())
}
