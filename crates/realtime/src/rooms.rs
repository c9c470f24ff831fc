//! Per-session broadcast rooms (§4.5). Each worker keeps at most one
//! `broadcast::Sender` per session it has local connections for; the first
//! local join spawns a task that subscribes to that session's Redis pub/sub
//! channel and re-publishes every message into the local room, which is how
//! an event raised on one worker reaches a client connected to another.

use std::sync::Arc;

use dashmap::DashMap;
use futures_util::StreamExt;
use seatflow_holds::HoldStore;
use seatflow_types::events::SeatEvent;
use tokio::sync::broadcast;
use uuid::Uuid;

const ROOM_CAPACITY: usize = 256;

#[derive(Clone)]
pub struct RoomRegistry {
    rooms: Arc<DashMap<Uuid, broadcast::Sender<SeatEvent>>>,
    holds: HoldStore,
}

impl RoomRegistry {
    pub fn new(holds: HoldStore) -> Self {
        Self { rooms: Arc::new(DashMap::new()), holds }
    }

    /// Subscribes to a session's room, spawning its pub/sub forwarder task
    /// the first time any local connection joins it.
    pub fn join(&self, session_id: Uuid) -> broadcast::Receiver<SeatEvent> {
        let sender = self
            .rooms
            .entry(session_id)
            .or_insert_with(|| self.spawn_room(session_id))
            .clone();
        sender.subscribe()
    }

    fn spawn_room(&self, session_id: Uuid) -> broadcast::Sender<SeatEvent> {
        let (tx, _rx) = broadcast::channel(ROOM_CAPACITY);
        let forward_tx = tx.clone();
        let holds = self.holds.clone();

        tokio::spawn(async move {
            let channel = seatflow_holds::keys::session_channel(session_id);
            let mut pubsub = match holds.subscribe(&channel).await {
                Ok(pubsub) => pubsub,
                Err(e) => {
                    tracing::error!(%session_id, error = %e, "failed to subscribe to session event channel");
                    return;
                }
            };

            let mut stream = pubsub.on_message();
            while let Some(msg) = stream.next().await {
                let payload: String = match msg.get_payload() {
                    Ok(payload) => payload,
                    Err(e) => {
                        tracing::warn!(%session_id, error = %e, "undecodable pub/sub payload");
                        continue;
                    }
                };

                match serde_json::from_str::<SeatEvent>(&payload) {
                    // No local subscribers is fine: it just means nobody on
                    // this worker currently has the session open.
                    Ok(event) => { let _ = forward_tx.send(event); }
                    Err(e) => tracing::warn!(%session_id, error = %e, "undecodable seat event payload"),
                }
            }

            tracing::debug!(%session_id, "session event subscriber ended");
        });

        tx
    }
}
