//! C5: the WebSocket fan-out layer (§4.5). Per-session broadcast rooms fed
//! by Redis pub/sub so an event raised by one worker reaches every other
//! worker's connections for that session, plus the `/ws/bookings` upgrade
//! handler that joins a connection to a room and speaks the typed
//! client/server event protocol over it.

pub mod handler;
pub mod rooms;

pub use handler::{ws_handler, RealtimeState, WsQuery};
pub use rooms::RoomRegistry;
