pub mod auth;
pub mod bookings;
pub mod payments;
pub mod sessions;
pub mod ws;

pub use auth::*;
pub use bookings::*;
pub use payments::*;
pub use sessions::*;
pub use ws::*;
