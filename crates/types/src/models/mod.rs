pub mod booking;
pub mod hold;
pub mod payment;
pub mod seat;
pub mod session;
pub mod tariff;
pub mod transaction;

pub use booking::Booking;
pub use hold::HoldValue;
pub use payment::Payment;
pub use seat::Seat;
pub use session::Session;
pub use tariff::Tariff;
pub use transaction::Transaction;
