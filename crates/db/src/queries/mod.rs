pub mod bookings;
pub mod click_sequence;
pub mod payments;
pub mod seats;
pub mod sessions;
pub mod tariffs;
pub mod transactions;
