pub mod expiration;

pub use expiration::run_expiration_tick;
