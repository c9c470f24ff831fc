pub mod auth;

pub use auth::{AdminUser, AppState, AuthUser, PaymeAuth};
