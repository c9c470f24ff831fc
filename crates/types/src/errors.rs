use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

pub type Result<T> = std::result::Result<T, AppError>;

/// Machine-readable reason a seat/booking mutation was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConflictCode {
    SeatNotAvailable,
    SeatAlreadyHeld,
    SessionNotActive,
    MaxSeatsExceeded,
    BookingNotPending,
    AlreadyConfirmed,
    AlreadyCancelled,
    PaymentAlreadySettled,
}

impl ConflictCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SeatNotAvailable => "SEAT_NOT_AVAILABLE",
            Self::SeatAlreadyHeld => "SEAT_ALREADY_SELECTED",
            Self::SessionNotActive => "SESSION_NOT_ACTIVE",
            Self::MaxSeatsExceeded => "MAX_SEATS_EXCEEDED",
            Self::BookingNotPending => "BOOKING_NOT_PENDING",
            Self::AlreadyConfirmed => "ALREADY_CONFIRMED",
            Self::AlreadyCancelled => "ALREADY_CANCELLED",
            Self::PaymentAlreadySettled => "PAYMENT_ALREADY_SETTLED",
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Hold store error: {0}")]
    HoldStore(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden")]
    Forbidden,

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict ({code:?}): {message}")]
    Conflict {
        code: ConflictCode,
        message: String,
        seat_id: Option<Uuid>,
        current_status: Option<String>,
    },

    #[error("Rate limit exceeded, retry after {retry_after}s")]
    RateLimited { retry_after: u64 },

    #[error("Payment provider error ({code}): {message}")]
    Provider { code: String, message: String },

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn conflict(code: ConflictCode, message: impl Into<String>) -> Self {
        Self::Conflict {
            code,
            message: message.into(),
            seat_id: None,
            current_status: None,
        }
    }

    pub fn seat_conflict(code: ConflictCode, seat_id: Uuid, current_status: impl Into<String>) -> Self {
        let current_status = current_status.into();
        Self::Conflict {
            code,
            message: format!("seat {seat_id} is {current_status}"),
            seat_id: Some(seat_id),
            current_status: Some(current_status),
        }
    }

    pub fn status_code(&self) -> u16 {
        match self {
            Self::Database(_) | Self::HoldStore(_) | Self::Internal(_) => 500,
            Self::NotFound(_) => 404,
            Self::Unauthorized => 401,
            Self::Forbidden => 403,
            Self::BadRequest(_) | Self::Validation(_) => 400,
            Self::Conflict { .. } => 409,
            Self::RateLimited { .. } => 429,
            Self::Provider { .. } => 502,
        }
    }

    /// Machine-readable code shared by the HTTP and WebSocket transports so
    /// both render the same wire-level error shape.
    pub fn error_code(&self) -> String {
        match self {
            Self::Database(_) => "DATABASE_ERROR".into(),
            Self::HoldStore(_) => "HOLD_STORE_ERROR".into(),
            Self::NotFound(_) => "NOT_FOUND".into(),
            Self::Unauthorized => "UNAUTHORIZED".into(),
            Self::Forbidden => "FORBIDDEN".into(),
            Self::BadRequest(_) => "BAD_REQUEST".into(),
            Self::Validation(_) => "VALIDATION_ERROR".into(),
            Self::Conflict { code, .. } => code.as_str().into(),
            Self::RateLimited { .. } => "RATE_LIMIT_EXCEEDED".into(),
            Self::Provider { code, .. } => format!("PROVIDER_{code}"),
            Self::Internal(_) => "INTERNAL_ERROR".into(),
        }
    }

    pub fn retry_after(&self) -> Option<u64> {
        match self {
            Self::RateLimited { retry_after } => Some(*retry_after),
            _ => None,
        }
    }
}
