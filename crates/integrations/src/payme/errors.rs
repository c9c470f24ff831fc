use serde_json::{json, Value};

/// Payme's numeric error catalog, restricted to the codes §4.6 names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymeError {
    InvalidAmount,
    TransactionNotFound,
    CannotPerform,
    InvalidState,
}

impl PaymeError {
    pub fn code(&self) -> i32 {
        match self {
            Self::InvalidAmount => -31050,
            Self::TransactionNotFound => -31003,
            Self::CannotPerform => -31008,
            Self::InvalidState => -31007,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Self::InvalidAmount => "Invalid amount",
            Self::TransactionNotFound => "Transaction not found",
            Self::CannotPerform => "Cannot perform operation",
            Self::InvalidState => "Invalid transaction state",
        }
    }

    pub fn to_json(self, id: Value) -> Value {
        json!({
            "error": { "code": self.code(), "message": self.message() },
            "id": id,
        })
    }
}
