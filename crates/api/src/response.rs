//! The `{error, code, details?}` envelope every HTTP error renders as (§7),
//! built directly from `AppError`'s own `status_code()`/`error_code()`
//! rather than a separate per-case match.

use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use seatflow_types::AppError;

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let err = self.0;
        let status = StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let mut headers = HeaderMap::new();
        if let Some(retry_after) = err.retry_after() {
            if let Ok(value) = HeaderValue::from_str(&retry_after.to_string()) {
                headers.insert(axum::http::header::RETRY_AFTER, value);
            }
        }

        let details = match &err {
            AppError::Conflict { seat_id: Some(seat_id), current_status, .. } => {
                Some(serde_json::json!({ "seat_id": seat_id, "current_status": current_status }))
            }
            _ => None,
        };

        let body = Json(ErrorBody { error: err.to_string(), code: err.error_code(), details });
        (status, headers, body).into_response()
    }
}
