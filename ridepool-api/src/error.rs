use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use ridepool_booking::BookingError;
use serde_json::json;

#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    Forbidden(String),
    NotFound(String),
    Conflict(String),
    InternalServerError(String),
}

impl AppError {
    /// Wrap a storage-layer failure without leaking its message to clients.
    pub fn internal(err: impl ToString) -> Self {
        AppError::InternalServerError(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

impl From<BookingError> for AppError {
    fn from(err: BookingError) -> Self {
        match err {
            BookingError::NotFound(_) => AppError::NotFound(err.to_string()),
            BookingError::Forbidden(_) => AppError::Forbidden(err.to_string()),
            BookingError::Conflict(_) => AppError::Conflict(err.to_string()),
            BookingError::CapacityExceeded { .. }
            | BookingError::InvalidState(_)
            | BookingError::InvalidAction(_)
            | BookingError::InvalidSeatCount(_) => AppError::BadRequest(err.to_string()),
            BookingError::Storage(e) => AppError::InternalServerError(e.to_string()),
        }
    }
}
