use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use showtime_booking::BookingError;
use showtime_core::{CoreError, SeatId};

#[derive(Debug)]
pub enum AppError {
    AuthenticationError(String),
    ValidationError(String),
    NotFoundError { code: &'static str, message: String },
    SeatsUnavailable(Vec<SeatId>),
    HoldExpired(String),
    ConflictError { code: &'static str, message: String },
    InternalServerError(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message, seats) = match self {
            AppError::AuthenticationError(msg) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg, None),
            AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg, None),
            AppError::NotFoundError { code, message } => (StatusCode::NOT_FOUND, code, message, None),
            AppError::SeatsUnavailable(seats) => (
                StatusCode::CONFLICT,
                "SEATS_UNAVAILABLE",
                "One or more seats are no longer available, pick different seats".to_string(),
                Some(seats),
            ),
            AppError::HoldExpired(msg) => (StatusCode::GONE, "HOLD_EXPIRED", msg, None),
            AppError::ConflictError { code, message } => (StatusCode::CONFLICT, code, message, None),
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", "Internal Server Error".to_string(), None)
            }
        };

        let mut body = json!({
            "error": code,
            "message": message,
        });
        if let Some(seats) = seats {
            body["seats"] = json!(seats);
        }

        (status, Json(body)).into_response()
    }
}

impl From<BookingError> for AppError {
    fn from(err: BookingError) -> Self {
        let message = err.to_string();
        match err {
            BookingError::SeatsUnavailable(seats) => AppError::SeatsUnavailable(seats),
            BookingError::HoldExpired(_) => AppError::HoldExpired(message),
            BookingError::HoldNotFound(_) => AppError::NotFoundError { code: "HOLD_NOT_FOUND", message },
            BookingError::BookingNotFound(_) => AppError::NotFoundError { code: "BOOKING_NOT_FOUND", message },
            BookingError::ShowNotFound(_) => AppError::NotFoundError { code: "SHOW_NOT_FOUND", message },
            BookingError::ShowClosed(_) => AppError::ConflictError { code: "SHOW_CLOSED", message },
            BookingError::UnknownSeats(_)
            | BookingError::EmptySeatSelection
            | BookingError::TooManySeats { .. } => AppError::ValidationError(message),
            BookingError::Core(core) => core.into(),
            BookingError::Internal(msg) => AppError::InternalServerError(msg),
        }
    }
}

impl From<CoreError> for AppError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ValidationError(msg) => AppError::ValidationError(msg),
            other => AppError::InternalServerError(other.to_string()),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::ValidationError(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::ValidationError(rejection.body_text())
    }
}
