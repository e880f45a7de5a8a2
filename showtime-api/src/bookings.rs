use axum::{
    extract::{rejection::{JsonRejection, PathRejection}, Path, State},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use showtime_booking::{Booking, BookingStatus};
use showtime_core::{ids::seat_labels, BookingId, HoldId, UserIdentity};
use showtime_shared::Masked;
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ConfirmBookingRequest {
    pub hold_id: Uuid,
    pub user_name: String,
    pub user_email: Masked<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ConfirmBookingResponse {
    pub booking_id: Uuid,
    pub status: BookingStatus,
    pub seats: Vec<String>,
    pub show_id: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BookingResponse {
    pub booking_id: Uuid,
    pub hold_id: Uuid,
    pub status: BookingStatus,
    pub show_id: u64,
    pub movie_title: Option<String>,
    pub cinema: Option<String>,
    pub show_time: Option<DateTime<Utc>>,
    pub seats: Vec<String>,
    pub user_name: String,
    pub user_email: String,
    pub created_at: DateTime<Utc>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/bookings/confirm", post(confirm_booking))
        .route("/v1/bookings/{booking_id}", get(get_booking))
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /v1/bookings/confirm
/// Turn a live hold into a booking. Retrying with the same hold returns the
/// booking made the first time.
pub async fn confirm_booking(
    State(state): State<AppState>,
    payload: Result<Json<ConfirmBookingRequest>, JsonRejection>,
) -> Result<Json<ConfirmBookingResponse>, AppError> {
    let Json(req) = payload?;
    let user = UserIdentity::new(req.user_name, req.user_email.into_inner())?;

    let booking = state.engine.confirm(HoldId(req.hold_id), user).await?;

    Ok(Json(ConfirmBookingResponse {
        booking_id: booking.id.0,
        status: booking.status,
        seats: seat_labels(&booking.seats),
        show_id: booking.show_id.0,
    }))
}

/// GET /v1/bookings/{booking_id}
pub async fn get_booking(
    State(state): State<AppState>,
    booking_id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<BookingResponse>, AppError> {
    let Path(booking_id) = booking_id?;
    let booking = state.engine.get_booking(BookingId(booking_id)).await?;
    // show details are decoration; catalog trouble still returns the booking
    let show = match state.engine.find_show(booking.show_id).await {
        Ok(show) => show,
        Err(e) => {
            tracing::warn!("Show lookup failed for booking {}: {}", booking.id, e);
            None
        }
    };

    Ok(Json(booking_response(booking, show.as_ref())))
}

fn booking_response(booking: Booking, show: Option<&showtime_core::Show>) -> BookingResponse {
    BookingResponse {
        booking_id: booking.id.0,
        hold_id: booking.hold_id.0,
        status: booking.status,
        show_id: booking.show_id.0,
        movie_title: show.map(|s| s.movie_title.clone()),
        cinema: show.map(|s| s.cinema.clone()),
        show_time: show.map(|s| s.window.starts_at),
        seats: seat_labels(&booking.seats),
        user_name: booking.user.name.into_inner(),
        user_email: booking.user.email.into_inner(),
        created_at: booking.created_at,
    }
}
