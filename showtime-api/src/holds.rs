use axum::{
    extract::{rejection::{JsonRejection, PathRejection}, Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use showtime_core::{ids::seat_labels, HoldId, SeatId, ShowId};
use showtime_hold::{Hold, HoldState};
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct HoldSeatsRequest {
    pub show_id: u64,
    pub seat_ids: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HoldResponse {
    pub hold_id: Uuid,
    pub show_id: u64,
    pub seat_ids: Vec<String>,
    pub status: HoldState,
    pub expires_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub booking_id: Option<Uuid>,
}

impl From<&Hold> for HoldResponse {
    fn from(hold: &Hold) -> Self {
        Self {
            hold_id: hold.id.0,
            show_id: hold.show_id.0,
            seat_ids: seat_labels(hold.seats()),
            status: hold.state(),
            expires_at: hold.deadline,
            booking_id: hold.booking_id.map(|id| id.0),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CancelHoldResponse {
    pub hold_id: Uuid,
    pub status: HoldState,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/bookings/hold", post(hold_seats))
        .route("/v1/bookings/hold/{hold_id}", get(get_hold).delete(cancel_hold))
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /v1/bookings/hold
/// Hold a set of seats on one show until the hold deadline
pub async fn hold_seats(
    State(state): State<AppState>,
    payload: Result<Json<HoldSeatsRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<HoldResponse>), AppError> {
    let Json(req) = payload?;
    let seats = req.seat_ids.into_iter().map(SeatId).collect();

    let hold = state.engine.hold_seats(ShowId(req.show_id), seats).await?;
    tracing::info!("Hold {} created on show {}", hold.id, hold.show_id);

    Ok((StatusCode::CREATED, Json(HoldResponse::from(&hold))))
}

/// GET /v1/bookings/hold/{hold_id}
pub async fn get_hold(
    State(state): State<AppState>,
    hold_id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<HoldResponse>, AppError> {
    let Path(hold_id) = hold_id?;
    let hold = state.engine.get_hold(HoldId(hold_id)).await?;
    Ok(Json(HoldResponse::from(&hold)))
}

/// DELETE /v1/bookings/hold/{hold_id}
/// Cancel a hold; cancelling a finished hold reports its final state
pub async fn cancel_hold(
    State(state): State<AppState>,
    hold_id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<CancelHoldResponse>, AppError> {
    let Path(hold_id) = hold_id?;
    let status = state.engine.cancel(HoldId(hold_id)).await?;
    Ok(Json(CancelHoldResponse { hold_id, status }))
}
