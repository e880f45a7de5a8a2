use axum::{
    extract::{rejection::PathRejection, Path, State},
    response::sse::{Event, KeepAlive, Sse},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use futures_util::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use showtime_catalog::{SeatAvailability, SeatStatus};
use showtime_core::ShowId;
use std::convert::Infallible;
use tokio_stream::wrappers::{errors::BroadcastStreamRecvError, BroadcastStream};

use crate::error::AppError;
use crate::state::AppState;

// ============================================================================
// Response Types
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct SeatView {
    pub seat_id: String,
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SeatMapResponse {
    pub show_id: u64,
    pub movie_title: String,
    pub cinema: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub availability: SeatAvailability,
    pub seats: Vec<SeatView>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/shows/{show_id}/seats", get(get_seat_map))
        .route("/v1/shows/{show_id}/stream", get(stream_seat_events))
}

// hold and booking ids stay private to their owners
fn status_label(status: &SeatStatus) -> &'static str {
    match status {
        SeatStatus::Available => "available",
        SeatStatus::Held { .. } => "held",
        SeatStatus::Booked { .. } => "booked",
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /v1/shows/{show_id}/seats
pub async fn get_seat_map(
    State(state): State<AppState>,
    show_id: Result<Path<u64>, PathRejection>,
) -> Result<Json<SeatMapResponse>, AppError> {
    let Path(show_id) = show_id?;
    let map = state.engine.seat_map(ShowId(show_id)).await?;

    let seats = map
        .seats
        .iter()
        .map(|(seat, status)| SeatView {
            seat_id: seat.to_string(),
            status: status_label(status).to_string(),
        })
        .collect();

    Ok(Json(SeatMapResponse {
        show_id,
        movie_title: map.show.movie_title,
        cinema: map.show.cinema,
        starts_at: map.show.window.starts_at,
        ends_at: map.show.window.ends_at,
        availability: map.availability,
        seats,
    }))
}

/// GET /v1/shows/{show_id}/stream
/// Server-sent seat events for one show
pub async fn stream_seat_events(
    State(state): State<AppState>,
    show_id: Result<Path<u64>, PathRejection>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    let Path(show_id) = show_id?;
    if state.engine.find_show(ShowId(show_id)).await?.is_none() {
        return Err(AppError::NotFoundError {
            code: "SHOW_NOT_FOUND",
            message: format!("Show {} not found", show_id),
        });
    }

    let rx = state.events.subscribe();
    tracing::debug!("SSE subscriber attached to show {}", show_id);

    let stream = BroadcastStream::new(rx).filter_map(move |result| async move {
        match result {
            Ok(event) if event.show_id() == show_id => match Event::default().event(event.name()).json_data(&event) {
                Ok(sse) => Some(Ok(sse)),
                Err(e) => {
                    tracing::error!("Failed to encode {} event: {}", event.name(), e);
                    None
                }
            },
            Ok(_) => None,
            Err(BroadcastStreamRecvError::Lagged(missed)) => {
                tracing::warn!("SSE subscriber for show {} lagged, {} events dropped", show_id, missed);
                None
            }
        }
    });

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}
