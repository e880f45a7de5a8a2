use crate::error::BookingError;
use crate::finalizer::BookingFinalizer;
use crate::models::Booking;
use serde::Serialize;
use showtime_catalog::{SeatAvailability, SeatStatus};
use showtime_core::{BookingId, HoldId, SeatId, Show, ShowCatalog, ShowId, UserIdentity};
use showtime_hold::{Hold, HoldManager, HoldState};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::{info, warn};

/// Seat statuses of one show alongside its catalog entry.
#[derive(Debug, Clone, Serialize)]
pub struct SeatMap {
    pub show: Show,
    pub availability: SeatAvailability,
    pub seats: BTreeMap<SeatId, SeatStatus>,
}

/// Entry point for the transport layer: validates requests against the
/// catalog and routes them to the hold manager and the finalizer.
pub struct BookingEngine {
    catalog: Arc<dyn ShowCatalog>,
    holds: Arc<HoldManager>,
    finalizer: BookingFinalizer,
    max_seats_per_hold: usize,
}

impl BookingEngine {
    pub fn new(catalog: Arc<dyn ShowCatalog>, holds: Arc<HoldManager>, max_seats_per_hold: usize) -> Self {
        let finalizer = BookingFinalizer::new(holds.clone());
        Self {
            catalog,
            holds,
            finalizer,
            max_seats_per_hold,
        }
    }

    pub fn holds(&self) -> &Arc<HoldManager> {
        &self.holds
    }

    pub fn finalizer(&self) -> &BookingFinalizer {
        &self.finalizer
    }

    async fn show(&self, show_id: ShowId) -> Result<Show, BookingError> {
        let show = self
            .catalog
            .get_show(show_id)
            .await?
            .ok_or(BookingError::ShowNotFound(show_id))?;

        // first touch installs the seat map; later calls are no-ops
        self.holds.ledger().register_show(show.id, show.seats.iter().cloned()).await;
        Ok(show)
    }

    /// Place a hold on `seat_ids`. Duplicate labels count once.
    pub async fn hold_seats(&self, show_id: ShowId, seat_ids: Vec<SeatId>) -> Result<Hold, BookingError> {
        let seats: BTreeSet<SeatId> = seat_ids.into_iter().collect();
        if seats.is_empty() {
            return Err(BookingError::EmptySeatSelection);
        }
        if seats.len() > self.max_seats_per_hold {
            return Err(BookingError::TooManySeats {
                requested: seats.len(),
                max: self.max_seats_per_hold,
            });
        }

        let show = self.show(show_id).await?;
        if !show.is_open_for_sale(self.holds.clock().now()) {
            warn!("Hold rejected: show {} started at {}", show_id, show.window.starts_at);
            return Err(BookingError::ShowClosed(show_id));
        }

        let unknown = show.unknown_seats(&seats);
        if !unknown.is_empty() {
            return Err(BookingError::UnknownSeats(unknown));
        }

        Ok(self.holds.create_hold(show_id, seats).await?)
    }

    /// Install the seat map of every catalog show in the ledger up front, so
    /// seat maps and streams are served before the first hold on a show.
    pub async fn register_catalog(&self) -> Result<usize, BookingError> {
        let shows = self.catalog.list_shows().await?;
        let ledger = self.holds.ledger();
        let mut registered = 0;
        for show in &shows {
            if ledger.register_show(show.id, show.seats.iter().cloned()).await {
                registered += 1;
            }
        }
        info!("Registered {} of {} catalog shows in the seat ledger", registered, shows.len());
        Ok(registered)
    }

    /// Catalog lookup without touching the ledger.
    pub async fn find_show(&self, show_id: ShowId) -> Result<Option<Show>, BookingError> {
        Ok(self.catalog.get_show(show_id).await?)
    }

    pub async fn confirm(&self, hold_id: HoldId, user: UserIdentity) -> Result<Booking, BookingError> {
        self.finalizer.confirm_hold(hold_id, user).await
    }

    pub async fn cancel(&self, hold_id: HoldId) -> Result<HoldState, BookingError> {
        Ok(self.holds.cancel_hold(hold_id).await?)
    }

    pub async fn get_hold(&self, hold_id: HoldId) -> Result<Hold, BookingError> {
        self.holds.get(hold_id).await.ok_or(BookingError::HoldNotFound(hold_id))
    }

    pub async fn get_booking(&self, booking_id: BookingId) -> Result<Booking, BookingError> {
        self.finalizer.get_booking(booking_id).await
    }

    pub async fn seat_map(&self, show_id: ShowId) -> Result<SeatMap, BookingError> {
        let show = self.show(show_id).await?;
        let ledger = self.holds.ledger();

        let seats = ledger
            .snapshot(show_id)
            .await
            .ok_or_else(|| BookingError::Internal(format!("show {} missing from ledger", show_id)))?;
        let availability = ledger.availability(show_id).await.unwrap_or_default();

        Ok(SeatMap { show, availability, seats })
    }
}
