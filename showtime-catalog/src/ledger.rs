use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use showtime_core::{BookingId, HoldId, SeatId, ShowId};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

/// Authoritative status of one seat of one show.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SeatStatus {
    Available,
    Held {
        hold_id: HoldId,
        deadline: DateTime<Utc>,
    },
    Booked {
        booking_id: BookingId,
    },
}

impl SeatStatus {
    fn is_held_by(&self, expected: HoldId) -> bool {
        matches!(self, SeatStatus::Held { hold_id, .. } if *hold_id == expected)
    }
}

/// Seat counts for a show, as exposed on the seat map endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatAvailability {
    pub total: usize,
    pub available: usize,
    pub held: usize,
    pub booked: usize,
}

#[derive(Debug, Default)]
struct ShowSeats {
    seats: BTreeMap<SeatId, SeatStatus>,
}

impl ShowSeats {
    fn unknown<'a>(&self, requested: impl IntoIterator<Item = &'a SeatId>) -> Vec<SeatId> {
        requested
            .into_iter()
            .filter(|seat| !self.seats.contains_key(*seat))
            .cloned()
            .collect()
    }
}

/// Per-show seat state. Every show has its own lock, so contention on one
/// screening never blocks another. All mutations apply to a whole seat set or
/// to none of it.
#[derive(Default)]
pub struct SeatLedger {
    shows: RwLock<HashMap<ShowId, Arc<Mutex<ShowSeats>>>>,
}

impl SeatLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the seat map of a show with every seat available.
    /// Returns false if the show was already registered; its state is left alone.
    pub async fn register_show(&self, show_id: ShowId, seats: impl IntoIterator<Item = SeatId>) -> bool {
        if self.shows.read().await.contains_key(&show_id) {
            return false;
        }

        let mut shows = self.shows.write().await;
        if shows.contains_key(&show_id) {
            return false;
        }

        let seats = seats
            .into_iter()
            .map(|seat| (seat, SeatStatus::Available))
            .collect::<BTreeMap<_, _>>();
        debug!("Registered show {} with {} seats", show_id, seats.len());
        shows.insert(show_id, Arc::new(Mutex::new(ShowSeats { seats })));
        true
    }

    async fn show(&self, show_id: ShowId) -> Result<Arc<Mutex<ShowSeats>>, LedgerError> {
        self.shows
            .read()
            .await
            .get(&show_id)
            .cloned()
            .ok_or(LedgerError::UnknownShow(show_id))
    }

    /// Hold every requested seat for `hold_id`, or none of them.
    pub async fn try_reserve(
        &self,
        show_id: ShowId,
        seats: &BTreeSet<SeatId>,
        hold_id: HoldId,
        deadline: DateTime<Utc>,
    ) -> Result<(), LedgerError> {
        let show = self.show(show_id).await?;
        let mut show = show.lock().await;

        let unknown = show.unknown(seats);
        if !unknown.is_empty() {
            return Err(LedgerError::UnknownSeats(unknown));
        }

        let taken: Vec<SeatId> = seats
            .iter()
            .filter(|seat| show.seats.get(*seat) != Some(&SeatStatus::Available))
            .cloned()
            .collect();
        if !taken.is_empty() {
            return Err(LedgerError::SeatsUnavailable(taken));
        }

        for seat in seats {
            show.seats.insert(seat.clone(), SeatStatus::Held { hold_id, deadline });
        }
        debug!("Show {}: {} seats held by {}", show_id, seats.len(), hold_id);
        Ok(())
    }

    /// Return seats held by `expected` to the pool. Seats held by anyone else,
    /// booked, or already available are skipped, which makes this safe to race
    /// with confirmation and expiry. Returns how many seats were released.
    pub async fn release(&self, show_id: ShowId, seats: &BTreeSet<SeatId>, expected: HoldId) -> usize {
        let Ok(show) = self.show(show_id).await else {
            return 0;
        };
        let mut show = show.lock().await;

        let mut released = 0;
        for seat in seats {
            if let Some(status) = show.seats.get_mut(seat) {
                if status.is_held_by(expected) {
                    *status = SeatStatus::Available;
                    released += 1;
                }
            }
        }
        debug!("Show {}: released {} seats of {}", show_id, released, expected);
        released
    }

    /// Turn seats held by `expected` into booked seats. Fails without touching
    /// anything if any seat is no longer held by that hold.
    pub async fn confirm(
        &self,
        show_id: ShowId,
        seats: &BTreeSet<SeatId>,
        expected: HoldId,
        booking_id: BookingId,
    ) -> Result<(), LedgerError> {
        let show = self.show(show_id).await?;
        let mut show = show.lock().await;

        let lost: Vec<SeatId> = seats
            .iter()
            .filter(|seat| !show.seats.get(*seat).is_some_and(|s| s.is_held_by(expected)))
            .cloned()
            .collect();
        if !lost.is_empty() {
            return Err(LedgerError::HoldMismatch { hold_id: expected, seats: lost });
        }

        for seat in seats {
            show.seats.insert(seat.clone(), SeatStatus::Booked { booking_id });
        }
        debug!("Show {}: {} seats booked under {}", show_id, seats.len(), booking_id);
        Ok(())
    }

    pub async fn status(&self, show_id: ShowId, seat: &SeatId) -> Option<SeatStatus> {
        let show = self.show(show_id).await.ok()?;
        let show = show.lock().await;
        show.seats.get(seat).cloned()
    }

    /// Consistent copy of a show's whole seat map.
    pub async fn snapshot(&self, show_id: ShowId) -> Option<BTreeMap<SeatId, SeatStatus>> {
        let show = self.show(show_id).await.ok()?;
        let show = show.lock().await;
        Some(show.seats.clone())
    }

    pub async fn availability(&self, show_id: ShowId) -> Option<SeatAvailability> {
        let snapshot = self.snapshot(show_id).await?;
        let mut counts = SeatAvailability { total: snapshot.len(), ..Default::default() };
        for status in snapshot.values() {
            match status {
                SeatStatus::Available => counts.available += 1,
                SeatStatus::Held { .. } => counts.held += 1,
                SeatStatus::Booked { .. } => counts.booked += 1,
            }
        }
        Some(counts)
    }
}

fn join_seats(seats: &[SeatId]) -> String {
    seats.iter().map(SeatId::as_str).collect::<Vec<_>>().join(", ")
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("Show not registered: {0}")]
    UnknownShow(ShowId),

    #[error("Seats not part of the show: {}", join_seats(.0))]
    UnknownSeats(Vec<SeatId>),

    #[error("Seats unavailable: {}", join_seats(.0))]
    SeatsUnavailable(Vec<SeatId>),

    #[error("Seats no longer held by {hold_id}: {}", join_seats(.seats))]
    HoldMismatch {
        hold_id: HoldId,
        seats: Vec<SeatId>,
    },
}
