use showtime_core::{BookingId, CoreError, HoldId, SeatId, ShowId};
use showtime_hold::HoldError;

fn join_seats(seats: &[SeatId]) -> String {
    seats.iter().map(SeatId::as_str).collect::<Vec<_>>().join(", ")
}

/// Everything the booking engine reports to its callers. Ledger-level
/// mismatches never appear here; they surface as `HoldExpired`.
#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("Seats unavailable: {}", join_seats(.0))]
    SeatsUnavailable(Vec<SeatId>),

    #[error("Hold not found: {0}")]
    HoldNotFound(HoldId),

    #[error("Hold expired: {0}")]
    HoldExpired(HoldId),

    #[error("Booking not found: {0}")]
    BookingNotFound(BookingId),

    #[error("Show not found: {0}")]
    ShowNotFound(ShowId),

    #[error("Show {0} is no longer open for booking")]
    ShowClosed(ShowId),

    #[error("Seats not part of the show: {}", join_seats(.0))]
    UnknownSeats(Vec<SeatId>),

    #[error("At least one seat must be selected")]
    EmptySeatSelection,

    #[error("Too many seats requested: {requested} (max {max})")]
    TooManySeats {
        requested: usize,
        max: usize,
    },

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Internal booking error: {0}")]
    Internal(String),
}

impl From<HoldError> for BookingError {
    fn from(err: HoldError) -> Self {
        match err {
            HoldError::NotFound(id) => BookingError::HoldNotFound(id),
            HoldError::EmptySelection => BookingError::EmptySeatSelection,
            HoldError::SeatsUnavailable(seats) => BookingError::SeatsUnavailable(seats),
            HoldError::Ledger(showtime_catalog::LedgerError::UnknownSeats(seats)) => BookingError::UnknownSeats(seats),
            other => BookingError::Internal(other.to_string()),
        }
    }
}
