use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::ids::{SeatId, ShowId};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ShowWindow {
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
}

/// A screening as published by the catalog. Read-only from the engine's point of view.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Show {
    pub id: ShowId,
    pub movie_title: String,
    pub cinema: String,
    pub window: ShowWindow,
    pub seats: BTreeSet<SeatId>,
}

impl Show {
    pub fn has_seat(&self, seat: &SeatId) -> bool {
        self.seats.contains(seat)
    }

    /// Seats from `requested` that are not part of this show's seat map.
    pub fn unknown_seats<'a>(&self, requested: impl IntoIterator<Item = &'a SeatId>) -> Vec<SeatId> {
        requested
            .into_iter()
            .filter(|seat| !self.has_seat(seat))
            .cloned()
            .collect()
    }

    /// Holds are accepted until the show starts.
    pub fn is_open_for_sale(&self, now: DateTime<Utc>) -> bool {
        now < self.window.starts_at
    }
}
