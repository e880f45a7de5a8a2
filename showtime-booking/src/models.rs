use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use showtime_core::{BookingId, HoldId, SeatId, ShowId, UserIdentity};
use showtime_hold::Hold;
use std::collections::BTreeSet;

/// Bookings are created confirmed and never change afterwards.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    Confirmed,
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BookingStatus::Confirmed => write!(f, "confirmed"),
        }
    }
}

/// The permanent record of seats sold to a customer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Booking {
    pub id: BookingId,
    pub hold_id: HoldId,
    pub show_id: ShowId,
    pub seats: BTreeSet<SeatId>,
    pub user: UserIdentity,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
}

impl Booking {
    pub fn from_hold(id: BookingId, hold: &Hold, user: UserIdentity, now: DateTime<Utc>) -> Self {
        Self {
            id,
            hold_id: hold.id,
            show_id: hold.show_id,
            seats: hold.seats().clone(),
            user,
            status: BookingStatus::Confirmed,
            created_at: now,
        }
    }
}
