use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use showtime_core::{BookingId, HoldId, SeatId, ShowId};
use std::collections::BTreeSet;

use crate::manager::HoldError;

/// Hold lifecycle. `Active` is the only state with outgoing transitions.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HoldState {
    Active,
    Confirmed,
    Expired,
    Cancelled,
}

impl HoldState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, HoldState::Active)
    }
}

/// A time-bounded claim on a set of seats of one show.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hold {
    pub id: HoldId,
    pub show_id: ShowId,
    seats: BTreeSet<SeatId>,
    state: HoldState,
    pub booking_id: Option<BookingId>,
    pub created_at: DateTime<Utc>,
    pub deadline: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Hold {
    pub fn new(show_id: ShowId, seats: BTreeSet<SeatId>, now: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            id: HoldId::new(),
            show_id,
            seats,
            state: HoldState::Active,
            booking_id: None,
            created_at: now,
            deadline: now + ttl,
            updated_at: now,
        }
    }

    pub fn seats(&self) -> &BTreeSet<SeatId> {
        &self.seats
    }

    pub fn state(&self) -> HoldState {
        self.state
    }

    /// The deadline itself is still inside the hold window.
    pub fn is_past_deadline(&self, now: DateTime<Utc>) -> bool {
        now > self.deadline
    }

    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.state == HoldState::Active && !self.is_past_deadline(now)
    }

    /// Active → {Confirmed, Expired, Cancelled}. Anything else is rejected.
    pub fn can_transition(&self, to: HoldState) -> Result<(), HoldError> {
        if self.state != HoldState::Active || to == HoldState::Active {
            return Err(HoldError::InvalidTransition { from: self.state, to });
        }
        Ok(())
    }

    pub fn transition(&mut self, to: HoldState, now: DateTime<Utc>) -> Result<(), HoldError> {
        self.can_transition(to)?;
        self.state = to;
        self.updated_at = now;
        Ok(())
    }

    pub fn mark_confirmed(&mut self, booking_id: BookingId, now: DateTime<Utc>) -> Result<(), HoldError> {
        self.transition(HoldState::Confirmed, now)?;
        self.booking_id = Some(booking_id);
        Ok(())
    }
}
