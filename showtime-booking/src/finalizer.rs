use crate::error::BookingError;
use crate::models::Booking;
use showtime_catalog::LedgerError;
use showtime_core::ids::seat_labels;
use showtime_core::{BookingId, HoldId, UserIdentity};
use showtime_hold::{HoldManager, HoldState};
use showtime_shared::{BookingConfirmedEvent, SeatEvent};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

#[derive(Default)]
struct BookingBook {
    by_id: HashMap<BookingId, Booking>,
    by_hold: HashMap<HoldId, BookingId>,
}

/// Turns live holds into bookings.
pub struct BookingFinalizer {
    holds: Arc<HoldManager>,
    bookings: RwLock<BookingBook>,
}

impl BookingFinalizer {
    pub fn new(holds: Arc<HoldManager>) -> Self {
        Self {
            holds,
            bookings: RwLock::new(BookingBook::default()),
        }
    }

    /// Confirm a hold for `user`.
    ///
    /// A hold that already produced a booking returns that booking again, so a
    /// client retrying after a lost response neither errors nor books twice.
    /// The deadline is checked here and not left to the sweeper.
    pub async fn confirm_hold(&self, hold_id: HoldId, user: UserIdentity) -> Result<Booking, BookingError> {
        if let Some(booking) = self.booking_for_hold(hold_id).await {
            return Ok(booking);
        }

        let mut hold = self.holds.lock(hold_id).await.ok_or(BookingError::HoldNotFound(hold_id))?;

        match hold.state() {
            HoldState::Active => {}
            HoldState::Confirmed => {
                // confirmed by a concurrent call between the fast path and the lock
                return self
                    .booking_for_hold(hold_id)
                    .await
                    .ok_or_else(|| BookingError::Internal(format!("confirmed hold {} has no booking", hold_id)));
            }
            state => {
                warn!("Confirm rejected for hold {}: state {:?}", hold_id, state);
                return Err(BookingError::HoldExpired(hold_id));
            }
        }

        let now = self.holds.clock().now();
        if hold.is_past_deadline(now) {
            warn!("Confirm rejected for hold {}: deadline {} passed", hold_id, hold.deadline);
            self.holds.expire_locked(&mut hold).await;
            return Err(BookingError::HoldExpired(hold_id));
        }

        // The booking book stays locked across the ledger call so that seats
        // turning Booked and the booking being recorded cannot be split by
        // the caller going away. Lock order: hold → bookings → show.
        let mut book = self.bookings.write().await;
        let booking_id = BookingId::new();
        match self.holds.ledger().confirm(hold.show_id, hold.seats(), hold.id, booking_id).await {
            Ok(()) => {}
            Err(LedgerError::HoldMismatch { seats, .. }) => {
                drop(book);
                warn!("Hold {} lost {} seats before confirmation", hold_id, seats.len());
                self.holds.invalidate_locked(&mut hold).await;
                return Err(BookingError::HoldExpired(hold_id));
            }
            Err(e) => return Err(BookingError::Internal(e.to_string())),
        }

        let booking = Booking::from_hold(booking_id, &hold, user, now);
        book.by_hold.insert(hold_id, booking_id);
        book.by_id.insert(booking_id, booking.clone());
        drop(book);
        hold.mark_confirmed(booking_id, now)
            .map_err(|e| BookingError::Internal(e.to_string()))?;

        info!("Booking {} confirmed from hold {} ({} seats on show {})", booking_id, hold_id, booking.seats.len(), booking.show_id);
        self.holds.events().publish(SeatEvent::BookingConfirmed(BookingConfirmedEvent {
            show_id: booking.show_id.0,
            booking_id: booking_id.0,
            hold_id: hold_id.0,
            seat_ids: seat_labels(&booking.seats),
            timestamp: now.timestamp(),
        }));

        Ok(booking)
    }

    pub async fn get_booking(&self, booking_id: BookingId) -> Result<Booking, BookingError> {
        self.bookings
            .read()
            .await
            .by_id
            .get(&booking_id)
            .cloned()
            .ok_or(BookingError::BookingNotFound(booking_id))
    }

    async fn booking_for_hold(&self, hold_id: HoldId) -> Option<Booking> {
        let book = self.bookings.read().await;
        let booking_id = book.by_hold.get(&hold_id)?;
        book.by_id.get(booking_id).cloned()
    }

    pub async fn booking_count(&self) -> usize {
        self.bookings.read().await.by_id.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use showtime_catalog::{SeatLedger, SeatStatus};
    use showtime_core::{Clock, ManualClock, SeatId, ShowId};
    use showtime_store::EventProducer;
    use std::collections::BTreeSet;

    fn seats(labels: &[&str]) -> BTreeSet<SeatId> {
        labels.iter().map(|s| SeatId::from(*s)).collect()
    }

    fn user() -> UserIdentity {
        UserIdentity::new("Jane Doe", "jane@example.com").unwrap()
    }

    async fn setup() -> (BookingFinalizer, Arc<HoldManager>, Arc<ManualClock>) {
        let ledger = Arc::new(SeatLedger::new());
        ledger.register_show(ShowId(1), seats(&["A1", "A2", "B1"])).await;
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let holds = Arc::new(HoldManager::new(ledger, clock.clone(), EventProducer::default(), Duration::minutes(5)));
        (BookingFinalizer::new(holds.clone()), holds, clock)
    }

    #[tokio::test]
    async fn test_confirm_books_seats() {
        let (finalizer, holds, _) = setup().await;
        let hold = holds.create_hold(ShowId(1), seats(&["A1", "A2"])).await.unwrap();

        let booking = finalizer.confirm_hold(hold.id, user()).await.unwrap();
        assert_eq!(booking.hold_id, hold.id);
        assert_eq!(booking.seats, seats(&["A1", "A2"]));

        for seat in ["A1", "A2"] {
            assert_eq!(
                holds.ledger().status(ShowId(1), &SeatId::from(seat)).await,
                Some(SeatStatus::Booked { booking_id: booking.id })
            );
        }
        let hold = holds.get(hold.id).await.unwrap();
        assert_eq!(hold.state(), HoldState::Confirmed);
        assert_eq!(hold.booking_id, Some(booking.id));
        assert_eq!(finalizer.get_booking(booking.id).await.unwrap(), booking);
    }

    #[tokio::test]
    async fn test_confirm_is_idempotent() {
        let (finalizer, holds, _) = setup().await;
        let hold = holds.create_hold(ShowId(1), seats(&["A1"])).await.unwrap();

        let first = finalizer.confirm_hold(hold.id, user()).await.unwrap();
        let second = finalizer.confirm_hold(hold.id, user()).await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(finalizer.booking_count().await, 1);
    }

    #[tokio::test]
    async fn test_confirm_checks_deadline_before_sweep() {
        let (finalizer, holds, clock) = setup().await;
        let hold = holds.create_hold(ShowId(1), seats(&["A1"])).await.unwrap();
        clock.advance(Duration::minutes(5) + Duration::seconds(1));

        let err = finalizer.confirm_hold(hold.id, user()).await.unwrap_err();
        assert!(matches!(err, BookingError::HoldExpired(id) if id == hold.id));
        assert_eq!(holds.get(hold.id).await.unwrap().state(), HoldState::Expired);
        assert_eq!(holds.ledger().status(ShowId(1), &SeatId::from("A1")).await, Some(SeatStatus::Available));
    }

    #[tokio::test]
    async fn test_confirm_exactly_at_deadline_succeeds() {
        let (finalizer, holds, clock) = setup().await;
        let hold = holds.create_hold(ShowId(1), seats(&["A1"])).await.unwrap();
        clock.set(hold.deadline);

        assert!(finalizer.confirm_hold(hold.id, user()).await.is_ok());
    }

    #[tokio::test]
    async fn test_confirm_after_cancel_is_expired() {
        let (finalizer, holds, _) = setup().await;
        let hold = holds.create_hold(ShowId(1), seats(&["A1"])).await.unwrap();
        holds.cancel_hold(hold.id).await.unwrap();

        let err = finalizer.confirm_hold(hold.id, user()).await.unwrap_err();
        assert!(matches!(err, BookingError::HoldExpired(_)));
        assert_eq!(finalizer.booking_count().await, 0);
    }

    #[tokio::test]
    async fn test_cancel_after_confirm_keeps_booking() {
        let (finalizer, holds, _) = setup().await;
        let hold = holds.create_hold(ShowId(1), seats(&["A1"])).await.unwrap();
        let booking = finalizer.confirm_hold(hold.id, user()).await.unwrap();

        assert_eq!(holds.cancel_hold(hold.id).await.unwrap(), HoldState::Confirmed);
        assert_eq!(
            holds.ledger().status(ShowId(1), &SeatId::from("A1")).await,
            Some(SeatStatus::Booked { booking_id: booking.id })
        );
    }

    #[tokio::test]
    async fn test_lost_seats_surface_as_expired() {
        let (finalizer, holds, _) = setup().await;
        let hold = holds.create_hold(ShowId(1), seats(&["A1", "A2"])).await.unwrap();
        // seat A2 released behind the hold's back
        holds.ledger().release(ShowId(1), &seats(&["A2"]), hold.id).await;

        let err = finalizer.confirm_hold(hold.id, user()).await.unwrap_err();
        assert!(matches!(err, BookingError::HoldExpired(_)));
        assert_eq!(holds.get(hold.id).await.unwrap().state(), HoldState::Expired);
        assert_eq!(holds.ledger().status(ShowId(1), &SeatId::from("A1")).await, Some(SeatStatus::Available));
    }

    #[tokio::test]
    async fn test_unknown_hold_and_booking() {
        let (finalizer, _, _) = setup().await;
        assert!(matches!(
            finalizer.confirm_hold(HoldId::new(), user()).await,
            Err(BookingError::HoldNotFound(_))
        ));
        assert!(matches!(
            finalizer.get_booking(BookingId::new()).await,
            Err(BookingError::BookingNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_confirm_survives_hold_purge() {
        let (finalizer, holds, clock) = setup().await;
        let hold = holds.create_hold(ShowId(1), seats(&["B1"])).await.unwrap();
        let booking = finalizer.confirm_hold(hold.id, user()).await.unwrap();

        clock.advance(Duration::days(1));
        assert_eq!(holds.purge_terminal(clock.now(), Duration::hours(1)).await, 1);

        let again = finalizer.confirm_hold(hold.id, user()).await.unwrap();
        assert_eq!(again.id, booking.id);
    }

    #[tokio::test]
    async fn test_abandoned_confirm_books_nothing() {
        let (finalizer, holds, _) = setup().await;
        let finalizer = Arc::new(finalizer);
        let hold = holds.create_hold(ShowId(1), seats(&["A1"])).await.unwrap();

        // readers on the booking book keep the confirm parked
        let reader = finalizer.bookings.read().await;
        let pending = {
            let finalizer = finalizer.clone();
            tokio::spawn(async move { finalizer.confirm_hold(hold.id, user()).await })
        };
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        pending.abort();
        assert!(pending.await.unwrap_err().is_cancelled());
        drop(reader);

        assert!(matches!(
            holds.ledger().status(ShowId(1), &SeatId::from("A1")).await,
            Some(SeatStatus::Held { hold_id, .. }) if hold_id == hold.id
        ));
        assert_eq!(holds.get(hold.id).await.unwrap().state(), HoldState::Active);

        // the hold is still good
        let booking = finalizer.confirm_hold(hold.id, user()).await.unwrap();
        assert_eq!(
            holds.ledger().status(ShowId(1), &SeatId::from("A1")).await,
            Some(SeatStatus::Booked { booking_id: booking.id })
        );
    }
}
