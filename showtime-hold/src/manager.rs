use crate::models::{Hold, HoldState};
use chrono::{DateTime, Duration};
use showtime_catalog::{LedgerError, SeatLedger};
use showtime_core::ids::seat_labels;
use showtime_core::{Clock, HoldId, SeatId, ShowId};
use showtime_shared::{HoldCreatedEvent, HoldReleasedEvent, ReleaseReason, SeatEvent};
use showtime_store::EventProducer;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use tracing::{info, warn};

/// Owns every hold record and drives holds through their lifecycle.
///
/// Each hold sits behind its own mutex; create, cancel, expire and confirm on
/// one hold are therefore serialized while different holds proceed in
/// parallel. Callers that take a hold's lock and then touch the ledger keep
/// the order hold → show, which is the only order used in the workspace.
pub struct HoldManager {
    holds: RwLock<HashMap<HoldId, Arc<Mutex<Hold>>>>,
    ledger: Arc<SeatLedger>,
    clock: Arc<dyn Clock>,
    events: EventProducer,
    ttl: Duration,
}

impl HoldManager {
    pub fn new(ledger: Arc<SeatLedger>, clock: Arc<dyn Clock>, events: EventProducer, ttl: Duration) -> Self {
        Self {
            holds: RwLock::new(HashMap::new()),
            ledger,
            clock,
            events,
            ttl,
        }
    }

    pub fn ledger(&self) -> &Arc<SeatLedger> {
        &self.ledger
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub fn events(&self) -> &EventProducer {
        &self.events
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Reserve `seats` on the ledger and record an `Active` hold for them.
    /// Nothing is recorded when the seats cannot be reserved.
    ///
    /// The record is published, still locked, before the ledger is touched.
    /// If the caller goes away mid-way the seats are either not reserved at
    /// all or owned by a recorded hold the sweeper will expire.
    pub async fn create_hold(&self, show_id: ShowId, seats: BTreeSet<SeatId>) -> Result<Hold, HoldError> {
        if seats.is_empty() {
            return Err(HoldError::EmptySelection);
        }

        let hold = Hold::new(show_id, seats, self.clock.now(), self.ttl);
        let handle = Arc::new(Mutex::new(hold.clone()));
        let mut record = handle.clone().lock_owned().await;
        self.holds.write().await.insert(hold.id, handle);

        match self.ledger.try_reserve(show_id, hold.seats(), hold.id, hold.deadline).await {
            Ok(()) => {}
            Err(e) => {
                // nothing reserved; an abandoned record would only ever be expired
                let _ = record.transition(HoldState::Expired, hold.created_at);
                drop(record);
                self.holds.write().await.remove(&hold.id);
                return Err(match e {
                    LedgerError::SeatsUnavailable(taken) => {
                        warn!("Hold rejected for show {}: {} seats unavailable", show_id, taken.len());
                        HoldError::SeatsUnavailable(taken)
                    }
                    other => other.into(),
                });
            }
        }
        drop(record);

        info!("Hold {} created for show {} ({} seats, deadline {})", hold.id, show_id, hold.seats().len(), hold.deadline);
        self.events.publish(SeatEvent::HoldCreated(HoldCreatedEvent {
            show_id: show_id.0,
            hold_id: hold.id.0,
            seat_ids: seat_labels(hold.seats()),
            expires_at: hold.deadline.timestamp(),
            held_at: hold.created_at.timestamp(),
        }));

        Ok(hold)
    }

    pub async fn get(&self, hold_id: HoldId) -> Option<Hold> {
        let hold = self.holds.read().await.get(&hold_id).cloned()?;
        let hold = hold.lock().await;
        Some(hold.clone())
    }

    /// Exclusive access to one hold. Other lifecycle calls on the same hold
    /// wait until the guard is dropped.
    pub async fn lock(&self, hold_id: HoldId) -> Option<OwnedMutexGuard<Hold>> {
        let hold = self.holds.read().await.get(&hold_id).cloned()?;
        Some(hold.lock_owned().await)
    }

    /// Client-initiated release. Terminal holds are left as they are and their
    /// state is returned, so retries are harmless.
    pub async fn cancel_hold(&self, hold_id: HoldId) -> Result<HoldState, HoldError> {
        let mut hold = self.lock(hold_id).await.ok_or(HoldError::NotFound(hold_id))?;

        if hold.state().is_terminal() {
            return Ok(hold.state());
        }

        self.close(&mut hold, HoldState::Cancelled).await?;
        Ok(HoldState::Cancelled)
    }

    /// Expire a hold whose deadline has passed. Returns false (and does
    /// nothing) for unknown holds, terminal holds and holds still in time.
    pub async fn expire(&self, hold_id: HoldId) -> bool {
        match self.lock(hold_id).await {
            Some(mut hold) => self.expire_locked(&mut hold).await,
            None => false,
        }
    }

    /// Same as [`HoldManager::expire`] for a caller already holding the hold's lock.
    pub async fn expire_locked(&self, hold: &mut Hold) -> bool {
        if hold.state() != HoldState::Active || !hold.is_past_deadline(self.clock.now()) {
            return false;
        }

        self.close(hold, HoldState::Expired).await.is_ok()
    }

    /// Mark an active hold as expired regardless of its deadline, releasing
    /// whatever seats it still holds. Used when its seats were lost on the ledger.
    pub async fn invalidate_locked(&self, hold: &mut Hold) {
        if hold.state() == HoldState::Active {
            // cannot fail from Active
            let _ = self.close(hold, HoldState::Expired).await;
        }
    }

    async fn close(&self, hold: &mut Hold, to: HoldState) -> Result<(), HoldError> {
        let reason = match to {
            HoldState::Cancelled => ReleaseReason::Cancelled,
            _ => ReleaseReason::Expired,
        };
        let now = self.clock.now();

        // seats go back before the state changes: an interrupted close leaves
        // an Active hold whose seats are free, never a closed hold owning seats
        hold.can_transition(to)?;
        let released = self.ledger.release(hold.show_id, hold.seats(), hold.id).await;
        hold.transition(to, now)?;

        info!("Hold {} {:?}: released {} seats on show {}", hold.id, to, released, hold.show_id);
        self.events.publish(SeatEvent::HoldReleased(HoldReleasedEvent {
            show_id: hold.show_id.0,
            hold_id: hold.id.0,
            seat_ids: seat_labels(hold.seats()),
            reason,
            released_at: now.timestamp(),
        }));
        Ok(())
    }

    async fn handles(&self) -> Vec<Arc<Mutex<Hold>>> {
        self.holds.read().await.values().cloned().collect()
    }

    /// Active holds whose deadline is before `now`. Holds busy with another
    /// operation are skipped; the next scan picks them up.
    pub async fn expired_candidates(&self, now: DateTime<chrono::Utc>) -> Vec<HoldId> {
        self.handles()
            .await
            .iter()
            .filter_map(|handle| {
                let hold = handle.try_lock().ok()?;
                (hold.state() == HoldState::Active && hold.deadline < now).then_some(hold.id)
            })
            .collect()
    }

    /// Drop terminal hold records whose deadline is older than `retention`.
    /// Bookings outlive their holds; only the hold record goes away.
    pub async fn purge_terminal(&self, now: DateTime<chrono::Utc>, retention: Duration) -> usize {
        let stale: Vec<HoldId> = self
            .handles()
            .await
            .iter()
            .filter_map(|handle| {
                let hold = handle.try_lock().ok()?;
                (hold.state().is_terminal() && hold.deadline + retention < now).then_some(hold.id)
            })
            .collect();

        if stale.is_empty() {
            return 0;
        }

        // terminal states never change, so the scan above is still valid
        let mut holds = self.holds.write().await;
        stale.iter().filter(|id| holds.remove(id).is_some()).count()
    }

    pub async fn active_count(&self) -> usize {
        let mut count = 0;
        for handle in self.handles().await {
            if handle.lock().await.state() == HoldState::Active {
                count += 1;
            }
        }
        count
    }
}

#[derive(Debug, thiserror::Error)]
pub enum HoldError {
    #[error("Hold not found: {0}")]
    NotFound(HoldId),

    #[error("A hold needs at least one seat")]
    EmptySelection,

    #[error("Seats unavailable: {0:?}")]
    SeatsUnavailable(Vec<SeatId>),

    #[error("Invalid hold transition from {from:?} to {to:?}")]
    InvalidTransition {
        from: HoldState,
        to: HoldState,
    },

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}
