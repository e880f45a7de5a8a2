use showtime_shared::SeatEvent;
use tokio::sync::broadcast;
use tracing::debug;

/// In-process fan-out of seat lifecycle events. Publishing never blocks and
/// never fails the caller; subscribers that fall behind lose old events.
#[derive(Clone)]
pub struct EventProducer {
    tx: broadcast::Sender<SeatEvent>,
}

impl EventProducer {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn publish(&self, event: SeatEvent) {
        let name = event.name();
        let show_id = event.show_id();
        match self.tx.send(event) {
            Ok(receivers) => debug!("Published {} for show {} to {} subscribers", name, show_id, receivers),
            Err(_) => debug!("Published {} for show {} with no subscribers", name, show_id),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SeatEvent> {
        self.tx.subscribe()
    }
}

impl Default for EventProducer {
    fn default() -> Self {
        Self::new(256)
    }
}
