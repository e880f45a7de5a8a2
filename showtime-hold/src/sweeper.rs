use crate::manager::HoldManager;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepReport {
    pub expired: usize,
    pub purged: usize,
}

/// Background task returning the seats of lapsed holds to the pool.
///
/// Correctness never depends on the sweeper: confirmation checks deadlines
/// itself. The sweeper only makes expired seats available again and keeps
/// the hold table from growing without bound.
pub struct ExpirySweeper {
    holds: Arc<HoldManager>,
    interval: Duration,
    retention: chrono::Duration,
}

impl ExpirySweeper {
    pub fn new(holds: Arc<HoldManager>, interval: Duration, retention: chrono::Duration) -> Self {
        Self { holds, interval, retention }
    }

    pub async fn sweep_once(&self) -> SweepReport {
        let now = self.holds.clock().now();
        let mut report = SweepReport::default();

        for hold_id in self.holds.expired_candidates(now).await {
            // may have been confirmed or cancelled since the scan
            if self.holds.expire(hold_id).await {
                report.expired += 1;
            }
        }
        report.purged = self.holds.purge_terminal(now, self.retention).await;

        if report != SweepReport::default() {
            info!("Sweep: expired {} holds, purged {} records", report.expired, report.purged);
        } else {
            debug!("Sweep: nothing to do");
        }
        report
    }

    /// Sweep on every tick until `shutdown` is cancelled.
    pub async fn run(self, shutdown: CancellationToken) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!("Expiry sweeper started, interval {:?}", self.interval);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    self.sweep_once().await;
                }
            }
        }

        info!("Expiry sweeper stopped");
    }

    pub fn spawn(self, shutdown: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }
}
