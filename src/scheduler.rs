use crossbeam_channel::Receiver;
use std::time::{Duration, Instant};

/// Fixed-period ticker. The underlying channel holds at most one pending
/// tick, so a busy consumer sees ticks coalesced rather than queued.
#[derive(Debug)]
pub struct ReportScheduler {
    period: Duration,
    ticks: Receiver<Instant>,
}

impl ReportScheduler {
    pub fn start(period: Duration) -> Self {
        Self {
            period,
            ticks: crossbeam_channel::tick(period),
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn ticks(&self) -> Receiver<Instant> {
        self.ticks.clone()
    }
}
