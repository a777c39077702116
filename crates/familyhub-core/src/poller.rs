//! Bounded-duration repeating scheduler.

use std::time::Duration;

use thiserror::Error;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::debug;

use crate::schedule::ScheduledTask;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PollerError {
    #[error("poll interval must be greater than zero")]
    ZeroInterval,
}

/// Running poller. Stopping is idempotent and a no-op once the duration ran out.
#[derive(Debug)]
pub struct PollerHandle {
    task: ScheduledTask,
}

impl PollerHandle {
    pub fn stop(&mut self) {
        self.task.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait until the total duration elapses (or the poller is stopped).
    pub async fn finished(&mut self) {
        self.task.finished().await;
    }
}

/// Call `tick` now and then every `interval`, for as long as the scheduled
/// tick time is within `total` of the start.
///
/// `tick` is synchronous; async work it kicks off is not awaited. Ticks never
/// overlap because they run one after another on the poller's own task.
pub fn start<F>(interval: Duration, total: Duration, mut tick: F) -> Result<PollerHandle, PollerError>
where
    F: FnMut() + Send + 'static,
{
    if interval.is_zero() {
        return Err(PollerError::ZeroInterval);
    }

    // Ticks at 0, interval, 2*interval, ... up to and including `total`.
    let max_ticks = total.as_nanos() / interval.as_nanos() + 1;
    let started = Instant::now();
    let task = ScheduledTask::spawn(async move {
        let mut ticker = tokio::time::interval_at(started, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut ticks: u128 = 0;
        while ticks < max_ticks {
            let at = ticker.tick().await;
            if at.duration_since(started) > total {
                break;
            }
            tick();
            ticks += 1;
        }
        debug!(ticks, "Poller reached its total duration");
    });

    Ok(PollerHandle { task })
}
