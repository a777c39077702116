use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{mpsc, Mutex};
use tokio::time::{self, Instant};
use tracing::{info, warn};

use super::{FocusError, FocusEvent, FocusState};
use crate::schedule::ScheduledTask;

/// Buffer size for the focus event channel.
/// A UI drains it every frame; 32 covers a stalled frame or two.
const CHANNEL_BUFFER_SIZE: usize = 32;

struct Inner {
    state: FocusState,
    ticker: Option<ScheduledTask>,
}

/// Drives a [`FocusState`] once per second and publishes [`FocusEvent`]s.
#[derive(Clone)]
pub struct FocusTimer {
    inner: Arc<Mutex<Inner>>,
    events: mpsc::Sender<FocusEvent>,
    tick_interval: Duration,
}

impl FocusTimer {
    /// Create a timer and the receiving end of its notifications.
    pub fn new() -> (Self, mpsc::Receiver<FocusEvent>) {
        Self::with_tick_interval(Duration::from_secs(1))
    }

    pub fn with_tick_interval(tick_interval: Duration) -> (Self, mpsc::Receiver<FocusEvent>) {
        let (tx, rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);
        let timer = Self {
            inner: Arc::new(Mutex::new(Inner {
                state: FocusState::new(),
                ticker: None,
            })),
            events: tx,
            tick_interval,
        };
        (timer, rx)
    }

    pub async fn state(&self) -> FocusState {
        self.inner.lock().await.state.clone()
    }

    pub async fn begin(&self, total_seconds: u32) -> Result<FocusState, FocusError> {
        let mut inner = self.inner.lock().await;
        let event = inner.state.begin(total_seconds, Utc::now())?;
        // Replacing a finished ticker drops (and aborts) it.
        inner.ticker = Some(self.spawn_ticker());
        publish(&self.events, event);
        info!(total_seconds, "Focus session started");

        Ok(inner.state.clone())
    }

    /// Stop a running session. Returns false if nothing was running.
    pub async fn cancel(&self) -> bool {
        let mut inner = self.inner.lock().await;
        let Some(event) = inner.state.cancel() else {
            return false;
        };
        if let Some(mut ticker) = inner.ticker.take() {
            ticker.cancel();
        }
        publish(&self.events, event);
        info!("Focus session cancelled");
        true
    }

    /// Return a completed or stopped timer to idle.
    pub async fn acknowledge(&self) -> bool {
        let mut inner = self.inner.lock().await;
        let acknowledged = inner.state.acknowledge();
        if acknowledged {
            inner.ticker = None;
        }
        acknowledged
    }

    fn spawn_ticker(&self) -> ScheduledTask {
        let inner = Arc::clone(&self.inner);
        let events = self.events.clone();
        let tick_interval = self.tick_interval;

        ScheduledTask::spawn(async move {
            let mut interval = time::interval_at(Instant::now() + tick_interval, tick_interval);
            loop {
                interval.tick().await;

                // Publish under the lock so a concurrent cancel cannot slip
                // its notification in ahead of a tick.
                let mut guard = inner.lock().await;
                let Some(event) = guard.state.tick() else {
                    break;
                };
                publish(&events, event);
                if matches!(event, FocusEvent::Completed { .. }) {
                    info!("Focus session completed");
                    break;
                }
            }
        })
    }
}

fn publish(tx: &mpsc::Sender<FocusEvent>, event: FocusEvent) {
    if let Err(e) = tx.try_send(event) {
        warn!(error = %e, "Failed to publish focus event");
    }
}
