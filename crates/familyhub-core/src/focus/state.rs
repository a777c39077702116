use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub enum FocusStatus {
    #[default]
    Idle,
    Running,
    Completed,
    Stopped,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FocusSession {
    pub total_seconds: u32,
    pub remaining_seconds: u32,
    pub started_at: Option<DateTime<Utc>>,
}

/// Notifications published as a session progresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum FocusEvent {
    Started { total_seconds: u32 },
    Tick { remaining_seconds: u32 },
    Completed { total_seconds: u32 },
    Cancelled { remaining_seconds: u32 },
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusError {
    #[error("a focus session is already running")]
    AlreadyRunning,

    #[error("focus session length must be greater than zero")]
    InvalidDuration,
}

/// Countdown state machine: `idle -> running -> completed | stopped -> idle`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FocusState {
    pub status: FocusStatus,
    pub session: Option<FocusSession>,
}

impl FocusState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn remaining_seconds(&self) -> u32 {
        self.session.as_ref().map_or(0, |s| s.remaining_seconds)
    }

    /// Start a countdown. A finished or stopped session is acknowledged first;
    /// a running one is left alone and the request rejected.
    pub fn begin(&mut self, total_seconds: u32, now: DateTime<Utc>) -> Result<FocusEvent, FocusError> {
        if self.status == FocusStatus::Running {
            return Err(FocusError::AlreadyRunning);
        }
        if total_seconds == 0 {
            return Err(FocusError::InvalidDuration);
        }
        *self = Self {
            status: FocusStatus::Running,
            session: Some(FocusSession {
                total_seconds,
                remaining_seconds: total_seconds,
                started_at: Some(now),
            }),
        };
        Ok(FocusEvent::Started { total_seconds })
    }

    /// One second elapsed. Returns `None` unless running.
    pub fn tick(&mut self) -> Option<FocusEvent> {
        if self.status != FocusStatus::Running {
            return None;
        }
        let session = self.session.as_mut()?;
        session.remaining_seconds = session.remaining_seconds.saturating_sub(1);
        if session.remaining_seconds == 0 {
            self.status = FocusStatus::Completed;
            Some(FocusEvent::Completed {
                total_seconds: session.total_seconds,
            })
        } else {
            Some(FocusEvent::Tick {
                remaining_seconds: session.remaining_seconds,
            })
        }
    }

    pub fn cancel(&mut self) -> Option<FocusEvent> {
        if self.status != FocusStatus::Running {
            return None;
        }
        self.status = FocusStatus::Stopped;
        Some(FocusEvent::Cancelled {
            remaining_seconds: self.remaining_seconds(),
        })
    }

    /// Return a completed or stopped timer to idle, dropping the session.
    pub fn acknowledge(&mut self) -> bool {
        match self.status {
            FocusStatus::Completed | FocusStatus::Stopped => {
                *self = Self::default();
                true
            }
            FocusStatus::Idle | FocusStatus::Running => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_runs_to_completion() {
        let mut state = FocusState::new();
        assert_eq!(state.begin(5, Utc::now()), Ok(FocusEvent::Started { total_seconds: 5 }));

        for expected in (1..5).rev() {
            assert_eq!(state.tick(), Some(FocusEvent::Tick { remaining_seconds: expected }));
        }
        assert_eq!(state.tick(), Some(FocusEvent::Completed { total_seconds: 5 }));
        assert_eq!(state.status, FocusStatus::Completed);
        assert_eq!(state.remaining_seconds(), 0);

        // Terminal: a sixth tick changes nothing
        assert_eq!(state.tick(), None);
        assert_eq!(state.status, FocusStatus::Completed);
        assert_eq!(state.remaining_seconds(), 0);
    }

    #[test]
    fn test_begin_while_running_is_rejected() {
        let mut state = FocusState::new();
        state.begin(10, Utc::now()).unwrap();
        state.tick();

        assert_eq!(state.begin(3, Utc::now()), Err(FocusError::AlreadyRunning));
        assert_eq!(state.remaining_seconds(), 9);
        assert_eq!(state.session.as_ref().unwrap().total_seconds, 10);
    }

    #[test]
    fn test_zero_length_rejected() {
        let mut state = FocusState::new();
        assert_eq!(state.begin(0, Utc::now()), Err(FocusError::InvalidDuration));
        assert_eq!(state.status, FocusStatus::Idle);
    }

    #[test]
    fn test_cancel() {
        let mut state = FocusState::new();
        assert_eq!(state.cancel(), None);

        state.begin(60, Utc::now()).unwrap();
        state.tick();
        assert_eq!(state.cancel(), Some(FocusEvent::Cancelled { remaining_seconds: 59 }));
        assert_eq!(state.status, FocusStatus::Stopped);
        assert_eq!(state.cancel(), None);
        assert_eq!(state.tick(), None);
    }

    #[test]
    fn test_acknowledge_returns_to_idle() {
        let mut state = FocusState::new();
        assert!(!state.acknowledge());

        state.begin(1, Utc::now()).unwrap();
        assert!(!state.acknowledge());
        state.tick();
        assert!(state.acknowledge());
        assert_eq!(state.status, FocusStatus::Idle);
        assert!(state.session.is_none());
    }

    #[test]
    fn test_begin_after_stop_starts_new_session() {
        let mut state = FocusState::new();
        state.begin(30, Utc::now()).unwrap();
        state.cancel();

        state.begin(15, Utc::now()).unwrap();
        assert_eq!(state.status, FocusStatus::Running);
        assert_eq!(state.remaining_seconds(), 15);
    }

    #[test]
    fn test_event_json_shape() {
        let json = serde_json::to_string(&FocusEvent::Tick { remaining_seconds: 3 }).unwrap();
        assert_eq!(json, r#"{"kind":"tick","remainingSeconds":3}"#);

        let started: FocusEvent = serde_json::from_str(r#"{"kind":"started","totalSeconds":60}"#).unwrap();
        assert_eq!(started, FocusEvent::Started { total_seconds: 60 });
    }

    #[test]
    fn test_event_and_state_fields_share_casing() {
        let mut state = FocusState::new();
        state.begin(5, Utc::now()).unwrap();
        let state_json = serde_json::to_value(&state).unwrap();
        assert!(state_json["session"].get("remainingSeconds").is_some());

        let event_json = serde_json::to_value(FocusEvent::Cancelled { remaining_seconds: 2 }).unwrap();
        assert_eq!(event_json["remainingSeconds"], 2);
        assert!(event_json.get("remaining_seconds").is_none());
    }
}
