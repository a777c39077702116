//! Focus timer.
//!
//! `FocusState` is the countdown state machine; `FocusTimer` runs it on a
//! one-second ticker and publishes `FocusEvent`s over a channel.

pub mod controller;
pub mod state;

pub use controller::FocusTimer;
pub use state::{FocusError, FocusEvent, FocusSession, FocusState, FocusStatus};
