//! Retrying remote reads.
//!
//! `fetch_with_retry` wraps one remote call, retrying transient failures with
//! exponential backoff as described by a `RetryPolicy`.

pub mod policy;
pub mod retry;

pub use policy::{PolicyError, RetryPolicy};
pub use retry::{fetch_with_retry, FetchOutcome};
