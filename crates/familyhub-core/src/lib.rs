//! familyhub core library.
//!
//! Keeps a dashboard's view of server-owned collections (families, tasks)
//! usable through network failures and stale caches:
//!
//! - `fetch`: retrying remote reads with exponential backoff
//! - `cache`: advisory last-known-good store over a key-value surface
//! - `loader`: fetch-or-fallback producing `fresh | cached | error` snapshots
//! - `poller`: bounded-duration repeating scheduler
//! - `dashboard`: owner of the polled snapshots with `init`/`teardown`
//!
//! Alongside it sit a focus timer (`focus`) and a pure membership advisory
//! (`advisory`) for members leaving a family.

pub mod advisory;
pub mod api;
pub mod auth;
pub mod cache;
pub mod config;
pub mod dashboard;
pub mod fetch;
pub mod focus;
pub mod loader;
pub mod models;
pub mod poller;
pub mod schedule;

pub use advisory::{advise, recommend, Action, Recommendation};
pub use api::{DataService, FetchError, HttpDataService, Resource, ServiceResponse};
pub use auth::{AuthProvider, Session, SessionData};
pub use cache::{CacheEntry, CacheStore, FileStore, KeyValueStore, MemoryStore};
pub use config::Config;
pub use dashboard::{Dashboard, DashboardState};
pub use fetch::{fetch_with_retry, FetchOutcome, RetryPolicy};
pub use focus::{FocusEvent, FocusState, FocusStatus, FocusTimer};
pub use loader::{Loader, Origin, Snapshot};
pub use models::{AgeGroup, Family, MemberRecord, Task};
pub use poller::PollerHandle;
pub use schedule::ScheduledTask;
