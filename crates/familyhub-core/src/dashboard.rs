//! Dashboard state owner.
//!
//! `Dashboard` owns the latest snapshot of every collection plus the poller
//! that refreshes them. `init` starts polling, `teardown` stops it and
//! cancels any retry still waiting. Snapshots are published through a
//! `watch` channel so a UI can redraw on change.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::advisory::{self, Recommendation};
use crate::api::{DataService, Resource};
use crate::auth::AuthProvider;
use crate::cache::{CacheStore, KeyValueStore};
use crate::fetch::RetryPolicy;
use crate::loader::{Loader, Snapshot};
use crate::models::{Family, Task};
use crate::poller::{self, PollerError, PollerHandle};

/// Latest view of every collection. `None` until the first load finishes.
#[derive(Debug, Clone, Default)]
pub struct DashboardState {
    pub families: Option<Snapshot<Family>>,
    pub tasks: Option<Snapshot<Task>>,
    /// Completed refreshes since the dashboard was created.
    pub refreshes: u64,
}

struct Shared<D, S> {
    service: D,
    loader: Loader<S>,
    policy: RetryPolicy,
    state: watch::Sender<DashboardState>,
    refreshing: AtomicBool,
}

/// Clears the in-flight flag even if a refresh task is aborted mid-way.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl<D, S> Shared<D, S>
where
    D: DataService,
    S: KeyValueStore,
{
    async fn load<T>(&self, resource: Resource, cancel: &CancellationToken) -> Snapshot<T>
    where
        T: Serialize + DeserializeOwned + Send + 'static,
    {
        let service = &self.service;
        let operation = || async move { service.get_all::<T>(resource).await?.into_result() };
        self.loader
            .load_with_cancel(resource.cache_key(), operation, &self.policy, cancel)
            .await
    }

    async fn refresh(&self, cancel: &CancellationToken) {
        let (families, tasks) = futures::join!(
            self.load::<Family>(Resource::Families, cancel),
            self.load::<Task>(Resource::Tasks, cancel),
        );
        if cancel.is_cancelled() {
            debug!("Dashboard torn down mid-refresh, discarding results");
            return;
        }
        self.state.send_modify(|state| {
            state.families = Some(families);
            state.tasks = Some(tasks);
            state.refreshes += 1;
        });
    }
}

pub struct Dashboard<D, S> {
    shared: Arc<Shared<D, S>>,
    interval: Duration,
    duration: Duration,
    poller: Option<PollerHandle>,
    cancel: CancellationToken,
}

impl<D, S> Dashboard<D, S>
where
    D: DataService + 'static,
    S: KeyValueStore + 'static,
{
    pub fn new(
        service: D,
        cache: Arc<CacheStore<S>>,
        policy: RetryPolicy,
        interval: Duration,
        duration: Duration,
    ) -> Self {
        let (state, _) = watch::channel(DashboardState::default());
        Self {
            shared: Arc::new(Shared {
                service,
                loader: Loader::new(cache),
                policy,
                state,
                refreshing: AtomicBool::new(false),
            }),
            interval,
            duration,
            poller: None,
            cancel: CancellationToken::new(),
        }
    }

    /// Start polling. Restarts the poll window if already running.
    pub fn init(&mut self) -> Result<(), PollerError> {
        self.teardown();
        self.cancel = CancellationToken::new();

        let shared = Arc::clone(&self.shared);
        let cancel = self.cancel.clone();
        let tick = move || {
            if shared.refreshing.swap(true, Ordering::SeqCst) {
                debug!("Previous refresh still in flight, skipping tick");
                return;
            }
            let shared = Arc::clone(&shared);
            let cancel = cancel.clone();
            tokio::spawn(async move {
                let _in_flight = InFlight(&shared.refreshing);
                shared.refresh(&cancel).await;
            });
        };

        self.poller = Some(poller::start(self.interval, self.duration, tick)?);
        info!(
            interval_secs = self.interval.as_secs(),
            duration_secs = self.duration.as_secs(),
            "Dashboard polling started"
        );
        Ok(())
    }

    /// Stop polling and cancel pending retries. Idempotent.
    pub fn teardown(&mut self) {
        if let Some(mut poller) = self.poller.take() {
            poller.stop();
            info!("Dashboard polling stopped");
        }
        self.cancel.cancel();
    }

    pub fn is_polling(&self) -> bool {
        self.poller.as_ref().is_some_and(|p| !p.is_finished())
    }

    /// Wait for the poll window to run out.
    pub async fn finished(&mut self) {
        if let Some(poller) = self.poller.as_mut() {
            poller.finished().await;
        }
    }

    /// Refresh every collection now, e.g. from a manual refresh button.
    pub async fn refresh(&self) {
        self.shared.refresh(&CancellationToken::new()).await;
    }

    /// Drop the cached copy of a collection after a destructive remote
    /// operation made it wrong.
    pub fn invalidate(&self, resource: Resource) {
        self.shared.loader.cache().clear(resource.cache_key());
    }

    pub fn clear_cache(&self) {
        for resource in Resource::ALL {
            self.invalidate(resource);
        }
    }

    pub fn state(&self) -> DashboardState {
        self.shared.state.borrow().clone()
    }

    pub fn families(&self) -> Option<Snapshot<Family>> {
        self.shared.state.borrow().families.clone()
    }

    pub fn tasks(&self) -> Option<Snapshot<Task>> {
        self.shared.state.borrow().tasks.clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<DashboardState> {
        self.shared.state.subscribe()
    }

    /// Membership advice for the signed-in user in `family_id`, if that
    /// family is in the current snapshot.
    pub fn advise(&self, family_id: &str, auth: &impl AuthProvider) -> Option<Recommendation> {
        let state = self.shared.state.borrow();
        let family = state
            .families
            .as_ref()?
            .data
            .iter()
            .find(|f| f.id == family_id)?;
        Some(advisory::advise(&family.members, auth))
    }
}

impl<D, S> Drop for Dashboard<D, S> {
    fn drop(&mut self) {
        if let Some(mut poller) = self.poller.take() {
            poller.stop();
        }
        self.cancel.cancel();
    }
}
