//! Best-effort collection loading with cache fallback.

use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::api::FetchError;
use crate::cache::{age_display, CacheEntry, CacheStore, KeyValueStore};
use crate::fetch::{fetch_with_retry, FetchOutcome, RetryPolicy};

/// Where a snapshot's data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    /// Fetched from the service just now.
    Fresh,
    /// Fetch failed; data is the last value that was fetched successfully.
    Cached,
    /// Fetch failed and nothing was cached.
    Error,
}

/// Immutable point-in-time view of a collection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot<T> {
    pub data: Vec<T>,
    pub origin: Origin,
    pub fetched_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
}

impl<T> Snapshot<T> {
    pub fn fresh(data: Vec<T>) -> Self {
        Self {
            data,
            origin: Origin::Fresh,
            fetched_at: Some(Utc::now()),
            error: None,
        }
    }

    pub fn cached(entry: CacheEntry<Vec<T>>, error: &FetchError) -> Self {
        Self {
            data: entry.value,
            origin: Origin::Cached,
            fetched_at: Some(entry.stored_at),
            error: Some(error.to_string()),
        }
    }

    pub fn failed(error: &FetchError) -> Self {
        Self {
            data: Vec::new(),
            origin: Origin::Error,
            fetched_at: None,
            error: Some(error.to_string()),
        }
    }

    pub fn is_fresh(&self) -> bool {
        self.origin == Origin::Fresh
    }

    pub fn is_cached(&self) -> bool {
        self.origin == Origin::Cached
    }

    pub fn is_error(&self) -> bool {
        self.origin == Origin::Error
    }

    pub fn age_display(&self) -> String {
        self.fetched_at
            .map(age_display)
            .unwrap_or_else(|| "never".to_string())
    }

    /// Banner text for the UI, `None` when the data is fresh.
    pub fn notice(&self) -> Option<String> {
        match self.origin {
            Origin::Fresh => None,
            Origin::Cached => Some(format!("Showing saved data from {}", self.age_display())),
            Origin::Error => Some("Could not load data. Refresh to try again.".to_string()),
        }
    }
}

/// Combines the retrying fetcher with the cache store.
pub struct Loader<S> {
    cache: Arc<CacheStore<S>>,
}

impl<S> Clone for Loader<S> {
    fn clone(&self) -> Self {
        Self {
            cache: Arc::clone(&self.cache),
        }
    }
}

impl<S: KeyValueStore> Loader<S> {
    pub fn new(cache: Arc<CacheStore<S>>) -> Self {
        Self { cache }
    }

    pub fn cache(&self) -> &CacheStore<S> {
        &self.cache
    }

    pub async fn load<T, F, Fut>(&self, key: &str, operation: F, policy: &RetryPolicy) -> Snapshot<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<Vec<T>, FetchError>>,
    {
        self.load_with_cancel(key, operation, policy, &CancellationToken::new())
            .await
    }

    /// Fetch `key`'s collection; on success cache it and return it fresh,
    /// otherwise fall back to the cached value or an error snapshot.
    ///
    /// The cache write completes before the fresh snapshot is returned.
    pub async fn load_with_cancel<T, F, Fut>(
        &self,
        key: &str,
        operation: F,
        policy: &RetryPolicy,
        cancel: &CancellationToken,
    ) -> Snapshot<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<Vec<T>, FetchError>>,
    {
        match fetch_with_retry(operation, policy, cancel).await {
            FetchOutcome::Success { value } => {
                self.cache.write(key, &value);
                debug!(cache = key, items = value.len(), "Loaded fresh collection");
                Snapshot::fresh(value)
            }
            FetchOutcome::Failure { error, attempts, .. } => match self.cache.read::<Vec<T>>(key) {
                Some(entry) => {
                    warn!(
                        cache = key,
                        attempts,
                        error = %error,
                        age = %entry.age_display(),
                        "Fetch failed, showing cached collection"
                    );
                    Snapshot::cached(entry, &error)
                }
                None => {
                    warn!(cache = key, attempts, error = %error, "Fetch failed with nothing cached");
                    Snapshot::failed(&error)
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryStore;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn loader() -> Loader<MemoryStore> {
        Loader::new(Arc::new(CacheStore::new(MemoryStore::new())))
    }

    fn always(value: Vec<String>) -> impl FnMut() -> futures::future::Ready<Result<Vec<String>, FetchError>> {
        move || futures::future::ready(Ok(value.clone()))
    }

    fn failing(error: FetchError) -> impl FnMut() -> futures::future::Ready<Result<Vec<String>, FetchError>> {
        move || futures::future::ready(Err(error.clone()))
    }

    #[tokio::test(start_paused = true)]
    async fn test_load_is_idempotent() {
        let loader = loader();
        let value = vec!["dishes".to_string(), "homework".to_string()];

        let first = loader.load("tasks", always(value.clone()), &RetryPolicy::default()).await;
        let second = loader.load("tasks", always(value.clone()), &RetryPolicy::default()).await;

        assert!(first.is_fresh() && second.is_fresh());
        assert_eq!(first.data, second.data);
        assert_eq!(first.data, value);
        assert!(first.notice().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_writes_cache() {
        let loader = loader();
        loader
            .load("tasks", always(vec!["a".to_string()]), &RetryPolicy::default())
            .await;

        let entry: CacheEntry<Vec<String>> = loader.cache().read("tasks").expect("cached");
        assert_eq!(entry.value, vec!["a"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_falls_back_to_cache() {
        let loader = loader();
        loader.cache().write("families", &vec!["Rivera".to_string()]);
        let stored_at = loader
            .cache()
            .read::<Vec<String>>("families")
            .expect("seeded")
            .stored_at;

        let snapshot = loader
            .load("families", failing(FetchError::Unauthorized), &RetryPolicy::default())
            .await;

        assert_eq!(snapshot.origin, Origin::Cached);
        assert_eq!(snapshot.data, vec!["Rivera"]);
        assert_eq!(snapshot.fetched_at, Some(stored_at));
        assert!(snapshot.notice().unwrap().starts_with("Showing saved data"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_error_when_nothing_cached() {
        let loader = loader();
        let calls = Arc::new(AtomicU32::new(0));
        let op = {
            let calls = calls.clone();
            move || {
                calls.fetch_add(1, Ordering::SeqCst);
                futures::future::ready(Err::<Vec<String>, _>(FetchError::Network("down".into())))
            }
        };

        let snapshot = loader.load("families", op, &RetryPolicy::default()).await;

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(snapshot.is_error());
        assert!(snapshot.data.is_empty());
        assert!(snapshot.fetched_at.is_none());
        assert!(snapshot.error.is_some());
        assert_eq!(snapshot.age_display(), "never");
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_server_collection_is_fresh_not_error() {
        let loader = loader();
        let snapshot = loader.load("tasks", always(Vec::new()), &RetryPolicy::default()).await;
        assert!(snapshot.is_fresh());
        assert!(snapshot.data.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_corrupt_cache_yields_error_snapshot() {
        let loader = loader();
        loader.cache().store().set_item("tasks", "garbage").unwrap();

        let snapshot = loader
            .load("tasks", failing(FetchError::Unauthorized), &RetryPolicy::default())
            .await;

        assert!(snapshot.is_error());
    }

    #[tokio::test(start_paused = true)]
    async fn test_latest_success_is_served_after_failure() {
        let loader = loader();
        loader
            .load("tasks", always(vec!["old".to_string()]), &RetryPolicy::default())
            .await;
        loader
            .load("tasks", always(vec!["new".to_string()]), &RetryPolicy::default())
            .await;

        let snapshot = loader
            .load("tasks", failing(FetchError::Timeout), &RetryPolicy::single_attempt())
            .await;

        assert!(snapshot.is_cached());
        assert_eq!(snapshot.data, vec!["new"]);
    }
}
