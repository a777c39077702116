use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, warn};

use super::storage::{KeyValueStore, StorageError};

/// Consider cache stale after 1 hour.
/// Balances freshness with reducing unnecessary API calls for slowly-changing data.
const CACHE_STALE_MINUTES: i64 = 60;

/// Last-known-good value of a collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    pub key: String,
    pub value: T,
    pub stored_at: DateTime<Utc>,
}

impl<T> CacheEntry<T> {
    pub fn new(key: impl Into<String>, value: T) -> Self {
        Self {
            key: key.into(),
            value,
            stored_at: Utc::now(),
        }
    }

    pub fn age_minutes(&self) -> i64 {
        (Utc::now() - self.stored_at).num_minutes()
    }

    pub fn age_display(&self) -> String {
        age_display(self.stored_at)
    }

    pub fn is_stale(&self) -> bool {
        self.age_minutes() > CACHE_STALE_MINUTES
    }
}

/// Human-friendly age of a timestamp ("just now", "5m ago", "2h ago", "3d ago").
pub fn age_display(at: DateTime<Utc>) -> String {
    let minutes = (Utc::now() - at).num_minutes();
    if minutes < 1 {
        // Covers clock skew too
        "just now".to_string()
    } else if minutes < 60 {
        format!("{}m ago", minutes)
    } else if minutes < 1440 {
        let hours = minutes / 60;
        if minutes % 60 >= 30 {
            format!("{}h ago", hours + 1)
        } else {
            format!("{}h ago", hours)
        }
    } else {
        let days = minutes / 1440;
        if (minutes % 1440) / 60 >= 12 {
            format!("{}d ago", days + 1)
        } else {
            format!("{}d ago", days)
        }
    }
}

/// Advisory cache over a [`KeyValueStore`].
///
/// None of the operations fail: storage and serialization errors are logged
/// and degrade to a no-op or a miss. Writes replace the whole value, so two
/// loads racing on one key resolve as last-write-wins.
pub struct CacheStore<S> {
    store: S,
}

impl<S: KeyValueStore> CacheStore<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// The underlying persistence surface.
    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn read<T: DeserializeOwned>(&self, key: &str) -> Option<CacheEntry<T>> {
        match self.try_read(key) {
            Ok(entry) => entry,
            Err(e) => {
                debug!(cache = key, error = %e, "Treating unreadable cache entry as empty");
                None
            }
        }
    }

    pub fn write<T: Serialize>(&self, key: &str, value: &T) {
        if let Err(e) = self.try_write(key, value) {
            warn!(cache = key, error = %e, "Failed to write cache entry");
        }
    }

    pub fn clear(&self, key: &str) {
        if let Err(e) = self.store.remove_item(key) {
            warn!(cache = key, error = %e, "Failed to clear cache entry");
        }
    }

    /// Keys currently held by the store.
    pub fn keys(&self) -> Vec<String> {
        self.store.keys().unwrap_or_else(|e| {
            debug!(error = %e, "Failed to enumerate cache keys");
            Vec::new()
        })
    }

    fn try_read<T: DeserializeOwned>(&self, key: &str) -> Result<Option<CacheEntry<T>>, StorageError> {
        let Some(raw) = self.store.get_item(key)? else {
            return Ok(None);
        };
        let entry: CacheEntry<T> = serde_json::from_str(&raw)?;
        Ok(Some(entry))
    }

    fn try_write<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        let entry = CacheEntry::new(key, value);
        let contents = serde_json::to_string(&entry)?;
        self.store.set_item(key, &contents)
    }
}
