//! Local caching module for offline data access.
//!
//! This module provides the `CacheStore` for keeping the last successfully
//! fetched value of each collection. Entries are JSON-encoded `CacheEntry`
//! records on top of a `KeyValueStore`:
//!
//! - `MemoryStore`: process-local, for tests and headless use
//! - `FileStore`: one file per key in the cache directory

pub mod manager;
pub mod storage;

pub use manager::{age_display, CacheEntry, CacheStore};
pub use storage::{FileStore, KeyValueStore, MemoryStore, StorageError};
