//! Remote data service access.
//!
//! `DataService` is the seam the loader reads collections through. The
//! production implementation is `HttpDataService`, a bearer-token REST client;
//! tests substitute scripted fakes.

pub mod client;
pub mod error;

use std::future::Future;
use std::sync::Arc;

use serde::{de::DeserializeOwned, Deserialize, Serialize};

pub use client::HttpDataService;
pub use error::FetchError;

/// A server-owned collection the dashboard keeps in view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Families,
    Tasks,
}

impl Resource {
    pub const ALL: [Resource; 2] = [Resource::Families, Resource::Tasks];

    /// REST path segment under the service base URL.
    pub fn path(&self) -> &'static str {
        match self {
            Resource::Families => "families",
            Resource::Tasks => "tasks",
        }
    }

    /// Fixed cache key the collection's last good value is stored under.
    pub fn cache_key(&self) -> &'static str {
        match self {
            Resource::Families => "familyhub.families",
            Resource::Tasks => "familyhub.tasks",
        }
    }
}

impl std::fmt::Display for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.path())
    }
}

/// Body shape returned by the data service: either `data` or `error`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: DeserializeOwned"))]
pub struct ServiceResponse<T> {
    #[serde(default)]
    pub data: Option<Vec<T>>,
    #[serde(default)]
    pub error: Option<String>,
}

impl<T> ServiceResponse<T> {
    /// A response with `error` set is a failure just like a transport error.
    /// A response with neither field is an empty collection.
    pub fn into_result(self) -> Result<Vec<T>, FetchError> {
        match self.error {
            Some(message) => Err(FetchError::from_service_message(&message)),
            None => Ok(self.data.unwrap_or_default()),
        }
    }
}

/// Read access to the server-owned collections.
pub trait DataService: Send + Sync {
    fn get_all<T>(
        &self,
        resource: Resource,
    ) -> impl Future<Output = Result<ServiceResponse<T>, FetchError>> + Send
    where
        T: DeserializeOwned + Send + 'static;
}

impl<D: DataService> DataService for Arc<D> {
    fn get_all<T>(
        &self,
        resource: Resource,
    ) -> impl Future<Output = Result<ServiceResponse<T>, FetchError>> + Send
    where
        T: DeserializeOwned + Send + 'static,
    {
        (**self).get_all(resource)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_keys_are_distinct() {
        assert_ne!(Resource::Families.cache_key(), Resource::Tasks.cache_key());
        assert_eq!(Resource::Tasks.path(), "tasks");
    }

    #[test]
    fn test_service_response_into_result() {
        let ok: ServiceResponse<u32> = serde_json::from_str(r#"{"data":[1,2]}"#).unwrap();
        assert_eq!(ok.into_result().unwrap(), vec![1, 2]);

        let empty: ServiceResponse<u32> = serde_json::from_str("{}").unwrap();
        assert!(empty.into_result().unwrap().is_empty());

        let transient: ServiceResponse<u32> =
            serde_json::from_str(r#"{"error":"network timeout"}"#).unwrap();
        assert!(transient.into_result().unwrap_err().is_retriable());

        let denied: ServiceResponse<u32> =
            serde_json::from_str(r#"{"data":[1],"error":"not a member of this family"}"#).unwrap();
        assert!(!denied.into_result().unwrap_err().is_retriable());
    }
}
