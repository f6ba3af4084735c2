//! Error types and the seams between the service and its collaborators.

use async_trait::async_trait;
use reqwest::StatusCode;

use crate::model::{Collection, Dataset, ZoneMeta};

#[derive(thiserror::Error, Debug)]
/// Errors that abort a whole fetch against the remote API.
///
/// Per-item and per-date problems inside a response are recovered locally by
/// the client and never surface here; they only shrink the result set.
pub enum FetchError {
    /// Transport-level failure.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    /// The API answered with a non-200 status.
    #[error("API returned status {0}")]
    Status(StatusCode),
    /// The response body was not the expected envelope.
    #[error("malformed API response: {0}")]
    Envelope(#[from] serde_json::Error),
}

#[async_trait]
/// Backend that retrieves and normalizes collection schedules.
///
/// The HTTP client is the production implementation; tests substitute fakes.
pub trait ScheduleSource: Send + Sync {
    /// Fetch and parse all schedules for a zone.
    ///
    /// # Errors
    ///
    /// Returns a [`FetchError`] when the request or envelope parsing fails.
    async fn fetch_collections(&self, zone: &str) -> Result<Vec<Collection>, FetchError>;

    /// Fetch the list of selectable zones.
    ///
    /// # Errors
    ///
    /// Returns a [`FetchError`] when the request or envelope parsing fails;
    /// there is no cache fallback for zones.
    async fn fetch_zones(&self) -> Result<Vec<ZoneMeta>, FetchError>;
}

/// Collaborator notified when the service produces a freshly fetched snapshot.
///
/// Replaces a host platform's coordinator/entity base classes with a plain
/// observer; cache hits do not fire it since the data has not changed.
pub trait DataListener: Send + Sync {
    /// Called with the new snapshot after a successful fetch.
    fn data_changed(&self, data: &Dataset);
}
