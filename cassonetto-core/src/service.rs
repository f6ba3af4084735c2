//! Cache-or-fetch orchestration with stale-cache degradation.

use std::sync::Arc;

use chrono::Local;
use tracing::{debug, info, warn};

use crate::cache::CacheStore;
use crate::model::{Dataset, ZoneMeta};
use crate::ports::{DataListener, FetchError, ScheduleSource};

/// Default cache TTL in hours.
pub const DEFAULT_CACHE_HOURS: u32 = 24;

/// Entry point for obtaining collection schedules for one zone.
///
/// Decides between the cache and a fresh fetch, and degrades to stale cached
/// data when the fetch fails. One service instance serves one zone; callers
/// are expected not to overlap refreshes for the same zone, since two
/// concurrent calls would race on the cache file (last writer wins).
pub struct DataService {
    source: Arc<dyn ScheduleSource>,
    cache: CacheStore,
    zone: String,
    cache_hours: u32,
    listeners: Vec<Arc<dyn DataListener>>,
}

impl DataService {
    /// Create a service for `zone` with the given TTL in hours.
    #[must_use]
    pub fn new<Z: Into<String>>(
        source: Arc<dyn ScheduleSource>,
        cache: CacheStore,
        zone: Z,
        cache_hours: u32,
    ) -> Self {
        Self {
            source,
            cache,
            zone: zone.into(),
            cache_hours,
            listeners: Vec::new(),
        }
    }

    /// Register a listener for freshly fetched snapshots.
    pub fn subscribe(&mut self, listener: Arc<dyn DataListener>) {
        self.listeners.push(listener);
    }

    /// Zone this service is bound to.
    #[must_use]
    pub fn zone(&self) -> &str {
        &self.zone
    }

    /// Return the current snapshot, preferring a fresh cache hit.
    ///
    /// With `force_refresh` the cache check is skipped. After a failed fetch
    /// the expired cache is served as a fallback when available.
    ///
    /// # Errors
    ///
    /// Returns the fetch's [`FetchError`] only when no cached snapshot exists
    /// at all.
    pub async fn get_data(&self, force_refresh: bool) -> Result<Dataset, FetchError> {
        if !force_refresh
            && let Some(cached) = self.cache.load(self.cache_hours, false)
        {
            debug!(zone = %self.zone, "using cached data");
            return Ok(cached);
        }

        info!(zone = %self.zone, "fetching data from Mantova Ambiente API");
        match self.source.fetch_collections(&self.zone).await {
            Ok(collections) => {
                info!(
                    zone = %self.zone,
                    count = collections.len(),
                    "successfully fetched collections"
                );
                let data = Dataset::new(collections, Local::now().naive_local());
                self.cache.save(&data);
                for listener in &self.listeners {
                    listener.data_changed(&data);
                }
                Ok(data)
            }
            Err(err) => {
                warn!(zone = %self.zone, %err, "error getting data");
                if let Some(stale) = self.cache.load(self.cache_hours, true) {
                    warn!(zone = %self.zone, "using expired cached data as fallback");
                    Ok(stale)
                } else {
                    Err(err)
                }
            }
        }
    }

    /// List the zones a user can pick from during setup.
    ///
    /// # Errors
    ///
    /// Propagates any [`FetchError`] from the source; zones are never cached.
    pub async fn zones(&self) -> Result<Vec<ZoneMeta>, FetchError> {
        self.source.fetch_zones().await
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::thread;
    use std::time::Duration;

    use async_trait::async_trait;
    use chrono::NaiveDate;
    use reqwest::StatusCode;

    use super::DataService;
    use crate::cache::CacheStore;
    use crate::model::{Collection, Dataset, ZoneMeta};
    use crate::ports::{DataListener, FetchError, ScheduleSource};

    /// Source fed from a queue of canned responses, counting calls.
    struct FakeSource {
        responses: Mutex<VecDeque<Result<Vec<Collection>, FetchError>>>,
        calls: AtomicUsize,
    }

    impl FakeSource {
        fn new(responses: Vec<Result<Vec<Collection>, FetchError>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ScheduleSource for FakeSource {
        async fn fetch_collections(&self, _zone: &str) -> Result<Vec<Collection>, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.responses
                .lock()
                .expect("responses lock")
                .pop_front()
                .unwrap_or_else(|| Err(FetchError::Status(StatusCode::SERVICE_UNAVAILABLE)))
        }

        async fn fetch_zones(&self) -> Result<Vec<ZoneMeta>, FetchError> {
            Ok(vec![ZoneMeta {
                id: String::from("3631"),
                title: String::from("Mantova Centro"),
            }])
        }
    }

    struct CountingListener {
        notified: AtomicUsize,
    }

    impl DataListener for CountingListener {
        fn data_changed(&self, _data: &Dataset) {
            self.notified.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn collections(count: usize) -> Vec<Collection> {
        (0..count)
            .map(|index| {
                let instant = NaiveDate::from_ymd_opt(2025, 10, 1)
                    .expect("valid date")
                    .and_hms_opt(6, 0, 0)
                    .expect("valid time");
                Collection::new(format!("id-{index}"), format!("Stream {index}"), vec![instant])
            })
            .collect()
    }

    fn store(dir: &tempfile::TempDir) -> CacheStore {
        CacheStore::new(dir.path(), "3631").expect("create store")
    }

    #[tokio::test]
    async fn fetch_persists_and_subsequent_call_hits_cache() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let source = Arc::new(FakeSource::new(vec![Ok(collections(3))]));
        let service = DataService::new(Arc::clone(&source) as _, store(&dir), "3631", 24);

        let first = service.get_data(false).await.expect("fetch succeeds");
        assert_eq!(first.collections().len(), 3);
        assert!(
            dir.path().join("collections_3631.json").exists(),
            "fetched data must be persisted"
        );

        let second = service.get_data(false).await.expect("cache hit");
        assert_eq!(second, first, "cache returns the persisted snapshot");
        assert_eq!(source.calls(), 1, "second call must not reach the network");
    }

    #[tokio::test]
    async fn force_refresh_skips_a_fresh_cache() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let source = Arc::new(FakeSource::new(vec![Ok(collections(1)), Ok(collections(2))]));
        let service = DataService::new(Arc::clone(&source) as _, store(&dir), "3631", 24);

        service.get_data(false).await.expect("initial fetch");
        let refreshed = service.get_data(true).await.expect("forced fetch");

        assert_eq!(refreshed.collections().len(), 2);
        assert_eq!(source.calls(), 2, "force_refresh must bypass the cache");
    }

    #[tokio::test]
    async fn expired_cache_is_served_when_the_fetch_fails() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let cache = store(&dir);
        let stale = Dataset::new(
            collections(2),
            NaiveDate::from_ymd_opt(2025, 9, 1)
                .expect("valid date")
                .and_hms_opt(8, 0, 0)
                .expect("valid time"),
        );
        cache.save(&stale);

        // Zero-hour TTL: the snapshot counts as expired for normal reads.
        thread::sleep(Duration::from_millis(50));
        let source = Arc::new(FakeSource::new(vec![Err(FetchError::Status(
            StatusCode::BAD_GATEWAY,
        ))]));
        let service = DataService::new(Arc::clone(&source) as _, cache, "3631", 0);

        let degraded = service.get_data(false).await.expect("stale fallback");
        assert_eq!(degraded, stale, "expired cache contents are returned as-is");
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn failure_without_cache_propagates() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let source = Arc::new(FakeSource::new(vec![Err(FetchError::Status(
            StatusCode::NOT_FOUND,
        ))]));
        let service = DataService::new(Arc::clone(&source) as _, store(&dir), "3631", 24);

        let result = service.get_data(false).await;
        assert!(
            matches!(result, Err(FetchError::Status(StatusCode::NOT_FOUND))),
            "with no cache the original failure surfaces"
        );
    }

    #[tokio::test]
    async fn listeners_fire_on_fetch_but_not_on_cache_hits() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let source = Arc::new(FakeSource::new(vec![Ok(collections(1))]));
        let mut service = DataService::new(Arc::clone(&source) as _, store(&dir), "3631", 24);

        let listener = Arc::new(CountingListener {
            notified: AtomicUsize::new(0),
        });
        service.subscribe(Arc::clone(&listener) as _);

        service.get_data(false).await.expect("fetch succeeds");
        assert_eq!(listener.notified.load(Ordering::SeqCst), 1);

        service.get_data(false).await.expect("cache hit");
        assert_eq!(
            listener.notified.load(Ordering::SeqCst),
            1,
            "cache hits do not re-notify"
        );
    }

    #[tokio::test]
    async fn zones_delegate_to_the_source() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let source = Arc::new(FakeSource::new(Vec::new()));
        let service = DataService::new(Arc::clone(&source) as _, store(&dir), "3631", 24);

        let zones = service.zones().await.expect("zones listed");
        assert_eq!(zones.len(), 1);
        assert_eq!(
            zones.first().map(|zone| zone.id.as_str()),
            Some("3631")
        );
    }
}
