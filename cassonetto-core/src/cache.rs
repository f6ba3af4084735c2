//! File-backed TTL cache for collection snapshots.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::model::{Collection, Dataset};

const SECONDS_PER_HOUR: f64 = 3600.0;

/// Problems reading or writing the cache file.
///
/// These never escape this module: reads degrade to a miss and writes are
/// best-effort, both with a log line.
#[derive(thiserror::Error, Debug)]
enum CacheError {
    #[error("cache I/O failed: {0}")]
    Io(#[from] io::Error),
    #[error("cache file is not valid JSON: {0}")]
    Format(#[from] serde_json::Error),
}

/// On-disk schema. Field names are the persisted contract and must not change.
#[derive(Debug, Serialize, Deserialize)]
struct CacheDocument {
    last_update: NaiveDateTime,
    collections: Vec<CachedCollection>,
}

#[derive(Debug, Serialize, Deserialize)]
struct CachedCollection {
    id: String,
    title: String,
    collections: Vec<NaiveDateTime>,
}

impl CacheDocument {
    fn from_dataset(data: &Dataset) -> Self {
        Self {
            last_update: data.fetched_at(),
            collections: data
                .collections()
                .iter()
                .map(|collection| CachedCollection {
                    id: collection.id().to_owned(),
                    title: collection.title().to_owned(),
                    collections: collection.instants().to_vec(),
                })
                .collect(),
        }
    }

    fn into_dataset(self) -> Dataset {
        let collections = self
            .collections
            .into_iter()
            .map(|cached| Collection::new(cached.id, cached.title, cached.collections))
            .collect();
        Dataset::new(collections, self.last_update)
    }
}

/// Durable per-zone snapshot of the last successfully fetched [`Dataset`].
///
/// Freshness is tracked through the cache file's modification time; there is
/// no separate metadata. Concurrent writers for the same zone race with
/// last-writer-wins semantics.
pub struct CacheStore {
    file: PathBuf,
    zone: String,
}

impl CacheStore {
    /// Bind a store to `<storage_dir>/collections_<zone>.json`, creating the
    /// storage directory if needed.
    ///
    /// # Errors
    ///
    /// Returns an [`io::Error`] when the storage directory cannot be created.
    pub fn new<P: AsRef<Path>>(storage_dir: P, zone: &str) -> io::Result<Self> {
        let storage_dir = storage_dir.as_ref();
        fs::create_dir_all(storage_dir)?;
        Ok(Self {
            file: storage_dir.join(format!("collections_{zone}.json")),
            zone: zone.to_owned(),
        })
    }

    /// Path of the cache file backing this store.
    #[must_use]
    pub fn file(&self) -> &Path {
        &self.file
    }

    /// Load the cached snapshot, or `None` on a miss.
    ///
    /// A miss is an absent file, an expired file (unless `ignore_expiry`), or
    /// a file that fails to read or parse. A corrupt cache is logged and
    /// treated like a miss; it never fails the caller.
    #[must_use]
    pub fn load(&self, max_age_hours: u32, ignore_expiry: bool) -> Option<Dataset> {
        if !self.file.exists() {
            return None;
        }

        if !ignore_expiry {
            match file_age_hours(&self.file) {
                Ok(age_hours) if age_hours > f64::from(max_age_hours) => {
                    debug!(
                        zone = %self.zone,
                        age_hours,
                        max_age_hours,
                        "cache expired"
                    );
                    return None;
                }
                Ok(_) => {}
                Err(err) => {
                    warn!(zone = %self.zone, %err, "could not stat cache file");
                    return None;
                }
            }
        }

        match self.read() {
            Ok(data) => Some(data),
            Err(err) => {
                warn!(zone = %self.zone, %err, "could not load cached data");
                None
            }
        }
    }

    /// Persist the snapshot, overwriting any previous cache file.
    ///
    /// Best-effort: failures are logged and swallowed so that freshly fetched
    /// data still reaches the caller.
    pub fn save(&self, data: &Dataset) {
        match self.write(data) {
            Ok(()) => debug!(zone = %self.zone, "data cached"),
            Err(err) => warn!(zone = %self.zone, %err, "could not cache data"),
        }
    }

    fn read(&self) -> Result<Dataset, CacheError> {
        let body = fs::read_to_string(&self.file)?;
        let document: CacheDocument = serde_json::from_str(&body)?;
        Ok(document.into_dataset())
    }

    fn write(&self, data: &Dataset) -> Result<(), CacheError> {
        let body = serde_json::to_string_pretty(&CacheDocument::from_dataset(data))?;
        fs::write(&self.file, body)?;
        Ok(())
    }
}

fn file_age_hours(path: &Path) -> io::Result<f64> {
    let modified = fs::metadata(path)?.modified()?;
    // A modification time in the future counts as age zero.
    let age = SystemTime::now()
        .duration_since(modified)
        .unwrap_or_default();
    Ok(age.as_secs_f64() / SECONDS_PER_HOUR)
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::thread;
    use std::time::Duration;

    use chrono::{NaiveDate, NaiveDateTime};

    use super::CacheStore;
    use crate::model::{Collection, Dataset};

    fn instant(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 10, day)
            .expect("valid date")
            .and_hms_opt(hour, 0, 0)
            .expect("valid time")
    }

    fn sample_dataset() -> Dataset {
        Dataset::new(
            vec![
                Collection::new("3707", "Plastica", vec![instant(1, 6), instant(8, 6)]),
                Collection::new("3710", "Vetro", vec![instant(2, 6)]),
            ],
            instant(1, 12),
        )
    }

    #[test]
    fn round_trip_reproduces_the_dataset() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let store = CacheStore::new(dir.path(), "3631").expect("create store");

        let data = sample_dataset();
        store.save(&data);

        let loaded = store.load(24, false).expect("fresh cache hit");
        assert_eq!(loaded, data, "timestamps and schedules must round-trip");
    }

    #[test]
    fn file_name_includes_the_zone() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let store = CacheStore::new(dir.path(), "3631").expect("create store");

        assert_eq!(
            store.file().file_name().and_then(|name| name.to_str()),
            Some("collections_3631.json")
        );
    }

    #[test]
    fn missing_file_is_a_miss() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let store = CacheStore::new(dir.path(), "3631").expect("create store");

        assert!(store.load(24, false).is_none());
        assert!(store.load(24, true).is_none(), "ignore_expiry needs a file");
    }

    #[test]
    fn corrupt_file_is_a_miss_not_a_panic() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let store = CacheStore::new(dir.path(), "3631").expect("create store");

        fs::write(store.file(), "{ not json").expect("write corrupt cache");
        assert!(store.load(24, false).is_none());

        fs::write(store.file(), r#"{"unexpected": true}"#).expect("write wrong shape");
        assert!(store.load(24, true).is_none());
    }

    #[test]
    fn expired_file_is_a_miss_unless_expiry_is_ignored() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let store = CacheStore::new(dir.path(), "3631").expect("create store");

        let data = sample_dataset();
        store.save(&data);

        // With a zero-hour TTL any measurable age is past the bound.
        thread::sleep(Duration::from_millis(50));
        assert!(store.load(0, false).is_none(), "zero TTL expires immediately");

        let stale = store.load(0, true).expect("stale data is still loadable");
        assert_eq!(stale, data);

        let fresh = store.load(24, false).expect("same file within bound");
        assert_eq!(fresh, data);
    }

    #[test]
    fn persisted_schema_uses_the_agreed_keys() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let store = CacheStore::new(dir.path(), "3631").expect("create store");
        store.save(&sample_dataset());

        let body = fs::read_to_string(store.file()).expect("read cache file");
        let value: serde_json::Value = serde_json::from_str(&body).expect("valid JSON");

        assert_eq!(
            value.get("last_update").and_then(serde_json::Value::as_str),
            Some("2025-10-01T12:00:00")
        );
        let first = value
            .get("collections")
            .and_then(|collections| collections.get(0))
            .expect("first entry present");
        assert_eq!(first.get("id").and_then(serde_json::Value::as_str), Some("3707"));
        assert_eq!(
            first
                .get("collections")
                .and_then(|dates| dates.get(0))
                .and_then(serde_json::Value::as_str),
            Some("2025-10-01T06:00:00")
        );
    }
}
