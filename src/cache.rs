//! Lookup cache and request orchestration.
//!
//! [`FileCache`] owns the map from [`FileId`] to cached results and the
//! rate buckets that shield the backing store. Each tracked identifier
//! carries its own private [`RateBucket`]; identifiers the cache has
//! never seen all share a single bucket, blunting enumeration attacks.
//!
//! Two policies define what a caller observes under load:
//!
//! - **Stale-serve-on-throttle**: a known identifier whose bucket is
//!   exhausted is answered with the last successfully fetched result
//!   instead of a rate-limit error, when one exists.
//! - **Seeded trust boundary**: [`FileCache::seed`] pre-creates an entry
//!   for every identifier in the store before traffic is accepted, so an
//!   attacker spamming invented identifiers drains only the shared
//!   unseen bucket and never pushes a legitimate identifier onto it.
//!
//! # Locking
//!
//! The map lock is held only for probe and create-if-absent, never
//! across the store fetch. Two concurrent first-time lookups for the
//! same identifier may therefore both pass the unseen bucket and fetch
//! redundantly; publish is last-write-wins, so the only cost is the
//! duplicate fetch. Entry buckets and entry info have their own locks;
//! contention is per-identifier, never global.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::ratelimit::RateBucket;
use crate::store::{FileRow, FileStore};
use crate::telemetry;
use crate::types::{FileId, FileInfo};
use crate::{MuninnError, Result};

/// Rate parameters for one class of bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BucketParams {
    pub reqs_per_minute: u32,
    pub burst_capacity: u32,
}

impl BucketParams {
    /// Default for identifiers with a cache entry: 2 requests per minute,
    /// burst of 10, applied per identifier.
    pub const KNOWN_DEFAULT: Self = Self {
        reqs_per_minute: 2,
        burst_capacity: 10,
    };

    /// Default for the shared bucket guarding never-seen identifiers:
    /// 4 requests per minute, burst of 20, shared across all of them.
    pub const UNSEEN_DEFAULT: Self = Self {
        reqs_per_minute: 4,
        burst_capacity: 20,
    };

    fn bucket(&self) -> RateBucket {
        RateBucket::new(self.reqs_per_minute, self.burst_capacity)
    }
}

/// One cache slot: the last fetched result (absent until the first
/// successful fetch) and the identifier's private rate bucket. The
/// bucket is created with the entry and never replaced; entries are
/// never destroyed.
struct CacheEntry {
    info: Mutex<Option<Arc<FileInfo>>>,
    bucket: RateBucket,
}

impl CacheEntry {
    fn new(limits: BucketParams) -> Self {
        Self {
            info: Mutex::new(None),
            bucket: limits.bucket(),
        }
    }

    fn cached_info(&self) -> Option<Arc<FileInfo>> {
        self.info
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn publish(&self, info: Arc<FileInfo>) {
        *self.info.lock().unwrap_or_else(PoisonError::into_inner) = Some(info);
    }
}

/// Concurrency-safe, write-through lookup cache over a [`FileStore`].
///
/// Owned service state: construct once, share via `Arc`, inject into the
/// request handler. Entries accumulate for the process lifetime; only
/// identifiers that exist in the store or were fetched successfully ever
/// allocate one, so growth is bounded by the data, not by callers.
pub struct FileCache {
    store: Arc<dyn FileStore>,
    entries: Mutex<HashMap<FileId, Arc<CacheEntry>>>,
    unseen_bucket: RateBucket,
    known_limits: BucketParams,
    fetch_timeout: Duration,
}

impl FileCache {
    pub fn new(
        store: Arc<dyn FileStore>,
        known_limits: BucketParams,
        unseen_limits: BucketParams,
        fetch_timeout: Duration,
    ) -> Self {
        Self {
            store,
            entries: Mutex::new(HashMap::new()),
            unseen_bucket: unseen_limits.bucket(),
            known_limits,
            fetch_timeout,
        }
    }

    /// Pre-create a cache entry for every identifier in the backing
    /// store. Run once before serving traffic; returns the entry count.
    ///
    /// Seeded entries start with no cached info but carry the known-
    /// identifier bucket, so the first real request for them is never
    /// gated by the shared unseen bucket. A scan failure must abort
    /// startup: serving with a partially seeded trust boundary would
    /// let request order decide which identifiers count as known.
    pub async fn seed(&self) -> Result<usize> {
        let ids = self.store.scan_ids().await?;
        let mut entries = self.lock_entries();
        for id in ids {
            entries
                .entry(id)
                .or_insert_with(|| Arc::new(CacheEntry::new(self.known_limits)));
        }
        let count = entries.len();
        metrics::gauge!(telemetry::CACHE_ENTRIES).set(count as f64);
        Ok(count)
    }

    /// Number of identifiers currently tracked.
    pub fn entry_count(&self) -> usize {
        self.lock_entries().len()
    }

    /// Answer one lookup, applying rate limits and the cache policy.
    ///
    /// Known identifiers are gated by their private bucket and fall back
    /// to the last fetched result when throttled; unknown identifiers
    /// are gated by the shared unseen bucket and never fall back. On an
    /// admitted fetch, success creates or updates the entry; `NotFound`
    /// and errors leave the cache untouched.
    pub async fn lookup(&self, id: &FileId) -> Result<Arc<FileInfo>> {
        let entry = self.lock_entries().get(id).cloned();

        match &entry {
            Some(entry) => {
                if !entry.bucket.try_take() {
                    if let Some(info) = entry.cached_info() {
                        // Throttled but previously fetched: serve stale.
                        metrics::counter!(telemetry::STALE_SERVES_TOTAL).increment(1);
                        debug!(%id, "bucket exhausted, serving cached info");
                        count_lookup("stale");
                        return Ok(info);
                    }
                    metrics::counter!(
                        telemetry::RATELIMIT_REJECTIONS_TOTAL, "bucket" => "known"
                    )
                    .increment(1);
                    return Err(count_lookup_err(MuninnError::RateLimited));
                }
            }
            None => {
                if !self.unseen_bucket.try_take() {
                    // No entry is created for a denied unseen lookup.
                    metrics::counter!(
                        telemetry::RATELIMIT_REJECTIONS_TOTAL, "bucket" => "unseen"
                    )
                    .increment(1);
                    return Err(count_lookup_err(MuninnError::RateLimited));
                }
            }
        }

        // Fetch without holding the map lock; see module docs for the
        // race window this accepts.
        let row = match self.fetch_row(id).await {
            Ok(Some(row)) => row,
            Ok(None) => return Err(count_lookup_err(MuninnError::NotFound)),
            Err(e) => {
                warn!(%id, error = %e, "store fetch failed");
                return Err(count_lookup_err(e));
            }
        };

        let info = match FileInfo::resolve(id.clone(), &row.object_key, &row.pattern) {
            Ok(info) => Arc::new(info),
            Err(e) => {
                warn!(%id, error = %e, "stored row is unusable");
                return Err(count_lookup_err(e));
            }
        };

        // Re-acquire only to publish. Check-and-create is one atomic
        // step under the map lock, so racing first-time lookups share a
        // single entry (and a single bucket).
        let entry = match entry {
            Some(entry) => entry,
            None => {
                let mut entries = self.lock_entries();
                let entry = entries
                    .entry(id.clone())
                    .or_insert_with(|| Arc::new(CacheEntry::new(self.known_limits)))
                    .clone();
                metrics::gauge!(telemetry::CACHE_ENTRIES).set(entries.len() as f64);
                entry
            }
        };
        entry.publish(info.clone());
        debug!(%id, build_num = %info.build_num, "published fetched info");
        count_lookup("ok");
        Ok(info)
    }

    async fn fetch_row(&self, id: &FileId) -> Result<Option<FileRow>> {
        let start = Instant::now();
        let result = tokio::time::timeout(self.fetch_timeout, self.store.fetch(id)).await;
        metrics::histogram!(telemetry::STORE_FETCH_DURATION_SECONDS)
            .record(start.elapsed().as_secs_f64());
        result.unwrap_or(Err(MuninnError::Timeout(self.fetch_timeout)))
    }

    fn lock_entries(&self) -> MutexGuard<'_, HashMap<FileId, Arc<CacheEntry>>> {
        // Nothing panics while holding the map lock; recover from poison
        // rather than propagating a panic into every request.
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn count_lookup(outcome: &'static str) {
    metrics::counter!(telemetry::LOOKUPS_TOTAL, "outcome" => outcome).increment(1);
}

fn count_lookup_err(err: MuninnError) -> MuninnError {
    let outcome = match &err {
        MuninnError::RateLimited => "rate_limited",
        MuninnError::NotFound => "not_found",
        _ => "error",
    };
    count_lookup(outcome);
    err
}
