//! Telemetry metric name constants.
//!
//! Centralised metric names for muninn operations. Consumers install
//! their own `metrics` recorder (e.g. prometheus, statsd); without a
//! recorder installed, all metric calls are no-ops.
//!
//! All metrics are prefixed with `muninn_`. Counters end in `_total`,
//! histograms use meaningful units.

/// Total lookups, by final outcome.
///
/// Labels: `outcome` ("ok" | "stale" | "rate_limited" | "not_found" | "error").
pub const LOOKUPS_TOTAL: &str = "muninn_lookups_total";

/// Total lookups answered from cache because the identifier's bucket was
/// exhausted (stale-serve-on-throttle). A subset of `outcome="stale"`
/// lookups, counted separately for alerting on sustained throttling.
pub const STALE_SERVES_TOTAL: &str = "muninn_stale_serves_total";

/// Total lookups rejected outright by a rate bucket.
///
/// Labels: `bucket` ("known" | "unseen").
pub const RATELIMIT_REJECTIONS_TOTAL: &str = "muninn_ratelimit_rejections_total";

/// Backing-store point-lookup duration in seconds, timeouts included.
pub const STORE_FETCH_DURATION_SECONDS: &str = "muninn_store_fetch_duration_seconds";

/// Number of identifiers currently tracked in the lookup cache.
/// Entries are never evicted, so this only grows.
pub const CACHE_ENTRIES: &str = "muninn_cache_entries";
