//! Muninn — latest-build lookup service.
//!
//! Answers "what is the newest build for (bucket, channel)?" from a
//! backing key-value store while shielding that store from abusive or
//! repetitive traffic. Two pieces do the real work:
//!
//! - [`RateBucket`]: a token-bucket limiter, one per tracked identifier
//!   plus one shared bucket for never-seen identifiers. Refill is
//!   computed lazily at take time; there are no background timers.
//! - [`FileCache`]: a write-through cache keyed by [`FileId`], pre-seeded
//!   from the store at startup, which serves the last good result
//!   instead of failing when a known identifier is throttled.
//!
//! The `munind` binary wraps the cache in an HTTP endpoint backed by
//! DynamoDB; the library is usable with any [`FileStore`] implementation.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use muninn::cache::{BucketParams, FileCache};
//! use muninn::store::{FileRow, MemoryStore};
//! use muninn::types::FileId;
//!
//! #[tokio::main]
//! async fn main() -> muninn::Result<()> {
//!     let store = MemoryStore::new();
//!     store.insert(
//!         FileId::new("downloads.example.com", "stable"),
//!         FileRow {
//!             object_key: "builds/42/app.zip".into(),
//!             pattern: r"builds/(\d+)/".into(),
//!         },
//!     );
//!
//!     let cache = FileCache::new(
//!         Arc::new(store),
//!         BucketParams::KNOWN_DEFAULT,
//!         BucketParams::UNSEEN_DEFAULT,
//!         Duration::from_secs(10),
//!     );
//!     cache.seed().await?;
//!
//!     let info = cache
//!         .lookup(&FileId::new("downloads.example.com", "stable"))
//!         .await?;
//!     assert_eq!(info.build_num, "42");
//!     assert_eq!(info.url, "https://downloads.example.com/builds/42/app.zip");
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod error;
pub mod ratelimit;
pub mod server;
pub mod store;
pub mod telemetry;
pub mod types;

// Re-export main types at crate root
pub use cache::{BucketParams, FileCache};
pub use error::{MuninnError, Result};
pub use ratelimit::RateBucket;
pub use store::{DynamoStore, FileRow, FileStore, MemoryStore};
pub use types::{FileId, FileInfo};

/// Package version from Cargo.toml.
pub const PKG_VERSION: &str = env!("CARGO_PKG_VERSION");
