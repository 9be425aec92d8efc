//! Backing-store collaborators.
//!
//! [`FileStore`] abstracts the key-value store that holds one row per
//! tracked identifier. The lookup cache needs exactly two capabilities:
//! a startup-time scan of every distinct identifier, and an exact point
//! lookup returning the row's object key and build-number pattern.
//!
//! [`DynamoStore`] is the production implementation; [`MemoryStore`] is
//! an in-process implementation for tests and local development.

mod dynamo;
mod memory;

pub use dynamo::{DEFAULT_TABLE, DynamoStore};
pub use memory::MemoryStore;

use async_trait::async_trait;

use crate::Result;
use crate::types::FileId;

/// One backing-store row, projected to the fields lookups consume.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRow {
    /// Object key of the newest build artifact.
    pub object_key: String,
    /// Regular expression whose first capture group extracts the build
    /// number from the object key. Stored as data, compiled per lookup.
    pub pattern: String,
}

/// The backing key-value store for latest-file rows.
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Every distinct identifier present in the store.
    ///
    /// Called once at startup to pre-seed the lookup cache; a failure
    /// here is fatal to the service.
    async fn scan_ids(&self) -> Result<Vec<FileId>>;

    /// Exact point lookup. `Ok(None)` means no row for this identifier.
    async fn fetch(&self, id: &FileId) -> Result<Option<FileRow>>;
}
