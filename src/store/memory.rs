//! In-memory [`FileStore`] for tests and local development.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;

use super::{FileRow, FileStore};
use crate::types::FileId;
use crate::{MuninnError, Result};

/// A [`FileStore`] backed by a plain map.
///
/// Rows can be inserted and removed at any time, so tests can change
/// what a re-fetch observes. [`set_failing`](Self::set_failing) makes
/// every subsequent call return a store error, for exercising the
/// internal-error paths.
#[derive(Default)]
pub struct MemoryStore {
    rows: Mutex<HashMap<FileId, FileRow>>,
    failing: AtomicBool,
    fetches: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the row for `id`.
    pub fn insert(&self, id: FileId, row: FileRow) {
        self.lock_rows().insert(id, row);
    }

    /// Remove the row for `id`, if any.
    pub fn remove(&self, id: &FileId) {
        self.lock_rows().remove(id);
    }

    /// When set, `scan_ids` and `fetch` fail with a store error.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of `fetch` calls made so far, failed ones included.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    fn lock_rows(&self) -> std::sync::MutexGuard<'_, HashMap<FileId, FileRow>> {
        self.rows.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn check_failing(&self) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(MuninnError::Store("injected store failure".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl FileStore for MemoryStore {
    async fn scan_ids(&self) -> Result<Vec<FileId>> {
        self.check_failing()?;
        Ok(self.lock_rows().keys().cloned().collect())
    }

    async fn fetch(&self, id: &FileId) -> Result<Option<FileRow>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.check_failing()?;
        Ok(self.lock_rows().get(id).cloned())
    }
}
