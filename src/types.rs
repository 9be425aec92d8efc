//! Domain types for latest-file lookups.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{MuninnError, Result};

/// Composite key identifying one tracked latest-file: a storage bucket
/// plus a release channel.
///
/// Equality is structural and exact: no normalization, case matters.
/// This is the cache map key, so the derives here (`Eq`, `Hash`) are
/// load-bearing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileId {
    pub bucket: String,
    pub channel: String,
}

impl FileId {
    pub fn new(bucket: impl Into<String>, channel: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            channel: channel.into(),
        }
    }
}

impl std::fmt::Display for FileId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.bucket, self.channel)
    }
}

/// Resolved latest-file information, as served to callers.
///
/// Immutable once constructed; the cache replaces it wholesale on each
/// successful fetch, never field by field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInfo {
    #[serde(flatten)]
    pub id: FileId,
    /// Object key of the newest build artifact.
    pub key: String,
    /// Public download URL derived from the bucket and object key.
    pub url: String,
    /// Build number extracted from the object key, or empty when the
    /// stored pattern has no capture or does not match.
    #[serde(rename = "buildnum")]
    pub build_num: String,
}

impl FileInfo {
    /// Build a `FileInfo` from a backing-store row.
    ///
    /// `pattern` is a regular expression supplied by the row; its first
    /// capture group, applied to `object_key`, yields the build number.
    /// A pattern that matches without capturing, or does not match at
    /// all, leaves the build number empty; only a pattern that fails to
    /// compile is an error.
    pub fn resolve(id: FileId, object_key: &str, pattern: &str) -> Result<Self> {
        let re = Regex::new(pattern)
            .map_err(|e| MuninnError::Pattern(format!("{pattern:?}: {e}")))?;
        let build_num = re
            .captures(object_key)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
            .unwrap_or_default();
        let url = format!("https://{}/{}", id.bucket, object_key);
        Ok(Self {
            id,
            key: object_key.to_string(),
            url,
            build_num,
        })
    }
}
