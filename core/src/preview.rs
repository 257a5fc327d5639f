//! Playback preview resources.
//!
//! New uploads get a locally created preview URL from a [`PreviewStore`]; the form that
//! created it owns it and must revoke it exactly once. Library and pack rows carry
//! server URLs which are never passed to [`PreviewStore::revoke`].

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use tracing::{trace, warn};
use uuid::Uuid;

use crate::sample::SampleFile;

const OBJECT_URL_PREFIX: &str = "blob:packsync/";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PreviewUrl(String);

impl PreviewUrl {
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PreviewUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Creates and releases local preview resources.
pub trait PreviewStore: Send + Sync {
    /// Creates a preview for a local file. Must not block on I/O.
    fn create(&self, file: &SampleFile) -> PreviewUrl;

    /// Releases a preview previously returned by [`PreviewStore::create`].
    fn revoke(&self, url: &PreviewUrl);
}

/// In-process object URL table: hands out `blob:` URLs that resolve to local paths
/// until revoked.
#[derive(Debug, Default)]
pub struct ObjectUrlTable {
    entries: Mutex<HashMap<PreviewUrl, PathBuf>>,
}

impl ObjectUrlTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves a live URL to the file it points at.
    pub fn resolve(&self, url: &PreviewUrl) -> Option<PathBuf> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(url)
            .cloned()
    }

    /// Number of URLs created and not yet revoked.
    pub fn live_count(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl PreviewStore for ObjectUrlTable {
    fn create(&self, file: &SampleFile) -> PreviewUrl {
        let url = PreviewUrl::new(format!("{}{}", OBJECT_URL_PREFIX, Uuid::new_v4()));
        trace!(%url, path = %file.path().display(), "Created preview url");
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(url.clone(), file.path().to_path_buf());
        url
    }

    fn revoke(&self, url: &PreviewUrl) {
        let removed = self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(url);
        if removed.is_none() {
            warn!(%url, "Revoked a preview url that is not live");
        }
    }
}
