//! Per-artifact write serialization.
//!
//! # Responsibilities
//! - Hand out one async mutex per artifact path
//! - Keep the guard alive across edit, validate, apply and restore
//!
//! # Design Decisions
//! - Paths are used as given; callers build them from the same layout so they match
//! - Entries are never evicted (one per artifact ever touched)

use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Lock table keyed by artifact path.
#[derive(Debug, Clone, Default)]
pub struct ArtifactLocks {
    inner: Arc<DashMap<PathBuf, Arc<Mutex<()>>>>,
}

impl ArtifactLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `path`.
    pub async fn lock(&self, path: &Path) -> OwnedMutexGuard<()> {
        // Clone the Arc out so the DashMap shard lock is released before awaiting.
        let mutex = self
            .inner
            .entry(path.to_path_buf())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        mutex.lock_owned().await
    }

    /// Number of distinct paths seen so far.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}
