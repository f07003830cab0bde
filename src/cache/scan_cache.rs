//! Time-boxed memoization of gallery scans.
//!
//! A snapshot is replaced wholesale on refresh, never mutated, so readers can
//! hold on to an `Arc<ScanSnapshot>` while a newer one is being produced.

use crate::scan::{FolderEntry, GalleryScanner};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use tracing::debug;

/// Anything that can produce a gallery list.
pub trait FolderSource: Send + Sync {
    fn scan(&self) -> Vec<FolderEntry>;
}

impl FolderSource for GalleryScanner {
    fn scan(&self) -> Vec<FolderEntry> {
        GalleryScanner::scan(self)
    }
}

/// One completed scan.
#[derive(Debug)]
pub struct ScanSnapshot {
    pub folders: Vec<FolderEntry>,
    pub captured_at: Instant,
}

impl ScanSnapshot {
    pub fn age(&self) -> Duration {
        self.captured_at.elapsed()
    }

    /// Look up a gallery by its relative path.
    pub fn find(&self, path: &str) -> Option<&FolderEntry> {
        self.folders.iter().find(|f| f.path == path)
    }
}

pub struct ScanCache<S = GalleryScanner> {
    source: S,
    ttl: Duration,
    slot: Mutex<Option<Arc<ScanSnapshot>>>,
}

impl<S: FolderSource> ScanCache<S> {
    pub fn new(source: S, ttl: Duration) -> Self {
        Self {
            source,
            ttl,
            slot: Mutex::new(None),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Return the cached snapshot while it is younger than the TTL, otherwise
    /// rescan. `force_refresh` always rescans.
    ///
    /// The lock is held during a rescan, so concurrent callers wait for the
    /// one scan instead of starting their own.
    pub fn get(&self, force_refresh: bool) -> Arc<ScanSnapshot> {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        if !force_refresh
            && let Some(snapshot) = slot.as_ref()
            && snapshot.age() < self.ttl
        {
            debug!(age_ms = snapshot.age().as_millis() as u64, "scan cache hit");
            return Arc::clone(snapshot);
        }

        let snapshot = Arc::new(ScanSnapshot {
            folders: self.source.scan(),
            captured_at: Instant::now(),
        });
        *slot = Some(Arc::clone(&snapshot));
        snapshot
    }

    /// Drop the stored snapshot; the next [`get`](Self::get) rescans.
    pub fn invalidate(&self) {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        debug!("scan cache invalidated");
    }
}
