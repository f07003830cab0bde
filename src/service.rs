//! The façade the presentation layer talks to.
//!
//! A [`GalleryService`] is built once at startup from a [`ServiceConfig`] and
//! owns one scan cache, one result cache and one segmenter. All methods take
//! `&self`; the caches lock internally, so a single instance can be shared
//! across request threads (`GalleryService` is `Send + Sync`).
//!
//! ```text
//! list_galleries ──► ScanCache ──► GalleryScanner
//! resolve_image  ──► PathGuard
//! segment_image  ──► PathGuard ──► Segmenter ──► ResultCache ──► SegmentId
//! fetch_segment  ──► ResultCache
//! ```

use crate::cache::{ResultCache, ScanCache, ScanSnapshot, SegmentId};
use crate::config::ServiceConfig;
use crate::guard::{GuardError, PathGuard};
use crate::imaging::{ImageSource, SegmentError, Segmenter};
use crate::scan::{GalleryScanner, is_image_name};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Access denied: {0}")]
    AccessDenied(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Segmentation failed: {0}")]
    Segmentation(SegmentError),
}

impl From<GuardError> for ServiceError {
    fn from(err: GuardError) -> Self {
        Self::AccessDenied(err.to_string())
    }
}

impl From<SegmentError> for ServiceError {
    fn from(err: SegmentError) -> Self {
        match err {
            SegmentError::Io(io) if io.kind() == std::io::ErrorKind::NotFound => {
                Self::NotFound(io.to_string())
            }
            other => Self::Segmentation(other),
        }
    }
}

/// Image to segment: a file below the scan root, or uploaded bytes.
#[derive(Debug, Clone, Copy)]
pub enum SegmentInput<'a> {
    /// `/`-separated path relative to the scan root.
    Gallery(&'a str),
    Upload(&'a [u8]),
}

/// What a gallery page shows: every folder, the selected one and its images.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GalleryView {
    pub folders: Vec<String>,
    pub selected: Option<String>,
    pub images: Vec<String>,
}

pub struct GalleryService {
    guard: PathGuard,
    scans: ScanCache<GalleryScanner>,
    segmenter: Segmenter,
    results: ResultCache,
    default_k: u32,
    default_max_dimension: u32,
}

impl GalleryService {
    pub fn new(config: &ServiceConfig) -> Self {
        let scanner = GalleryScanner::from_config(&config.scan);
        Self {
            guard: PathGuard::new(scanner.root()),
            scans: ScanCache::new(scanner, config.scan.cache_ttl()),
            segmenter: Segmenter::from_config(&config.segment),
            results: ResultCache::new(config.results.capacity),
            default_k: config.segment.default_k,
            default_max_dimension: config.segment.max_dimension,
        }
    }

    pub fn root(&self) -> &Path {
        self.guard.root()
    }

    /// Cluster count used when a caller has none of its own.
    pub fn default_k(&self) -> u32 {
        self.default_k
    }

    pub fn default_max_dimension(&self) -> u32 {
        self.default_max_dimension
    }

    /// Galleries below the root, sorted by path. Served from cache within the TTL.
    pub fn list_galleries(&self, force_refresh: bool) -> Arc<ScanSnapshot> {
        self.scans.get(force_refresh)
    }

    /// Make the next [`list_galleries`](Self::list_galleries) rescan.
    pub fn invalidate_galleries(&self) {
        self.scans.invalidate();
    }

    /// Build the view for `requested`. Unknown or missing folders fall back to
    /// the first gallery; with no galleries nothing is selected.
    pub fn browse(&self, requested: Option<&str>, refresh: bool) -> GalleryView {
        if refresh {
            self.invalidate_galleries();
        }
        let snapshot = self.list_galleries(false);
        let folders: Vec<String> = snapshot.folders.iter().map(|f| f.path.clone()).collect();

        let requested = requested
            .map(|r| r.trim().replace('\\', "/"))
            .unwrap_or_default();
        let selected = snapshot
            .find(&requested)
            .or_else(|| snapshot.folders.first());

        GalleryView {
            selected: selected.map(|f| f.path.clone()),
            images: selected.map(|f| f.images.clone()).unwrap_or_default(),
            folders,
        }
    }

    /// Map a relative path onto the root, refusing `..` segments and anything
    /// that resolves outside the root.
    pub fn resolve_and_guard(&self, relative: &str) -> Result<PathBuf, ServiceError> {
        self.guard.join_guarded(relative).map_err(|err| {
            warn!(requested = relative, error = %err, "rejected path");
            ServiceError::from(err)
        })
    }

    /// [`resolve_and_guard`](Self::resolve_and_guard) for a file that is about
    /// to be served: it must exist and carry an allow-listed image extension.
    pub fn resolve_image(&self, relative: &str) -> Result<PathBuf, ServiceError> {
        let path = self.resolve_and_guard(relative)?;
        if !path.is_file() {
            return Err(ServiceError::NotFound(relative.to_string()));
        }
        let allowed = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(is_image_name);
        if !allowed {
            warn!(requested = relative, "rejected non-image file");
            return Err(ServiceError::AccessDenied(format!(
                "not an image file: {relative}"
            )));
        }
        Ok(path)
    }

    /// Segment an image and keep the PNG result in memory.
    ///
    /// Returns the id to pass to [`fetch_segment`](Self::fetch_segment).
    pub fn segment_image(
        &self,
        input: SegmentInput<'_>,
        k: u32,
        max_dimension: u32,
    ) -> Result<SegmentId, ServiceError> {
        let payload = match input {
            SegmentInput::Gallery(relative) => {
                let path = self.resolve_image(relative)?;
                self.segmenter
                    .segment(ImageSource::Path(&path), k, max_dimension)?
            }
            SegmentInput::Upload(bytes) => {
                self.segmenter
                    .segment(ImageSource::Bytes(bytes), k, max_dimension)?
            }
        };
        let bytes = payload.len();
        let id = self.results.put(payload);
        info!(%id, bytes, "stored segmentation result");
        Ok(id)
    }

    /// Encoded PNG for `id`, if it has not been evicted.
    pub fn fetch_segment(&self, id: &str) -> Result<Arc<[u8]>, ServiceError> {
        self.results
            .get(id)
            .ok_or_else(|| ServiceError::NotFound(format!("segment {id}")))
    }
}
