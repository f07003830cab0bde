//! # Photo Segment
//!
//! Discovers photo folders below a root directory, serves their images
//! without ever leaving that root, and reduces images to a small palette of
//! color regions with K-means.
//!
//! # Architecture
//!
//! ```text
//!                      ┌──────────────────── GalleryService ───────────────────┐
//! list_galleries  ───► │ ScanCache (TTL) ──► GalleryScanner ──► FolderClassifier│
//! resolve_image   ───► │ PathGuard                                             │
//! segment_image   ───► │ PathGuard ──► Segmenter ──► ResultCache (FIFO)        │
//! fetch_segment   ───► │ ResultCache                                           │
//!                      └───────────────────────────────────────────────────────┘
//! ```
//!
//! The library is synchronous. Both caches lock internally, so one
//! [`service::GalleryService`] can be shared across request threads.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`service`] | The façade: gallery listing, browsing, guarded file access, segmentation |
//! | [`scan`] | Bounded breadth-first discovery of gallery folders |
//! | [`classify`] | Skip rules and search priority for directory names |
//! | [`guard`] | Root containment checks for user-supplied paths |
//! | [`cache`] | TTL scan cache and FIFO result store |
//! | [`imaging`] | Decode, downscale, K-means palette reduction, PNG encode |
//! | [`config`] | `config.toml` loading, merging over stock defaults, validation |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Discovery Order Is Not Display Order
//!
//! Folders likely to hold photos (`Pictures`, `Photos`, ...) are queued
//! first so they are found before the folder cap is reached. The returned
//! list is then sorted case-insensitively by path, so the order a user sees
//! does not depend on which folders happened to be found first.
//!
//! ## Deterministic Segmentation
//!
//! K-means seeding draws from a SHA-256 counter stream keyed by the
//! configured seed. Restarts run in parallel on rayon but the winner is
//! picked by (inertia, restart index), so the same image and `k` always
//! produce the same bytes.
//!
//! ## No Persistence
//!
//! Scan results and segmentations live in memory only. Results are evicted
//! oldest-first once the store is full; an evicted id reads as not found.

pub mod cache;
pub mod classify;
pub mod config;
pub mod guard;
pub mod imaging;
pub mod output;
pub mod scan;
pub mod service;

#[cfg(test)]
pub(crate) mod test_helpers;
