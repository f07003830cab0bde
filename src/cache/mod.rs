//! In-memory caches owned by the gallery service.
//!
//! Both caches live for the lifetime of one [`GalleryService`](crate::service::GalleryService)
//! and are internally locked, so the service can be shared across threads.
//! Nothing here is written to disk.
//!
//! | Cache | Holds | Eviction |
//! |---|---|---|
//! | [`ScanCache`] | the last gallery scan | time-to-live, or explicit [`invalidate`](ScanCache::invalidate) |
//! | [`ResultCache`] | encoded segmentation results | FIFO once `capacity` is exceeded |

mod result_cache;
mod scan_cache;

pub use result_cache::{ResultCache, SegmentId};
pub use scan_cache::{FolderSource, ScanCache, ScanSnapshot};
