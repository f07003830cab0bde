//! Gallery discovery.
//!
//! Walks the scan root breadth-first and collects every folder that directly
//! contains at least one image. The walk is bounded twice: nothing deeper
//! than `max_depth` levels below the root is examined, and the whole
//! traversal stops the moment `max_folders` galleries have been found.
//!
//! ## Ordering
//!
//! Ordering happens in two independent phases:
//!
//! - **Discovery**: children of each directory are queued by
//!   [`FolderClassifier::priority`] (photo folders first, then desktop /
//!   documents / downloads, then the rest). This decides which galleries make
//!   it in when the cap truncates a scan.
//! - **Presentation**: the collected list is sorted by relative path,
//!   case-insensitively, before it is returned.
//!
//! ```text
//! ~/                         depth 0
//! ├── Pictures/              depth 1, priority 0 → explored first
//! │   ├── a.jpg              → gallery "Pictures"
//! │   └── sub/AppData/       skipped
//! ├── Documents/             depth 1, priority 1, no images → queued
//! └── .cache/                skipped (dot directory)
//! ```
//!
//! Unreadable directories are treated as empty; a scan never fails.

use crate::classify::FolderClassifier;
use crate::config::ScanConfig;
use crate::guard::PathGuard;
use serde::Serialize;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::{DirEntry, WalkDir};

/// File extensions recognised as images (compared case-insensitively).
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

/// A folder that directly contains images.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FolderEntry {
    /// Path relative to the scan root, segments joined by `/`.
    pub path: String,
    /// Image file names inside the folder, sorted.
    pub images: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanLimits {
    pub max_depth: usize,
    pub max_folders: usize,
}

impl Default for ScanLimits {
    fn default() -> Self {
        let config = ScanConfig::default();
        Self {
            max_depth: config.max_depth,
            max_folders: config.max_folders,
        }
    }
}

/// A directory waiting in the BFS queue.
struct PendingDir {
    path: PathBuf,
    relative: String,
    depth: usize,
    priority: u8,
}

pub struct GalleryScanner {
    guard: PathGuard,
    classifier: FolderClassifier,
    limits: ScanLimits,
    descend_into_galleries: bool,
}

impl GalleryScanner {
    pub fn new(root: impl Into<PathBuf>, classifier: FolderClassifier, limits: ScanLimits) -> Self {
        Self {
            guard: PathGuard::new(root),
            classifier,
            limits,
            descend_into_galleries: false,
        }
    }

    pub fn from_config(config: &ScanConfig) -> Self {
        let classifier = match &config.skip_dirs {
            Some(names) => FolderClassifier::with_skip_dirs(names),
            None => FolderClassifier::default(),
        };
        let limits = ScanLimits {
            max_depth: config.max_depth,
            max_folders: config.max_folders,
        };
        Self::new(config.effective_root(), classifier, limits)
            .descend_into_galleries(config.descend_into_galleries)
    }

    /// Also explore below folders that already qualified as galleries.
    pub fn descend_into_galleries(mut self, enabled: bool) -> Self {
        self.descend_into_galleries = enabled;
        self
    }

    pub fn root(&self) -> &Path {
        self.guard.root()
    }

    /// Run one bounded scan. Returns galleries sorted by path, case-insensitively.
    pub fn scan(&self) -> Vec<FolderEntry> {
        let root = self.root();
        if !root.is_dir() {
            debug!(root = %root.display(), "scan root is not a directory");
            return Vec::new();
        }

        let ScanLimits {
            max_depth,
            max_folders,
        } = self.limits;
        let mut found: Vec<FolderEntry> = Vec::new();
        let mut queue = VecDeque::from([PendingDir {
            path: root.to_path_buf(),
            relative: String::new(),
            depth: 0,
            priority: 0,
        }]);

        'walk: while let Some(node) = queue.pop_front() {
            if found.len() >= max_folders {
                break;
            }
            if node.depth >= max_depth {
                continue;
            }

            let mut children = Vec::new();
            for entry in list_children(&node.path) {
                let Some(name) = entry.file_name().to_str() else {
                    debug!(path = %entry.path().display(), "skipping non UTF-8 name");
                    continue;
                };
                if self.classifier.should_skip(name) || !self.is_traversable_dir(&entry) {
                    continue;
                }

                let relative = if node.relative.is_empty() {
                    name.to_string()
                } else {
                    format!("{}/{}", node.relative, name)
                };
                let images = self.images_in(entry.path());
                let is_gallery = !images.is_empty();

                if is_gallery {
                    found.push(FolderEntry {
                        path: relative.clone(),
                        images,
                    });
                    if found.len() >= max_folders {
                        debug!(max_folders, "gallery cap reached, stopping scan");
                        break 'walk;
                    }
                }
                if !is_gallery || self.descend_into_galleries {
                    children.push(PendingDir {
                        path: entry.path().to_path_buf(),
                        priority: self.classifier.priority(name),
                        relative,
                        depth: node.depth + 1,
                    });
                }
            }

            // Stable: equal priorities keep listing order.
            children.sort_by_key(|child| child.priority);
            queue.extend(children);
        }

        found.sort_by_key(|entry| entry.path.to_lowercase());
        info!(root = %root.display(), galleries = found.len(), "scan complete");
        found
    }

    /// Plain directories always qualify; symlinks only when they point at a
    /// directory inside the root.
    fn is_traversable_dir(&self, entry: &DirEntry) -> bool {
        let file_type = entry.file_type();
        if file_type.is_dir() {
            return true;
        }
        self.is_contained_link(entry) && entry.path().is_dir()
    }

    /// Sorted names of the image files directly inside `dir`.
    ///
    /// Symlinked files count only when they resolve inside the root, so every
    /// listed image can be served.
    fn images_in(&self, dir: &Path) -> Vec<String> {
        let mut images: Vec<String> = list_children(dir)
            .into_iter()
            .filter(|entry| {
                let file_type = entry.file_type();
                file_type.is_file() || (self.is_contained_link(entry) && entry.path().is_file())
            })
            .filter_map(|entry| entry.file_name().to_str().map(str::to_string))
            .filter(|name| is_image_name(name))
            .collect();
        images.sort();
        images
    }

    /// A symlink whose target lies inside the root. The target is not
    /// stat'ed before this holds.
    fn is_contained_link(&self, entry: &DirEntry) -> bool {
        entry.file_type().is_symlink() && self.guard.is_within_root(entry.path())
    }
}

/// True when the file name carries an allow-listed image extension.
pub fn is_image_name(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|allowed| ext.eq_ignore_ascii_case(allowed))
        })
}

/// Immediate children of `dir`, sorted by name.
///
/// An unreadable directory yields an empty list; an entry that cannot be
/// read is dropped without hiding its siblings.
fn list_children(dir: &Path) -> Vec<DirEntry> {
    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(err) => {
                debug!(dir = %dir.display(), error = %err, "skipping unreadable entry");
                None
            }
        })
        .collect()
}
