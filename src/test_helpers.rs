//! Shared test utilities.
//!
//! Builds throwaway directory trees and small synthetic images so scanner,
//! guard and segmentation tests stay self-contained.
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = tree(&["Pictures/a.jpg", "Empty/"]);
//! let png = solid_png(10, 10, [255, 0, 0]);
//! ```

use image::{ImageFormat, RgbImage};
use std::io::Cursor;
use std::path::Path;
use tempfile::TempDir;

use crate::scan::FolderEntry;

// =========================================================================
// Directory trees
// =========================================================================

/// Create a temp directory containing `paths`.
///
/// Entries ending in `/` become directories; everything else becomes a small
/// placeholder file (the scanner only looks at extensions).
pub fn tree(paths: &[&str]) -> TempDir {
    let tmp = TempDir::new().unwrap();
    for path in paths {
        touch(tmp.path(), path);
    }
    tmp
}

/// Create a single file or directory below `root`, creating parents.
pub fn touch(root: &Path, path: &str) {
    let full = root.join(path);
    if path.ends_with('/') {
        std::fs::create_dir_all(&full).unwrap();
    } else {
        std::fs::create_dir_all(full.parent().unwrap()).unwrap();
        std::fs::write(&full, b"placeholder").unwrap();
    }
}

/// Relative paths of scan results, in order.
pub fn paths(entries: &[FolderEntry]) -> Vec<&str> {
    entries.iter().map(|e| e.path.as_str()).collect()
}

// =========================================================================
// Synthetic images
// =========================================================================

/// Encode an RGB image as PNG bytes.
pub fn encode_png(img: &RgbImage) -> Vec<u8> {
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    bytes
}

/// A single-color PNG.
pub fn solid_png(width: u32, height: u32, color: [u8; 3]) -> Vec<u8> {
    encode_png(&RgbImage::from_pixel(width, height, image::Rgb(color)))
}

/// Left half `left`, right half `right`.
pub fn split_png(width: u32, height: u32, left: [u8; 3], right: [u8; 3]) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, _| {
        if x < width / 2 {
            image::Rgb(left)
        } else {
            image::Rgb(right)
        }
    });
    encode_png(&img)
}

/// A smooth two-axis gradient; has many distinct colors.
pub fn gradient_png(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([
            (x * 255 / width.max(1)) as u8,
            (y * 255 / height.max(1)) as u8,
            ((x + y) * 127 / (width + height).max(1)) as u8,
        ])
    });
    encode_png(&img)
}

/// Decode PNG bytes back into RGB pixels.
pub fn decode_rgb(bytes: &[u8]) -> RgbImage {
    image::load_from_memory(bytes).unwrap().to_rgb8()
}
