//! CLI output formatting.
//!
//! # Output Format
//!
//! ## Scan
//!
//! ```text
//! Galleries under /home/me
//! 001 Pictures (2 images)
//! 002 Travel/Japan (1 image)
//!
//! 2 galleries, 3 images
//! ```
//!
//! ## Browse
//!
//! ```text
//! Galleries
//!     001 Pictures
//!   * 002 Travel/Japan
//!
//! Travel/Japan (2 images)
//!     001 b.png
//!     002 c.png
//! ```
//!
//! ## Segment
//!
//! ```text
//! Segment 3f2a9c0d1b4e5f60
//!     Source: Pictures/a.jpg
//!     Output: out.png (4821 bytes)
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout.

use crate::cache::SegmentId;
use crate::scan::FolderEntry;
use crate::service::GalleryView;
use std::path::Path;

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn image_count(n: usize) -> String {
    if n == 1 {
        "1 image".to_string()
    } else {
        format!("{} images", n)
    }
}

// ============================================================================
// Scan
// ============================================================================

pub fn format_scan_output(folders: &[FolderEntry], root: &Path) -> Vec<String> {
    if folders.is_empty() {
        return vec![format!("No galleries under {}", root.display())];
    }

    let mut lines = vec![format!("Galleries under {}", root.display())];
    for (i, folder) in folders.iter().enumerate() {
        lines.push(format!(
            "{} {} ({})",
            format_index(i + 1),
            folder.path,
            image_count(folder.images.len())
        ));
    }

    let total: usize = folders.iter().map(|f| f.images.len()).sum();
    let galleries = if folders.len() == 1 {
        "1 gallery".to_string()
    } else {
        format!("{} galleries", folders.len())
    };
    lines.push(String::new());
    lines.push(format!("{}, {}", galleries, image_count(total)));
    lines
}

pub fn print_scan_output(folders: &[FolderEntry], root: &Path) {
    for line in format_scan_output(folders, root) {
        println!("{}", line);
    }
}

// ============================================================================
// Browse
// ============================================================================

pub fn format_browse_output(view: &GalleryView) -> Vec<String> {
    let Some(selected) = view.selected.as_deref() else {
        return vec!["No galleries".to_string()];
    };

    let mut lines = vec!["Galleries".to_string()];
    for (i, folder) in view.folders.iter().enumerate() {
        let marker = if folder == selected { "  * " } else { "    " };
        lines.push(format!("{}{} {}", marker, format_index(i + 1), folder));
    }

    lines.push(String::new());
    lines.push(format!("{} ({})", selected, image_count(view.images.len())));
    for (i, image) in view.images.iter().enumerate() {
        lines.push(format!("{}{} {}", indent(1), format_index(i + 1), image));
    }
    lines
}

pub fn print_browse_output(view: &GalleryView) {
    for line in format_browse_output(view) {
        println!("{}", line);
    }
}

// ============================================================================
// Segment
// ============================================================================

pub fn format_segment_output(
    id: &SegmentId,
    source: &str,
    destination: &Path,
    bytes: usize,
) -> Vec<String> {
    vec![
        format!("Segment {}", id),
        format!("{}Source: {}", indent(1), source),
        format!(
            "{}Output: {} ({} bytes)",
            indent(1),
            destination.display(),
            bytes
        ),
    ]
}

pub fn print_segment_output(id: &SegmentId, source: &str, destination: &Path, bytes: usize) {
    for line in format_segment_output(id, source, destination, bytes) {
        println!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(path: &str, images: &[&str]) -> FolderEntry {
        FolderEntry {
            path: path.to_string(),
            images: images.iter().map(|s| s.to_string()).collect(),
        }
    }

    // =========================================================================
    // Scan
    // =========================================================================

    #[test]
    fn scan_lists_galleries_with_counts() {
        let folders = vec![
            entry("Pictures", &["a.jpg", "b.jpg"]),
            entry("Travel/Japan", &["c.png"]),
        ];
        let lines = format_scan_output(&folders, Path::new("/home/me"));
        assert_eq!(
            lines,
            vec![
                "Galleries under /home/me",
                "001 Pictures (2 images)",
                "002 Travel/Japan (1 image)",
                "",
                "2 galleries, 3 images",
            ]
        );
    }

    #[test]
    fn scan_singular_summary() {
        let lines = format_scan_output(&[entry("Pictures", &["a.jpg"])], Path::new("/r"));
        assert_eq!(lines.last().unwrap(), "1 gallery, 1 image");
    }

    #[test]
    fn scan_empty() {
        let lines = format_scan_output(&[], Path::new("/r"));
        assert_eq!(lines, vec!["No galleries under /r"]);
    }

    // =========================================================================
    // Browse
    // =========================================================================

    #[test]
    fn browse_marks_selected_and_lists_images() {
        let view = GalleryView {
            folders: vec!["Pictures".into(), "Travel/Japan".into()],
            selected: Some("Travel/Japan".into()),
            images: vec!["b.png".into(), "c.png".into()],
        };
        assert_eq!(
            format_browse_output(&view),
            vec![
                "Galleries",
                "    001 Pictures",
                "  * 002 Travel/Japan",
                "",
                "Travel/Japan (2 images)",
                "    001 b.png",
                "    002 c.png",
            ]
        );
    }

    #[test]
    fn browse_without_selection() {
        let view = GalleryView {
            folders: vec![],
            selected: None,
            images: vec![],
        };
        assert_eq!(format_browse_output(&view), vec!["No galleries"]);
    }

    // =========================================================================
    // Segment
    // =========================================================================

    #[test]
    fn segment_shows_id_source_and_output() {
        let id = crate::cache::ResultCache::new(1).put(vec![0]);
        let lines = format_segment_output(&id, "Pictures/a.jpg", Path::new("out.png"), 42);
        assert_eq!(lines[0], format!("Segment {}", id.as_str()));
        assert_eq!(lines[1], "    Source: Pictures/a.jpg");
        assert_eq!(lines[2], "    Output: out.png (42 bytes)");
    }
}
