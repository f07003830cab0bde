//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

/// Dimensions that fit `original` inside a `max_dimension` square.
///
/// Returns `None` when no downscale is needed: the longer edge is already
/// within bounds, or `max_dimension` is 0 (no limit). The longer edge of the
/// result equals `max_dimension`; the shorter edge is rounded and never
/// drops below 1.
///
/// # Examples
/// ```
/// # use photo_segment::imaging::fit_within;
/// assert_eq!(fit_within((4000, 3000), 1000), Some((1000, 750)));
/// assert_eq!(fit_within((300, 200), 1000), None);
/// ```
pub fn fit_within(original: (u32, u32), max_dimension: u32) -> Option<(u32, u32)> {
    let (width, height) = original;
    let longer_edge = width.max(height);
    if max_dimension == 0 || longer_edge <= max_dimension {
        return None;
    }

    let ratio = max_dimension as f64 / longer_edge as f64;
    let scale = |edge: u32| ((edge as f64 * ratio).round() as u32).max(1);
    if width >= height {
        Some((max_dimension, scale(height)))
    } else {
        Some((scale(width), max_dimension))
    }
}
