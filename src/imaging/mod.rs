//! Palette segmentation in pure Rust.
//!
//! | Step | Crate / function |
//! |---|---|
//! | **Decode** (JPEG, PNG, GIF, WebP) | `image::ImageReader` with format sniffing |
//! | **Downscale** | `image::imageops::resize` with `Lanczos3` |
//! | **Cluster** | weighted K-means over the color histogram ([`kmeans`]) |
//! | **Encode** | `image` PNG encoder |
//!
//! The module is split into:
//! - **Calculations**: pure dimension math (unit testable)
//! - **Parameters**: cluster-count range and K-means tuning
//! - **K-means**: histogram, seeding, Lloyd iterations, restarts
//! - **Segment**: [`Segmenter`], tying the steps together

mod calculations;
pub mod kmeans;
mod params;
mod segment;

pub use calculations::fit_within;
pub use kmeans::{ClusterError, Clustering, ColorHistogram};
pub use params::{KMeansSettings, KRange};
pub use segment::{ImageSource, SegmentError, Segmenter};
