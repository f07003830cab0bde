//! Palette segmentation: decode → downscale → K-means → reconstruct → PNG.
//!
//! The segmenter is pure with respect to storage: it reads its input from a
//! path or an in-memory buffer and hands back encoded bytes. Persisting the
//! result (or cleaning up an upload after a failure) is the caller's job.

use super::calculations::fit_within;
use super::kmeans::{ClusterError, ColorHistogram, kmeans};
use super::params::{KMeansSettings, KRange};
use crate::config::SegmentConfig;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, ImageReader, RgbImage};
use std::io::Cursor;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum SegmentError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to decode image: {0}")]
    Decode(String),
    #[error("Clustering failed: {0}")]
    Cluster(#[from] ClusterError),
    #[error("Failed to encode result: {0}")]
    Encode(String),
}

/// Where the image to segment comes from.
#[derive(Debug, Clone, Copy)]
pub enum ImageSource<'a> {
    Path(&'a Path),
    Bytes(&'a [u8]),
}

/// K-means palette reducer. Output is always PNG.
#[derive(Debug, Clone)]
pub struct Segmenter {
    k_range: KRange,
    settings: KMeansSettings,
}

impl Default for Segmenter {
    fn default() -> Self {
        Self::new(KRange::default(), KMeansSettings::default())
    }
}

impl Segmenter {
    pub fn new(k_range: KRange, settings: KMeansSettings) -> Self {
        Self { k_range, settings }
    }

    pub fn from_config(config: &SegmentConfig) -> Self {
        Self::new(
            KRange::new(config.k_min, config.k_max),
            KMeansSettings::from_config(config),
        )
    }

    pub fn k_range(&self) -> KRange {
        self.k_range
    }

    /// Segment `source` into `k` colors and return the PNG-encoded result.
    ///
    /// `k` is clamped into the configured range. Images whose longer edge
    /// exceeds `max_dimension` are downscaled (Lanczos3) first; the output
    /// has the downscaled dimensions.
    pub fn segment(
        &self,
        source: ImageSource<'_>,
        k: u32,
        max_dimension: u32,
    ) -> Result<Vec<u8>, SegmentError> {
        let decoded = decode(source)?;
        let reduced = self.reduce(&decoded.to_rgb8(), k, max_dimension)?;
        encode_png(&reduced)
    }

    /// Pixel-level part of [`segment`](Self::segment), without decoding or encoding.
    pub fn reduce(
        &self,
        image: &RgbImage,
        k: u32,
        max_dimension: u32,
    ) -> Result<RgbImage, SegmentError> {
        let k = self.k_range.clamp(k);
        let resized;
        let image = match fit_within(image.dimensions(), max_dimension) {
            Some((width, height)) => {
                debug!(
                    from = ?image.dimensions(),
                    to = ?(width, height),
                    "downscaling before clustering"
                );
                resized = image::imageops::resize(image, width, height, FilterType::Lanczos3);
                &resized
            }
            None => image,
        };

        let histogram = ColorHistogram::from_pixels(image.pixels().map(|p| p.0));
        let clustering = kmeans(&histogram, k as usize, &self.settings)?;
        let palette = clustering.palette();

        let mut out = image.clone();
        for px in out.pixels_mut() {
            if let Some(i) = histogram.index_of(px.0) {
                px.0 = palette[clustering.labels[i]];
            }
        }

        info!(
            width = out.width(),
            height = out.height(),
            k,
            distinct_colors = histogram.len(),
            iterations = clustering.iterations,
            "segmented image"
        );
        Ok(out)
    }
}

fn decode(source: ImageSource<'_>) -> Result<DynamicImage, SegmentError> {
    match source {
        ImageSource::Path(path) => ImageReader::open(path)?
            .with_guessed_format()?
            .decode()
            .map_err(|e| SegmentError::Decode(format!("{}: {}", path.display(), e))),
        ImageSource::Bytes(bytes) => ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()?
            .decode()
            .map_err(|e| SegmentError::Decode(e.to_string())),
    }
}

fn encode_png(image: &RgbImage) -> Result<Vec<u8>, SegmentError> {
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .map_err(|e| SegmentError::Encode(e.to_string()))?;
    Ok(bytes)
}
