//! Weighted K-means over RGB colors.
//!
//! Pixels are first collapsed into a [`ColorHistogram`] (distinct colors with
//! their pixel counts), so the cost of an iteration depends on the number of
//! distinct colors rather than the number of pixels. Clustering the weighted
//! histogram gives the same centroids as clustering every pixel.
//!
//! ## Algorithm
//!
//! 1. **Seeding**: k-means++. The first center is drawn proportionally to
//!    pixel count, each next one proportionally to `count × distance²` to the
//!    nearest chosen center.
//! 2. **Refinement**: Lloyd iterations (assign each color to its nearest
//!    centroid, move each centroid to the weighted mean of its members) until
//!    the summed squared centroid movement is within `tolerance` or
//!    `max_iterations` is reached. A cluster that loses all members keeps its
//!    previous centroid.
//! 3. **Restarts**: `restarts` independent runs on the rayon pool; the run
//!    with the lowest inertia (weighted sum of squared distances) wins, ties
//!    going to the lowest run index.
//!
//! ## Determinism
//!
//! Random draws come from [`SeedStream`], a SHA-256 counter keyed by
//! `(seed, run index)`. Sums over members use exact integer arithmetic and
//! the inertia is summed sequentially, so results do not depend on thread
//! scheduling: equal inputs and settings give bit-identical centroids.

use super::params::KMeansSettings;
use rayon::prelude::*;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use thiserror::Error;

pub type Rgb = [u8; 3];

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ClusterError {
    #[error("image has no pixels")]
    NoPixels,
    #[error("cluster count must be at least 1")]
    ZeroClusters,
}

/// Distinct colors, sorted, with the number of pixels of each.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorHistogram {
    colors: Vec<Rgb>,
    counts: Vec<u64>,
}

impl ColorHistogram {
    pub fn from_pixels<I: IntoIterator<Item = Rgb>>(pixels: I) -> Self {
        let mut tally: BTreeMap<Rgb, u64> = BTreeMap::new();
        for px in pixels {
            *tally.entry(px).or_default() += 1;
        }
        let (colors, counts) = tally.into_iter().unzip();
        Self { colors, counts }
    }

    /// Number of distinct colors.
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    pub fn colors(&self) -> &[Rgb] {
        &self.colors
    }

    /// Position of `color` in [`colors`](Self::colors).
    pub fn index_of(&self, color: Rgb) -> Option<usize> {
        self.colors.binary_search(&color).ok()
    }
}

/// Outcome of a clustering run.
#[derive(Debug, Clone, PartialEq)]
pub struct Clustering {
    pub centroids: Vec<[f64; 3]>,
    /// Cluster of each histogram color, aligned with [`ColorHistogram::colors`].
    pub labels: Vec<usize>,
    /// Weighted sum of squared distances to the assigned centroid.
    pub inertia: f64,
    pub iterations: u32,
}

impl Clustering {
    /// Centroids rounded to the nearest 8-bit color.
    pub fn palette(&self) -> Vec<Rgb> {
        self.centroids
            .iter()
            .map(|c| c.map(|channel| channel.round().clamp(0.0, 255.0) as u8))
            .collect()
    }
}

/// Cluster `histogram` into at most `k` groups.
///
/// `k` is lowered to the number of distinct colors; extra centers could only
/// duplicate existing colors.
pub fn kmeans(
    histogram: &ColorHistogram,
    k: usize,
    settings: &KMeansSettings,
) -> Result<Clustering, ClusterError> {
    if histogram.is_empty() {
        return Err(ClusterError::NoPixels);
    }
    if k == 0 {
        return Err(ClusterError::ZeroClusters);
    }
    let k = k.min(histogram.len());
    let points: Vec<[f64; 3]> = histogram.colors.iter().map(|c| c.map(f64::from)).collect();

    let runs: Vec<Clustering> = (0..settings.restarts.max(1))
        .into_par_iter()
        .map(|run| {
            let mut seeds = SeedStream::new(settings.seed, u64::from(run));
            let initial = seed_centroids(&points, &histogram.counts, k, &mut seeds);
            lloyd(&points, histogram, initial, settings)
        })
        .collect();

    runs.into_iter()
        .min_by(|a, b| a.inertia.total_cmp(&b.inertia))
        .ok_or(ClusterError::NoPixels)
}

/// k-means++ seeding over weighted points.
fn seed_centroids(
    points: &[[f64; 3]],
    weights: &[u64],
    k: usize,
    seeds: &mut SeedStream,
) -> Vec<[f64; 3]> {
    let total_weight: f64 = weights.iter().map(|&w| w as f64).sum();
    let first = pick_weighted(weights.iter().map(|&w| w as f64), total_weight, seeds);

    let mut centroids = Vec::with_capacity(k);
    centroids.push(points[first]);
    let mut closest: Vec<f64> = points.iter().map(|p| distance2(p, &points[first])).collect();

    while centroids.len() < k {
        let scores = || weights.iter().zip(&closest).map(|(&w, &d)| w as f64 * d);
        let total: f64 = scores().sum();
        // Every point already sits on a center; nothing left to spread out.
        let next = if total > 0.0 {
            pick_weighted(scores(), total, seeds)
        } else {
            first
        };
        let center = points[next];
        for (best, p) in closest.iter_mut().zip(points) {
            *best = best.min(distance2(p, &center));
        }
        centroids.push(center);
    }
    centroids
}

/// Index drawn with probability proportional to its score.
fn pick_weighted<I>(scores: I, total: f64, seeds: &mut SeedStream) -> usize
where
    I: Iterator<Item = f64>,
{
    let target = seeds.next_f64() * total;
    let mut acc = 0.0;
    let mut last_positive = 0;
    for (i, score) in scores.enumerate() {
        if score <= 0.0 {
            continue;
        }
        acc += score;
        last_positive = i;
        if acc > target {
            return i;
        }
    }
    last_positive
}

fn lloyd(
    points: &[[f64; 3]],
    histogram: &ColorHistogram,
    mut centroids: Vec<[f64; 3]>,
    settings: &KMeansSettings,
) -> Clustering {
    let mut labels = vec![0usize; points.len()];
    let mut iterations = 0;

    for _ in 0..settings.max_iterations.max(1) {
        iterations += 1;
        assign(points, &centroids, &mut labels);

        let mut sums = vec![[0u64; 3]; centroids.len()];
        let mut members = vec![0u64; centroids.len()];
        for ((color, &count), &label) in histogram.colors.iter().zip(&histogram.counts).zip(&labels)
        {
            for (sum, &channel) in sums[label].iter_mut().zip(color) {
                *sum += count * u64::from(channel);
            }
            members[label] += count;
        }

        let mut shift = 0.0;
        for ((centroid, sum), &n) in centroids.iter_mut().zip(&sums).zip(&members) {
            if n == 0 {
                continue;
            }
            let moved = sum.map(|s| s as f64 / n as f64);
            shift += distance2(centroid, &moved);
            *centroid = moved;
        }
        if shift <= settings.tolerance {
            break;
        }
    }

    assign(points, &centroids, &mut labels);
    let inertia = points
        .iter()
        .zip(&histogram.counts)
        .zip(&labels)
        .map(|((p, &count), &label)| count as f64 * distance2(p, &centroids[label]))
        .sum();

    Clustering {
        centroids,
        labels,
        inertia,
        iterations,
    }
}

fn assign(points: &[[f64; 3]], centroids: &[[f64; 3]], labels: &mut [usize]) {
    labels
        .par_iter_mut()
        .zip(points.par_iter())
        .for_each(|(label, p)| *label = nearest(p, centroids));
}

/// Index of the closest centroid; ties go to the lower index.
fn nearest(point: &[f64; 3], centroids: &[[f64; 3]]) -> usize {
    let mut best = 0;
    let mut best_d = f64::INFINITY;
    for (i, c) in centroids.iter().enumerate() {
        let d = distance2(point, c);
        if d < best_d {
            best = i;
            best_d = d;
        }
    }
    best
}

fn distance2(a: &[f64; 3], b: &[f64; 3]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

/// Reproducible stream of pseudo-random numbers.
///
/// Each draw is the first 8 bytes of `SHA-256(seed ‖ stream ‖ counter)`.
struct SeedStream {
    seed: u64,
    stream: u64,
    counter: u64,
}

impl SeedStream {
    fn new(seed: u64, stream: u64) -> Self {
        Self {
            seed,
            stream,
            counter: 0,
        }
    }

    fn next_u64(&mut self) -> u64 {
        let mut hasher = Sha256::new();
        hasher.update(b"kmeans\0");
        hasher.update(self.seed.to_le_bytes());
        hasher.update(self.stream.to_le_bytes());
        hasher.update(self.counter.to_le_bytes());
        self.counter += 1;

        let digest = hasher.finalize();
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&digest[..8]);
        u64::from_le_bytes(bytes)
    }

    /// Uniform in `[0, 1)`.
    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }
}
