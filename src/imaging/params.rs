//! Parameter types for segmentation.
//!
//! - [`KRange`]: allowed cluster counts; requests outside are clamped, not rejected.
//! - [`KMeansSettings`]: restarts, iteration cap, convergence tolerance and seed.

use crate::config::SegmentConfig;

/// Inclusive range of allowed cluster counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KRange {
    min: u32,
    max: u32,
}

impl KRange {
    /// Bounds are reordered if given backwards; the lower bound is at least 1.
    pub fn new(min: u32, max: u32) -> Self {
        let (min, max) = if min <= max { (min, max) } else { (max, min) };
        Self {
            min: min.max(1),
            max: max.max(1),
        }
    }

    pub fn clamp(self, k: u32) -> u32 {
        k.clamp(self.min, self.max)
    }

    pub fn min(self) -> u32 {
        self.min
    }

    pub fn max(self) -> u32 {
        self.max
    }
}

impl Default for KRange {
    fn default() -> Self {
        let config = SegmentConfig::default();
        Self::new(config.k_min, config.k_max)
    }
}

/// K-means tuning.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KMeansSettings {
    /// Independent runs with different seeds; the lowest inertia wins.
    pub restarts: u32,
    /// Lloyd iterations per run.
    pub max_iterations: u32,
    /// Summed squared centroid movement at which a run stops early.
    pub tolerance: f64,
    pub seed: u64,
}

impl KMeansSettings {
    pub fn from_config(config: &SegmentConfig) -> Self {
        Self {
            restarts: config.restarts.max(1),
            max_iterations: config.max_iterations.max(1),
            tolerance: config.tolerance.max(0.0),
            seed: config.seed,
        }
    }
}

impl Default for KMeansSettings {
    fn default() -> Self {
        Self::from_config(&SegmentConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn k_is_clamped_into_range() {
        let range = KRange::new(2, 50);
        assert_eq!(range.clamp(0), 2);
        assert_eq!(range.clamp(1), 2);
        assert_eq!(range.clamp(7), 7);
        assert_eq!(range.clamp(50), 50);
        assert_eq!(range.clamp(500), 50);
    }

    #[test]
    fn backwards_bounds_are_reordered() {
        let range = KRange::new(9, 3);
        assert_eq!((range.min(), range.max()), (3, 9));
    }

    #[test]
    fn zero_lower_bound_raised_to_one() {
        assert_eq!(KRange::new(0, 4).clamp(0), 1);
    }

    #[test]
    fn default_range_is_2_to_50() {
        let range = KRange::default();
        assert_eq!((range.min(), range.max()), (2, 50));
    }

    #[test]
    fn settings_from_config_guard_zeroes() {
        let config = SegmentConfig {
            restarts: 0,
            max_iterations: 0,
            tolerance: -1.0,
            ..SegmentConfig::default()
        };
        let settings = KMeansSettings::from_config(&config);
        assert_eq!(settings.restarts, 1);
        assert_eq!(settings.max_iterations, 1);
        assert_eq!(settings.tolerance, 0.0);
    }
}
