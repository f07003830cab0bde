//! Service configuration module.
//!
//! Handles loading, validating, and merging `config.toml`. Stock defaults are
//! serialized to a TOML table and the user file is merged on top of it, so a
//! config file only needs the keys it wants to change.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [scan]
//! root = "~"                    # Directory to scan (default: home directory)
//! max_depth = 8                 # Levels below the root to explore
//! max_folders = 120             # Stop after this many galleries
//! cache_ttl_secs = 300          # How long a scan result stays fresh
//! descend_into_galleries = false
//!
//! [segment]
//! k_min = 2                     # Requested cluster counts are clamped into
//! k_max = 50                    # [k_min, k_max]
//! default_k = 8
//! max_dimension = 512           # Longer edge cap before clustering
//! restarts = 4                  # Independent K-means runs, best one kept
//! max_iterations = 100
//! tolerance = 0.0001
//! seed = 0
//!
//! [results]
//! capacity = 50                 # Segmentation results kept in memory
//!
//! [logging]
//! level = "info"                # Level or EnvFilter directives
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Top-level configuration loaded from `config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServiceConfig {
    /// Gallery discovery settings.
    pub scan: ScanConfig,
    /// Palette segmentation settings.
    pub segment: SegmentConfig,
    /// In-memory result store settings.
    pub results: ResultsConfig,
    /// Log filtering.
    pub logging: LoggingConfig,
}

impl ServiceConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.scan.max_folders == 0 {
            return Err(ConfigError::Validation(
                "scan.max_folders must be at least 1".into(),
            ));
        }
        if self.segment.k_min == 0 {
            return Err(ConfigError::Validation(
                "segment.k_min must be at least 1".into(),
            ));
        }
        if self.segment.k_min > self.segment.k_max {
            return Err(ConfigError::Validation(
                "segment.k_min must not exceed segment.k_max".into(),
            ));
        }
        if self.segment.restarts == 0 || self.segment.max_iterations == 0 {
            return Err(ConfigError::Validation(
                "segment.restarts and segment.max_iterations must be at least 1".into(),
            ));
        }
        if self.segment.tolerance.is_nan() || self.segment.tolerance < 0.0 {
            return Err(ConfigError::Validation(
                "segment.tolerance must be a non-negative number".into(),
            ));
        }
        if self.results.capacity == 0 {
            return Err(ConfigError::Validation(
                "results.capacity must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Gallery discovery settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScanConfig {
    /// Scan root. `~` and `~/...` expand to the home directory.
    /// When absent the home directory itself is used.
    pub root: Option<String>,
    /// Directories at this depth or deeper are not listed.
    pub max_depth: usize,
    /// Maximum number of galleries returned by one scan.
    pub max_folders: usize,
    /// Seconds a scan result is served from cache.
    pub cache_ttl_secs: u64,
    /// Keep exploring below folders that already contain images.
    pub descend_into_galleries: bool,
    /// Replaces the built-in list of system/cache directory names.
    pub skip_dirs: Option<Vec<String>>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            root: None,
            max_depth: 8,
            max_folders: 120,
            cache_ttl_secs: 300,
            descend_into_galleries: false,
            skip_dirs: None,
        }
    }
}

impl ScanConfig {
    /// Resolve the configured root to a concrete directory.
    ///
    /// Falls back to the current directory when no home directory is known.
    pub fn effective_root(&self) -> PathBuf {
        let home = || dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        match self.root.as_deref() {
            None | Some("~") => home(),
            Some(raw) => match raw.strip_prefix("~/") {
                Some(rest) => home().join(rest),
                None => PathBuf::from(raw),
            },
        }
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

/// Palette segmentation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SegmentConfig {
    /// Smallest cluster count a request is clamped to.
    pub k_min: u32,
    /// Largest cluster count a request is clamped to.
    pub k_max: u32,
    /// Cluster count used when the caller does not pass one.
    pub default_k: u32,
    /// Images whose longer edge exceeds this are downscaled first. 0 disables.
    pub max_dimension: u32,
    /// Independent K-means runs; the most compact result wins.
    pub restarts: u32,
    /// Lloyd iterations per run.
    pub max_iterations: u32,
    /// Squared centroid movement below which a run is considered converged.
    pub tolerance: f64,
    /// Seed for centroid initialisation.
    pub seed: u64,
}

impl Default for SegmentConfig {
    fn default() -> Self {
        Self {
            k_min: 2,
            k_max: 50,
            default_k: 8,
            max_dimension: 512,
            restarts: 4,
            max_iterations: 100,
            tolerance: 1e-4,
            seed: 0,
        }
    }
}

/// In-memory segmentation result store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResultsConfig {
    /// Results kept before the oldest one is dropped.
    pub capacity: usize,
}

impl Default for ResultsConfig {
    fn default() -> Self {
        Self { capacity: 50 }
    }
}

/// Log filtering.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// A plain level (`info`, `debug`, ...) or a full `EnvFilter` directive string.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl LoggingConfig {
    fn config_env_filter(&self) -> tracing_subscriber::EnvFilter {
        let directives = match self.level.trim().to_ascii_lowercase().as_str() {
            "" => "info".to_string(),
            "warning" => "warn".to_string(),
            _ => self.level.trim().to_string(),
        };
        tracing_subscriber::EnvFilter::try_new(directives).unwrap_or_else(|_| {
            tracing_subscriber::EnvFilter::default()
                .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into())
        })
    }

    /// Build the effective filter. `RUST_LOG`, when set, is layered on top.
    pub fn env_filter(&self) -> tracing_subscriber::EnvFilter {
        let env_directives = std::env::var("RUST_LOG")
            .ok()
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty());

        match env_directives {
            Some(env_directives) => {
                let combined = format!("{},{env_directives}", self.level.trim());
                tracing_subscriber::EnvFilter::try_new(combined)
                    .or_else(|_| tracing_subscriber::EnvFilter::try_new(env_directives))
                    .unwrap_or_else(|_| self.config_env_filter())
            }
            None => self.config_env_filter(),
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(ServiceConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Merge an optional overlay onto the stock defaults, then deserialize and validate.
pub fn resolve_config(overlay: Option<toml::Value>) -> Result<ServiceConfig, ConfigError> {
    let base = stock_defaults_value();
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: ServiceConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load a config file.
///
/// `None` or a path that does not exist yields the validated stock defaults.
pub fn load_config(path: Option<&Path>) -> Result<ServiceConfig, ConfigError> {
    let overlay = match path {
        Some(path) if path.exists() => {
            let content = fs::read_to_string(path)?;
            Some(toml::from_str::<toml::Value>(&content)?)
        }
        _ => None,
    };
    resolve_config(overlay)
}

/// Returns a fully-commented stock `config.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# photo-segment configuration
# ===========================
# All settings are optional. Values shown below are the defaults.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Gallery discovery
# ---------------------------------------------------------------------------
[scan]
# Directory to scan. "~" expands to the home directory (the default).
# root = "~/Pictures"

# Levels below the root that are explored.
max_depth = 8

# A scan stops as soon as this many galleries were found.
max_folders = 120

# Seconds a scan result is reused before the tree is walked again.
cache_ttl_secs = 300

# Keep exploring inside folders that already contain images.
descend_into_galleries = false

# Replace the built-in list of system/cache directory names to skip.
# skip_dirs = ["node_modules", "cache"]

# ---------------------------------------------------------------------------
# Palette segmentation (K-means)
# ---------------------------------------------------------------------------
[segment]
# Requested cluster counts are clamped into [k_min, k_max].
k_min = 2
k_max = 50
default_k = 8

# Images whose longer edge exceeds this are downscaled first (0 = never).
max_dimension = 512

# Independent K-means runs; the most compact result is kept.
restarts = 4
max_iterations = 100
tolerance = 0.0001

# Same seed + same input = byte-identical output.
seed = 0

# ---------------------------------------------------------------------------
# Result store
# ---------------------------------------------------------------------------
[results]
# Results kept in memory; the oldest is dropped first.
capacity = 50

# ---------------------------------------------------------------------------
# Logging
# ---------------------------------------------------------------------------
[logging]
# "error", "warn", "info", "debug", "trace" or EnvFilter directives.
# RUST_LOG is merged on top.
level = "info"
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_values() {
        let config = ServiceConfig::default();
        assert_eq!(config.scan.max_depth, 8);
        assert_eq!(config.scan.max_folders, 120);
        assert_eq!(config.scan.cache_ttl(), Duration::from_secs(300));
        assert_eq!((config.segment.k_min, config.segment.k_max), (2, 50));
        assert_eq!(config.results.capacity, 50);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn parse_partial_config() {
        let toml = r#"
[scan]
max_depth = 3

[segment]
seed = 42
"#;
        let overlay: toml::Value = toml::from_str(toml).unwrap();
        let config = resolve_config(Some(overlay)).unwrap();
        assert_eq!(config.scan.max_depth, 3);
        assert_eq!(config.segment.seed, 42);
        // Unspecified values keep their defaults
        assert_eq!(config.scan.max_folders, 120);
        assert_eq!(config.segment.k_max, 50);
    }

    #[test]
    fn unknown_keys_rejected() {
        let overlay: toml::Value = toml::from_str("[scan]\nmax_dept = 3\n").unwrap();
        assert!(matches!(
            resolve_config(Some(overlay)),
            Err(ConfigError::Toml(_))
        ));
    }

    #[test]
    fn inverted_k_range_rejected() {
        let overlay: toml::Value = toml::from_str("[segment]\nk_min = 10\nk_max = 3\n").unwrap();
        assert!(matches!(
            resolve_config(Some(overlay)),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn zero_capacity_rejected() {
        let overlay: toml::Value = toml::from_str("[results]\ncapacity = 0\n").unwrap();
        assert!(matches!(
            resolve_config(Some(overlay)),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn load_config_returns_default_when_no_file() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(Some(&tmp.path().join("config.toml"))).unwrap();
        assert_eq!(config.scan.max_folders, 120);

        let config = load_config(None).unwrap();
        assert_eq!(config.segment.default_k, 8);
    }

    #[test]
    fn load_config_reads_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(
            &path,
            r#"
[scan]
root = "/srv/photos"
skip_dirs = ["thumbs"]

[results]
capacity = 5
"#,
        )
        .unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.scan.effective_root(), PathBuf::from("/srv/photos"));
        assert_eq!(config.scan.skip_dirs, Some(vec!["thumbs".to_string()]));
        assert_eq!(config.results.capacity, 5);
    }

    #[test]
    fn tilde_root_expands_to_home() {
        let Some(home) = dirs::home_dir() else {
            return;
        };
        let config = ScanConfig {
            root: Some("~/Pictures".into()),
            ..ScanConfig::default()
        };
        assert_eq!(config.effective_root(), home.join("Pictures"));
        assert_eq!(ScanConfig::default().effective_root(), home);
    }

    #[test]
    fn stock_config_parses_to_defaults() {
        let overlay: toml::Value = toml::from_str(stock_config_toml()).unwrap();
        let config = resolve_config(Some(overlay)).unwrap();
        let defaults = ServiceConfig::default();
        assert_eq!(config.scan.max_depth, defaults.scan.max_depth);
        assert_eq!(config.segment.restarts, defaults.segment.restarts);
        assert_eq!(config.results.capacity, defaults.results.capacity);
    }

    #[test]
    fn merge_toml_overrides_nested_keys() {
        let base: toml::Value = toml::from_str("[a]\nx = 1\ny = 2\n").unwrap();
        let overlay: toml::Value = toml::from_str("[a]\ny = 3\n").unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged["a"]["x"].as_integer(), Some(1));
        assert_eq!(merged["a"]["y"].as_integer(), Some(3));
    }
}
