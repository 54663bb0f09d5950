//! Configuration for extraction and analysis
//!
//! Loaded from TOML; every field has a default matching gem5's stock naming,
//! so an empty file (or no file) is a valid configuration.
//!
//! # Example TOML
//! ```toml
//! [extract]
//! cluster_prefix = "system.cpu_cluster.cpus"
//! thread_segment = "commitStats"
//! bare_cluster_core = 0
//! max_cores = 4
//!
//! [analysis]
//! bucket_width = 0.001
//! significance_level = 0.05
//! align_with_time = true
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub extract: ExtractConfig,
    pub analysis: AnalysisConfig,
}

/// How stat lines are recognized
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    /// Stat-name prefix directly followed by the core index
    #[serde(default = "default_cluster_prefix")]
    pub cluster_prefix: String,

    /// Path segment directly followed by the thread index
    #[serde(default = "default_thread_segment")]
    pub thread_segment: String,

    /// Stat name of the elapsed simulated time marker
    #[serde(default = "default_time_marker")]
    pub time_marker: String,

    /// Core to attribute index-less stats to (single-core clusters)
    ///
    /// When unset, `cpus.power_model...` lines are ignored.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bare_cluster_core: Option<u32>,

    /// Ignore cores with index >= this value
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_cores: Option<u32>,

    /// Ignore threads with index >= this value
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_threads_per_core: Option<u32>,
}

fn default_cluster_prefix() -> String {
    "system.cpu_cluster.cpus".to_string()
}

fn default_thread_segment() -> String {
    "commitStats".to_string()
}

fn default_time_marker() -> String {
    "simSeconds".to_string()
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            cluster_prefix: default_cluster_prefix(),
            thread_segment: default_thread_segment(),
            time_marker: default_time_marker(),
            bare_cluster_core: None,
            max_cores: None,
            max_threads_per_core: None,
        }
    }
}

/// How extracted series are aligned and aggregated
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Time-bucket width in simulated seconds (default: 1 ms)
    #[serde(default = "default_bucket_width")]
    pub bucket_width: f64,

    /// Alpha for the Welch t-test in run comparisons
    #[serde(default = "default_significance_level")]
    pub significance_level: f64,

    /// Include the elapsed-time series in length reconciliation
    #[serde(default = "default_align_with_time")]
    pub align_with_time: bool,
}

fn default_bucket_width() -> f64 {
    0.001
}

fn default_significance_level() -> f64 {
    0.05
}

fn default_align_with_time() -> bool {
    true
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            bucket_width: default_bucket_width(),
            significance_level: default_significance_level(),
            align_with_time: default_align_with_time(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_toml<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).with_context(|| {
            format!("Failed to read config file: {}", path.as_ref().display())
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(content).context("Failed to parse TOML configuration")?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.extract.cluster_prefix.trim().is_empty() {
            return Err("extract.cluster_prefix must not be empty".to_string());
        }

        if self.extract.thread_segment.trim().is_empty() {
            return Err("extract.thread_segment must not be empty".to_string());
        }

        if self.extract.time_marker.split_whitespace().count() != 1 {
            return Err(format!(
                "extract.time_marker must be a single token, got '{}'",
                self.extract.time_marker
            ));
        }

        if !(self.analysis.bucket_width.is_finite() && self.analysis.bucket_width > 0.0) {
            return Err(format!(
                "analysis.bucket_width must be positive, got {}",
                self.analysis.bucket_width
            ));
        }

        if !(0.0..=1.0).contains(&self.analysis.significance_level) {
            return Err(format!(
                "analysis.significance_level must be in [0, 1], got {}",
                self.analysis.significance_level
            ));
        }

        Ok(())
    }
}
