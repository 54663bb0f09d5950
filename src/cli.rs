//! CLI argument parsing for simseries

use crate::classify::Family;
use crate::config::Config;
use crate::output::Format;
use crate::pipeline::Selection;
use crate::run::EntityScope;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Output format for reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable summary (default)
    Text,
    /// JSON format for machine parsing
    Json,
    /// CSV format, one row per aligned step
    Csv,
}

impl From<OutputFormat> for Format {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Text => Format::Text,
            OutputFormat::Json => Format::Json,
            OutputFormat::Csv => Format::Csv,
        }
    }
}

/// Metric family selectable on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MetricArg {
    Ipc,
    DynamicPower,
    StaticPower,
}

impl From<MetricArg> for Family {
    fn from(metric: MetricArg) -> Self {
        match metric {
            MetricArg::Ipc => Family::Ipc,
            MetricArg::DynamicPower => Family::DynamicPower,
            MetricArg::StaticPower => Family::StaticPower,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "simseries")]
#[command(version)]
#[command(
    about = "Extract, align and compare per-core time series from gem5 statistics dumps",
    long_about = None
)]
pub struct Cli {
    /// gem5 stats.txt to analyze (run A when comparing)
    #[arg(value_name = "STATS")]
    pub stats: PathBuf,

    /// Second stats file to compare against (run B)
    #[arg(long = "compare", value_name = "STATS_B")]
    pub compare: Option<PathBuf>,

    /// Metric families to analyze (repeatable, default: all)
    #[arg(short = 'm', long = "metric", value_enum, value_name = "FAMILY")]
    pub metrics: Vec<MetricArg>,

    /// Include per-thread IPC series alongside per-core series
    #[arg(long = "threads")]
    pub threads: bool,

    /// Analyze per-thread IPC series only, reconciled apart from the cores
    #[arg(long = "threads-only", conflicts_with = "threads")]
    pub threads_only: bool,

    /// Emit time-bucketed means for every series
    #[arg(long = "buckets")]
    pub buckets: bool,

    /// Bucket width in seconds (overrides config)
    #[arg(long = "bucket-width", value_name = "SECONDS")]
    pub bucket_width: Option<f64>,

    /// Significance level for the run comparison t-tests (overrides config)
    #[arg(long = "significance", value_name = "ALPHA")]
    pub significance: Option<f64>,

    /// Do not align series with the elapsed-time samples
    #[arg(long = "no-time-axis")]
    pub no_time_axis: bool,

    /// Output format
    #[arg(long = "format", value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// TOML configuration file ([extract] and [analysis] sections)
    #[arg(long = "config", value_name = "TOML")]
    pub config: Option<PathBuf>,

    /// Enable debug tracing output to stderr
    #[arg(long = "debug")]
    pub debug: bool,
}

impl Cli {
    /// Selected families, scope and bucketing
    pub fn selection(&self) -> Selection {
        let mut selection = Selection::default();
        if !self.metrics.is_empty() {
            selection.families = Vec::new();
            for &metric in &self.metrics {
                let family = Family::from(metric);
                if !selection.families.contains(&family) {
                    selection.families.push(family);
                }
            }
        }
        if self.threads {
            selection.scope = EntityScope::All;
        } else if self.threads_only {
            selection.scope = EntityScope::Threads;
        }
        selection.buckets = self.buckets;
        selection
    }

    /// Apply command-line overrides on top of a loaded configuration
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(width) = self.bucket_width {
            config.analysis.bucket_width = width;
        }
        if let Some(alpha) = self.significance {
            config.analysis.significance_level = alpha;
        }
        if self.no_time_axis {
            config.analysis.align_with_time = false;
        }
    }
}
