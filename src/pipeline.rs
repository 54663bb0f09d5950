//! Single parameterized pipeline: stream(s) in, aligned series and scalars out
//!
//! One run: extract, reconcile the requested families, aggregate, optionally
//! bucket. Two runs: extract both (in either order), synchronize, compare.
//! Everything a display or plotting consumer needs ends up in a serializable
//! [`Report`].

use crate::aggregate::{mean, run_sum_per_step, summarize, SeriesSummary};
use crate::align::{reconcile, synchronize, SeriesRequest};
use crate::bucket::bucket;
use crate::classify::{Family, MetricKey};
use crate::compare::{compare_runs, RunComparison};
use crate::config::Config;
use crate::error::Warning;
use crate::run::{Accumulator, EntityScope, IngestStats, Ingested};
use anyhow::{Context, Result};
use serde::Serialize;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Which series to analyze
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub families: Vec<Family>,
    pub scope: EntityScope,
    /// Also downsample every series into time buckets
    pub buckets: bool,
}

impl Default for Selection {
    fn default() -> Self {
        Self {
            families: Family::METRICS.to_vec(),
            scope: EntityScope::Cores,
            buckets: false,
        }
    }
}

/// One extracted stats file
#[derive(Debug, Clone)]
pub struct Source {
    pub path: PathBuf,
    pub ingested: Ingested,
}

/// One aligned series with its scalars
#[derive(Debug, Clone, Serialize)]
pub struct SeriesReport {
    pub key: MetricKey,
    pub mean: f64,
    pub summary: SeriesSummary,
    pub values: Vec<f64>,
}

/// Cross-core total of one family
#[derive(Debug, Clone, Serialize)]
pub struct TotalReport {
    pub family: Family,
    pub cores: usize,
    /// Mean of `sum_per_step`
    pub mean_of_sum: f64,
    pub sum_per_step: Vec<f64>,
}

/// Bucketed means of one series
#[derive(Debug, Clone, Serialize)]
pub struct BucketReport {
    pub key: MetricKey,
    pub width: f64,
    pub start_times: Vec<f64>,
    pub means: Vec<f64>,
    pub counts: Vec<usize>,
}

/// Analysis of a single run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub source: PathBuf,
    pub elapsed_time: Option<f64>,
    pub steps: usize,
    /// Elapsed-time samples per step, when aligned with time
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_axis: Option<Vec<f64>>,
    pub series: Vec<SeriesReport>,
    pub totals: Vec<TotalReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buckets: Option<Vec<BucketReport>>,
    pub ingest: IngestStats,
    pub warnings: Vec<Warning>,
}

/// Aligned series of two runs plus their comparison
#[derive(Debug, Clone, Serialize)]
pub struct ComparisonReport {
    pub source_a: PathBuf,
    pub source_b: PathBuf,
    /// Elapsed-time samples per shared step of each run, when aligned with time
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_axis_a: Option<Vec<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_axis_b: Option<Vec<f64>>,
    pub series_a: Vec<(MetricKey, Vec<f64>)>,
    pub series_b: Vec<(MetricKey, Vec<f64>)>,
    pub comparison: RunComparison,
    pub ingest_a: IngestStats,
    pub ingest_b: IngestStats,
    /// Extraction warnings of both runs, prefixed by run
    pub warnings: Vec<String>,
}

/// Pipeline output
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum Report {
    Run(RunReport),
    Comparison(ComparisonReport),
}

/// Extraction and analysis driven by one [`Config`]
#[derive(Debug)]
pub struct Pipeline {
    config: Config,
    accumulator: Accumulator,
}

impl Pipeline {
    pub fn new(config: Config) -> Result<Self> {
        config
            .validate()
            .map_err(|e| anyhow::anyhow!("Invalid configuration: {}", e))?;
        let accumulator =
            Accumulator::new(&config.extract).context("Failed to build stat line patterns")?;
        Ok(Self {
            config,
            accumulator,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Read and classify one stats file
    ///
    /// The file is drained and closed before this returns.
    pub fn ingest_path<P: AsRef<Path>>(&self, path: P) -> Result<Source> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("Failed to open stats file: {}", path.display()))?;
        let ingested = self
            .accumulator
            .accumulate(BufReader::new(file))
            .with_context(|| format!("Failed to read stats file: {}", path.display()))?;

        info!(
            "{}: {} series from {} lines ({} malformed)",
            path.display(),
            ingested.run.len(),
            ingested.stats.lines,
            ingested.stats.malformed
        );
        Ok(Source {
            path: path.to_path_buf(),
            ingested,
        })
    }

    /// Classify an in-memory stats dump
    pub fn ingest_str(&self, label: &str, text: &str) -> Source {
        Source {
            path: PathBuf::from(label),
            ingested: self.accumulator.accumulate_str(text),
        }
    }

    /// Reconcile, aggregate and optionally bucket the selected series of one run
    pub fn analyze(&self, source: &Source, selection: &Selection) -> Result<RunReport> {
        let run = &source.ingested.run;
        let request = SeriesRequest::for_families(&[run], &selection.families, selection.scope)
            .with_elapsed(self.config.analysis.align_with_time);
        let reconciled = reconcile(run, &request)
            .with_context(|| format!("Cannot align series of {}", source.path.display()))?;
        let steps = reconciled.reconciled_len().unwrap_or(0);

        let mut series = Vec::with_capacity(request.keys().len());
        for key in request.keys() {
            let values = reconciled.get(key).unwrap_or_default();
            series.push(SeriesReport {
                key: *key,
                mean: mean(values).with_context(|| format!("Cannot average {}", key))?,
                summary: summarize(values)?,
                values: values.to_vec(),
            });
        }

        let mut totals = Vec::new();
        for &family in selection.families.iter().filter(|f| f.is_power()) {
            let cores = reconciled.keys_of(family, EntityScope::Cores);
            if cores.is_empty() {
                continue;
            }
            let sum_per_step = run_sum_per_step(&reconciled, &cores)?;
            totals.push(TotalReport {
                family,
                cores: cores.len(),
                mean_of_sum: mean(&sum_per_step)
                    .with_context(|| format!("Cannot total {}", family))?,
                sum_per_step,
            });
        }

        let buckets = if selection.buckets {
            Some(self.bucket_series(source, &series)?)
        } else {
            None
        };

        Ok(RunReport {
            source: source.path.clone(),
            elapsed_time: run.elapsed_time(),
            steps,
            time_axis: reconciled.get(&MetricKey::ELAPSED).map(<[f64]>::to_vec),
            series,
            totals,
            buckets,
            ingest: source.ingested.stats.clone(),
            warnings: source.ingested.warnings.clone(),
        })
    }

    fn bucket_series(&self, source: &Source, series: &[SeriesReport]) -> Result<Vec<BucketReport>> {
        let elapsed = source.ingested.run.elapsed_time().with_context(|| {
            format!(
                "No {} marker in {}; cannot bucket by time",
                self.config.extract.time_marker,
                source.path.display()
            )
        })?;
        let width = self.config.analysis.bucket_width;

        series
            .iter()
            .map(|s| {
                let buckets = bucket(&s.values, elapsed, width)?;
                if buckets.is_empty() {
                    warn!(
                        "{}: bucket width {} exceeds elapsed time {}; no buckets",
                        s.key, width, elapsed
                    );
                }
                Ok(BucketReport {
                    key: s.key,
                    width,
                    start_times: buckets.start_times(),
                    means: buckets.means().to_vec(),
                    counts: buckets.counts().to_vec(),
                })
            })
            .collect()
    }

    /// Synchronize two runs over the selected families and compare them
    pub fn compare(&self, a: &Source, b: &Source, selection: &Selection) -> Result<ComparisonReport> {
        let (run_a, run_b) = (&a.ingested.run, &b.ingested.run);
        let request =
            SeriesRequest::for_families(&[run_a, run_b], &selection.families, selection.scope)
                .with_elapsed(self.config.analysis.align_with_time);

        let sync = synchronize(run_a, run_b, &request).with_context(|| {
            format!(
                "Cannot synchronize {} with {}",
                a.path.display(),
                b.path.display()
            )
        })?;
        let comparison = compare_runs(&sync, self.config.analysis.significance_level)?;

        let collect = |run: &crate::run::Run| -> Vec<(MetricKey, Vec<f64>)> {
            sync.keys
                .iter()
                .filter_map(|k| run.get(k).map(|v| (*k, v.to_vec())))
                .collect()
        };

        let mut warnings = Vec::new();
        for (label, source) in [("run A", a), ("run B", b)] {
            warnings.extend(
                source
                    .ingested
                    .warnings
                    .iter()
                    .map(|w| format!("{}: {}", label, w)),
            );
        }

        Ok(ComparisonReport {
            source_a: a.path.clone(),
            source_b: b.path.clone(),
            time_axis_a: sync.a.get(&MetricKey::ELAPSED).map(<[f64]>::to_vec),
            time_axis_b: sync.b.get(&MetricKey::ELAPSED).map(<[f64]>::to_vec),
            series_a: collect(&sync.a),
            series_b: collect(&sync.b),
            comparison,
            ingest_a: a.ingested.stats.clone(),
            ingest_b: b.ingested.stats.clone(),
            warnings,
        })
    }
}
