//! Runs: per-(family, entity) series built from one stats stream
//!
//! A [`Run`] owns every series extracted from one stream, in first-seen
//! order, together with the length it was reconciled to (if any). The i-th
//! element of a series is the i-th occurrence of its stat in the stream; that
//! is not the same epoch across families until the run has been reconciled.

use crate::classify::{Classification, EntityPath, Family, LineClassifier, MetricKey};
use crate::config::ExtractConfig;
use crate::error::{Result, Warning};
use serde::Serialize;
use std::collections::HashMap;
use std::io::BufRead;
use tracing::{debug, warn};

/// Which entities of a family to select
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EntityScope {
    /// Per-core series only
    #[default]
    Cores,
    /// Per-thread series only
    Threads,
    /// Both
    All,
}

impl EntityScope {
    fn admits(&self, entity: Option<EntityPath>) -> bool {
        match (self, entity) {
            (_, None) => false,
            (EntityScope::Cores, Some(e)) => !e.is_thread(),
            (EntityScope::Threads, Some(e)) => e.is_thread(),
            (EntityScope::All, Some(_)) => true,
        }
    }
}

/// One ordered series of samples
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    pub key: MetricKey,
    pub values: Vec<f64>,
}

/// Mapping from metric key to series, produced by one extraction pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Run {
    series: Vec<TimeSeries>,
    index: HashMap<MetricKey, usize>,
    reconciled_len: Option<usize>,
}

impl Run {
    /// Empty run
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a run from explicit series (first occurrence of a key wins)
    pub fn from_series<I>(series: I) -> Self
    where
        I: IntoIterator<Item = (MetricKey, Vec<f64>)>,
    {
        let mut run = Self::new();
        for (key, values) in series {
            if !run.index.contains_key(&key) {
                run.index.insert(key, run.series.len());
                run.series.push(TimeSeries { key, values });
            }
        }
        run
    }

    fn push(&mut self, key: MetricKey, value: f64) {
        let slot = match self.index.get(&key) {
            Some(&slot) => slot,
            None => {
                self.index.insert(key, self.series.len());
                self.series.push(TimeSeries {
                    key,
                    values: Vec::new(),
                });
                self.series.len() - 1
            }
        };
        self.series[slot].values.push(value);
    }

    /// Number of series in the run
    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    pub fn contains(&self, key: &MetricKey) -> bool {
        self.index.contains_key(key)
    }

    /// Samples of one series
    pub fn get(&self, key: &MetricKey) -> Option<&[f64]> {
        self.index
            .get(key)
            .map(|&slot| self.series[slot].values.as_slice())
    }

    /// Series in first-seen order
    pub fn iter(&self) -> impl Iterator<Item = &TimeSeries> {
        self.series.iter()
    }

    /// Keys in first-seen order
    pub fn keys(&self) -> impl Iterator<Item = MetricKey> + '_ {
        self.series.iter().map(|s| s.key)
    }

    /// Keys of one family restricted to a scope, in first-seen order
    pub fn keys_of(&self, family: Family, scope: EntityScope) -> Vec<MetricKey> {
        self.keys()
            .filter(|k| k.family == family && scope.admits(k.entity))
            .collect()
    }

    /// Run-level elapsed time: the first elapsed-time sample
    pub fn elapsed_time(&self) -> Option<f64> {
        self.get(&MetricKey::ELAPSED)
            .and_then(|values| values.first().copied())
    }

    /// Common length this run was reconciled to, if it was
    pub fn reconciled_len(&self) -> Option<usize> {
        self.reconciled_len
    }

    /// New run holding `keys` (in that order), each truncated to `len`
    ///
    /// Callers guarantee every key is present and at least `len` long.
    pub(crate) fn project(&self, keys: &[MetricKey], len: usize) -> Run {
        let mut run = Run::from_series(keys.iter().filter_map(|key| {
            self.get(key)
                .map(|values| (*key, values[..len.min(values.len())].to_vec()))
        }));
        run.reconciled_len = Some(len);
        run
    }
}

/// Line counts from one extraction pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestStats {
    /// Lines read
    pub lines: usize,
    /// Elapsed-time samples recorded
    pub time_samples: usize,
    /// Metric samples recorded
    pub metric_samples: usize,
    /// Metric samples dropped by the configured entity limits
    pub filtered: usize,
    /// Lines dropped for unusable values
    pub malformed: usize,
    /// Lines with no recognized stat
    pub unrecognized: usize,
}

/// Result of consuming one stats stream
#[derive(Debug, Clone, Default)]
pub struct Ingested {
    pub run: Run,
    pub warnings: Vec<Warning>,
    pub stats: IngestStats,
}

/// Feeds a stream through the classifier into a [`Run`]
#[derive(Debug)]
pub struct Accumulator {
    classifier: LineClassifier,
    max_cores: Option<u32>,
    max_threads_per_core: Option<u32>,
}

impl Accumulator {
    pub fn new(config: &ExtractConfig) -> Result<Self> {
        Ok(Self {
            classifier: LineClassifier::new(config)?,
            max_cores: config.max_cores,
            max_threads_per_core: config.max_threads_per_core,
        })
    }

    pub fn classifier(&self) -> &LineClassifier {
        &self.classifier
    }

    /// Consume a buffered reader front to back
    pub fn accumulate<R: BufRead>(&self, reader: R) -> Result<Ingested> {
        let mut builder = RunBuilder::new(self);
        for (i, line) in reader.lines().enumerate() {
            let line = line?;
            builder.feed(i + 1, &line);
        }
        Ok(builder.finish())
    }

    /// Consume an in-memory stats dump
    pub fn accumulate_str(&self, text: &str) -> Ingested {
        let mut builder = RunBuilder::new(self);
        for (i, line) in text.lines().enumerate() {
            builder.feed(i + 1, line);
        }
        builder.finish()
    }

    fn admits(&self, entity: &EntityPath) -> bool {
        if self.max_cores.is_some_and(|max| entity.core >= max) {
            return false;
        }
        match (entity.thread, self.max_threads_per_core) {
            (Some(thread), Some(max)) => thread < max,
            _ => true,
        }
    }
}

struct RunBuilder<'a> {
    accumulator: &'a Accumulator,
    ingested: Ingested,
}

impl<'a> RunBuilder<'a> {
    fn new(accumulator: &'a Accumulator) -> Self {
        Self {
            accumulator,
            ingested: Ingested::default(),
        }
    }

    fn feed(&mut self, line_number: usize, line: &str) {
        let stats = &mut self.ingested.stats;
        stats.lines += 1;

        match self.accumulator.classifier.classify(line) {
            Ok(Classification::TimeSample(value)) => {
                stats.time_samples += 1;
                self.ingested.run.push(MetricKey::ELAPSED, value);
            }
            Ok(Classification::MetricSample {
                family,
                entity,
                value,
            }) => {
                if self.accumulator.admits(&entity) {
                    stats.metric_samples += 1;
                    self.ingested.run.push(MetricKey::new(family, entity), value);
                } else {
                    stats.filtered += 1;
                }
            }
            Ok(Classification::Unrecognized) => {
                stats.unrecognized += 1;
            }
            Err(malformed) => {
                stats.malformed += 1;
                warn!(
                    "line {}: dropping malformed sample for {}: {}",
                    line_number, malformed.stat, malformed.reason
                );
                self.ingested.warnings.push(Warning::MalformedSample {
                    line_number,
                    stat: malformed.stat,
                    reason: malformed.reason,
                });
            }
        }
    }

    fn finish(self) -> Ingested {
        let ingested = self.ingested;
        debug!(
            "ingested {} lines: {} series, {} metric samples, {} time samples, {} malformed",
            ingested.stats.lines,
            ingested.run.len(),
            ingested.stats.metric_samples,
            ingested.stats.time_samples,
            ingested.stats.malformed
        );
        ingested
    }
}
