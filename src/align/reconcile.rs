// Length reconciliation within one run

use crate::classify::{Family, MetricKey};
use crate::error::{Result, SeriesError};
use crate::run::{EntityScope, Run};
use tracing::debug;

/// Series selected for joint analysis
///
/// Keys keep the order they were requested in; duplicates are dropped.
/// `with_elapsed` adds the elapsed-time series to the reconciled set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeriesRequest {
    keys: Vec<MetricKey>,
    with_elapsed: bool,
}

impl SeriesRequest {
    pub fn new<I: IntoIterator<Item = MetricKey>>(keys: I) -> Self {
        let mut request = Self::default();
        for key in keys {
            if !request.keys.contains(&key) {
                request.keys.push(key);
            }
        }
        request
    }

    /// Every key of `families` within `scope` found in any of `runs`
    ///
    /// Grouped by family, then first-seen order across the runs.
    pub fn for_families(runs: &[&Run], families: &[Family], scope: EntityScope) -> Self {
        Self::new(families.iter().flat_map(|&family| {
            runs.iter()
                .flat_map(move |run| run.keys_of(family, scope))
                .collect::<Vec<_>>()
        }))
    }

    pub fn with_elapsed(mut self, with_elapsed: bool) -> Self {
        self.with_elapsed = with_elapsed;
        self
    }

    pub fn keys(&self) -> &[MetricKey] {
        &self.keys
    }

    pub fn includes_elapsed(&self) -> bool {
        self.with_elapsed
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Same request over a different key set
    pub(crate) fn restricted_to(&self, keys: Vec<MetricKey>) -> Self {
        Self::new(keys).with_elapsed(self.with_elapsed)
    }

    /// Requested keys plus elapsed time when asked for
    pub(crate) fn effective_keys(&self) -> Vec<MetricKey> {
        let mut keys = self.keys.clone();
        if self.with_elapsed && !keys.contains(&MetricKey::ELAPSED) {
            keys.push(MetricKey::ELAPSED);
        }
        keys
    }
}

/// Shortest length among the requested series of `run`
///
/// Fails with `EmptyIntersection` when nothing is requested or a requested
/// series is absent.
pub fn common_length(run: &Run, request: &SeriesRequest) -> Result<usize> {
    if request.is_empty() {
        return Err(SeriesError::EmptyIntersection { missing: vec![] });
    }

    let keys = request.effective_keys();
    let missing: Vec<MetricKey> = keys.iter().filter(|k| !run.contains(k)).copied().collect();
    if !missing.is_empty() {
        return Err(SeriesError::EmptyIntersection { missing });
    }

    Ok(keys
        .iter()
        .filter_map(|k| run.get(k).map(<[f64]>::len))
        .min()
        .unwrap_or(0))
}

/// Truncate every requested series to their common length
///
/// Returns a new run holding only the requested series (request order, then
/// elapsed time), all of identical length. Reconciling the result again with
/// the same request yields an identical run.
pub fn reconcile(run: &Run, request: &SeriesRequest) -> Result<Run> {
    let len = common_length(run, request)?;
    let keys = request.effective_keys();

    for key in &keys {
        if let Some(values) = run.get(key) {
            if values.len() > len {
                debug!(
                    "reconcile: truncating {} from {} to {} samples",
                    key,
                    values.len(),
                    len
                );
            }
        }
    }

    Ok(run.project(&keys, len))
}
