//! Aggregate statistics over reconciled series
//!
//! Scalars reported per run: per-entity mean, cross-entity sum per step and
//! its mean (the "total average power" figure for power families).
//!
//! Descriptive summaries (stddev, percentiles) go through trueno's SIMD
//! vector primitives, as f32; the headline means stay in f64.

use crate::classify::MetricKey;
use crate::error::{Result, SeriesError};
use crate::run::Run;
use serde::Serialize;

/// Arithmetic mean of a series
pub fn mean(series: &[f64]) -> Result<f64> {
    if series.is_empty() {
        return Err(SeriesError::EmptySeries(
            "cannot average a zero-length series".to_string(),
        ));
    }
    Ok(series.iter().sum::<f64>() / series.len() as f64)
}

/// Sum across entities at each step
///
/// All series must share one length, which reconciliation guarantees.
pub fn sum_per_step(series: &[&[f64]]) -> Result<Vec<f64>> {
    let Some(first) = series.first() else {
        return Err(SeriesError::EmptySeries(
            "no series to sum across".to_string(),
        ));
    };

    let len = first.len();
    if let Some((index, other)) = series.iter().enumerate().find(|(_, s)| s.len() != len) {
        return Err(SeriesError::LengthMismatch {
            key: format!("series #{}", index),
            expected: len,
            actual: other.len(),
        });
    }

    Ok((0..len).map(|t| series.iter().map(|s| s[t]).sum::<f64>()).collect())
}

/// Mean over the per-step cross-entity sum
pub fn mean_of_sum(series: &[&[f64]]) -> Result<f64> {
    mean(&sum_per_step(series)?)
}

/// Cross-entity sum per step for `keys` of a run
///
/// Missing keys are an `EmptyIntersection`; unequal lengths name the
/// offending key.
pub fn run_sum_per_step(run: &Run, keys: &[MetricKey]) -> Result<Vec<f64>> {
    let missing: Vec<MetricKey> = keys.iter().filter(|k| !run.contains(k)).copied().collect();
    if !missing.is_empty() {
        return Err(SeriesError::EmptyIntersection { missing });
    }

    let series: Vec<(&MetricKey, &[f64])> = keys
        .iter()
        .filter_map(|k| run.get(k).map(|values| (k, values)))
        .collect();
    if let Some((_, first)) = series.first() {
        let expected = first.len();
        if let Some((key, other)) = series.iter().find(|(_, s)| s.len() != expected) {
            return Err(SeriesError::LengthMismatch {
                key: key.to_string(),
                expected,
                actual: other.len(),
            });
        }
    }

    let slices: Vec<&[f64]> = series.into_iter().map(|(_, s)| s).collect();
    sum_per_step(&slices)
}

/// Descriptive statistics of one series
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesSummary {
    pub samples: usize,
    pub mean: f32,
    pub stddev: f32,
    pub min: f32,
    pub max: f32,
    pub median: f32,
    pub p90: f32,
    pub p99: f32,
}

/// Summarize a series using trueno for the vector statistics
pub fn summarize(series: &[f64]) -> Result<SeriesSummary> {
    if series.is_empty() {
        return Err(SeriesError::EmptySeries(
            "cannot summarize a zero-length series".to_string(),
        ));
    }

    let values: Vec<f32> = series.iter().map(|&v| v as f32).collect();
    let v = trueno::Vector::from_slice(&values);

    let mut sorted = values.clone();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    Ok(SeriesSummary {
        samples: values.len(),
        mean: v.mean().unwrap_or(0.0),
        stddev: v.stddev().unwrap_or(0.0),
        min: v.min().unwrap_or(0.0),
        max: v.max().unwrap_or(0.0),
        median: percentile(&sorted, 50.0),
        p90: percentile(&sorted, 90.0),
        p99: percentile(&sorted, 99.0),
    })
}

/// Linear-interpolated percentile of sorted data
fn percentile(sorted: &[f32], pct: f32) -> f32 {
    match sorted.len() {
        0 => 0.0,
        1 => sorted[0],
        n => {
            let index = (pct / 100.0) * (n - 1) as f32;
            let lower = index.floor() as usize;
            let upper = index.ceil() as usize;
            if lower == upper {
                sorted[lower]
            } else {
                let weight = index - lower as f32;
                sorted[lower] * (1.0 - weight) + sorted[upper] * weight
            }
        }
    }
}
