//! Time-bucket aggregation
//!
//! Downsamples one series to fixed-width time buckets. Individual samples
//! carry no timestamp, so samples are spread proportionally over the run's
//! elapsed time: sample `i` of `m` lands in bucket `floor(i * count / m)`.
//!
//! A bucket that receives no sample reports a mean of 0; its sample count
//! (also exposed) is what distinguishes "no data" from "zero".

use crate::error::{Result, SeriesError};
use serde::Serialize;

/// Upper bound on buckets per series, guards against absurd widths
pub const MAX_BUCKETS: usize = 1 << 24;

/// Bucketed means of one series
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Buckets {
    width: f64,
    means: Vec<f64>,
    counts: Vec<usize>,
}

impl Buckets {
    /// Bucket width in seconds
    pub fn width(&self) -> f64 {
        self.width
    }

    /// Mean of each bucket (0 for empty buckets)
    pub fn means(&self) -> &[f64] {
        &self.means
    }

    /// Samples assigned to each bucket
    pub fn counts(&self) -> &[usize] {
        &self.counts
    }

    pub fn len(&self) -> usize {
        self.means.len()
    }

    pub fn is_empty(&self) -> bool {
        self.means.is_empty()
    }

    /// Start offset of each bucket (`i * width`)
    pub fn start_times(&self) -> Vec<f64> {
        (0..self.means.len())
            .map(|i| i as f64 * self.width)
            .collect()
    }

    /// Samples assigned across all buckets
    pub fn total_samples(&self) -> usize {
        self.counts.iter().sum()
    }
}

/// Number of whole buckets of `width` in `total_elapsed_time`
pub fn bucket_count(total_elapsed_time: f64, width: f64) -> Result<usize> {
    if !width.is_finite() || width <= 0.0 {
        return Err(SeriesError::InvalidBucketWidth {
            width,
            reason: "must be finite and positive",
        });
    }
    if !total_elapsed_time.is_finite() || total_elapsed_time < 0.0 {
        return Err(SeriesError::InvalidElapsedTime(total_elapsed_time));
    }

    let count = (total_elapsed_time / width).floor();
    if count > MAX_BUCKETS as f64 {
        return Err(SeriesError::InvalidBucketWidth {
            width,
            reason: "too narrow for the elapsed time",
        });
    }
    Ok(count as usize)
}

/// Partition `series` into buckets of `width` over `total_elapsed_time`
///
/// Yields `floor(total_elapsed_time / width)` buckets; zero buckets (width
/// wider than the run) is an empty result, not an error.
///
/// # Example
/// ```
/// use simseries::bucket::bucket;
///
/// let buckets = bucket(&[1.0, 2.0, 3.0, 4.0], 2.0, 1.0).unwrap();
/// assert_eq!(buckets.means(), &[1.5, 3.5]);
/// assert_eq!(buckets.counts(), &[2, 2]);
/// ```
pub fn bucket(series: &[f64], total_elapsed_time: f64, width: f64) -> Result<Buckets> {
    let count = bucket_count(total_elapsed_time, width)?;
    let mut sums = vec![0.0; count];
    let mut counts = vec![0usize; count];

    if count > 0 {
        let m = series.len() as u128;
        for (i, &value) in series.iter().enumerate() {
            // Integer arithmetic keeps the assignment exact for large runs
            let slot = (i as u128 * count as u128 / m) as usize;
            sums[slot] += value;
            counts[slot] += 1;
        }
    }

    let means = sums
        .iter()
        .zip(&counts)
        .map(|(&sum, &n)| if n == 0 { 0.0 } else { sum / n as f64 })
        .collect();

    Ok(Buckets {
        width,
        means,
        counts,
    })
}
