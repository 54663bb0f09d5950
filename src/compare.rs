// Cross-run comparison of synchronized series
//
// Compares two runs of the same workload under different configurations
// (typically DVFS enabled vs disabled). Per common series: mean in each run,
// absolute and relative delta, and a Welch t-test on the step samples.
// Per power family: total average power (mean of the cross-core sum).
//
// Welch's variant is used because the two configurations have no reason to
// share a variance. The t-test comes from aprender, like the rest of the
// hypothesis testing in this codebase.

use crate::aggregate::{mean, run_sum_per_step};
use crate::align::Synchronized;
use crate::classify::{Family, MetricKey};
use crate::error::{Result, SeriesError, Warning};
use serde::Serialize;
use tracing::debug;

/// Outcome of a Welch t-test between two sample sets
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WelchTest {
    pub statistic: f32,
    /// Two-tailed p-value
    pub pvalue: f32,
    /// Degrees of freedom
    pub df: f32,
    /// `pvalue < significance_level`
    pub significant: bool,
}

/// Comparison of one series between runs
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeyComparison {
    pub key: MetricKey,
    pub mean_a: f64,
    pub mean_b: f64,
    /// `mean_b - mean_a`
    pub delta: f64,
    /// `delta / mean_a`, absent when `mean_a` is zero
    pub relative_delta: Option<f64>,
    /// Absent when the test could not be computed (too few or constant samples)
    pub test: Option<WelchTest>,
}

/// Total average of a power family in each run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FamilyTotal {
    pub family: Family,
    pub cores: usize,
    pub total_a: f64,
    pub total_b: f64,
}

/// Full comparison of two synchronized runs
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunComparison {
    pub steps: usize,
    pub significance_level: f64,
    pub keys: Vec<KeyComparison>,
    pub totals: Vec<FamilyTotal>,
    pub warnings: Vec<Warning>,
}

/// Welch's independent t-test between `a` and `b`
pub fn welch_test(a: &[f64], b: &[f64], significance_level: f64) -> Result<WelchTest> {
    let required = 2;
    let actual = a.len().min(b.len());
    if actual < required {
        return Err(SeriesError::InsufficientSamples { required, actual });
    }

    let a: Vec<f32> = a.iter().map(|&v| v as f32).collect();
    let b: Vec<f32> = b.iter().map(|&v| v as f32).collect();
    let result = aprender::stats::hypothesis::ttest_ind(&a, &b, false)
        .map_err(|e| SeriesError::Statistics(e.to_string()))?;

    if !result.pvalue.is_finite() {
        return Err(SeriesError::Statistics(
            "t-test is undefined for constant samples".to_string(),
        ));
    }

    Ok(WelchTest {
        statistic: result.statistic,
        pvalue: result.pvalue,
        df: result.df,
        significant: (result.pvalue as f64) < significance_level,
    })
}

/// Compare every common series of `sync` and total the power families
pub fn compare_runs(sync: &Synchronized, significance_level: f64) -> Result<RunComparison> {
    let mut keys = Vec::with_capacity(sync.keys.len());

    for key in &sync.keys {
        let (Some(a), Some(b)) = (sync.a.get(key), sync.b.get(key)) else {
            continue;
        };
        let mean_a = mean(a)?;
        let mean_b = mean(b)?;
        let delta = mean_b - mean_a;

        let test = match welch_test(a, b, significance_level) {
            Ok(test) => Some(test),
            Err(e) => {
                debug!("no t-test for {}: {}", key, e);
                None
            }
        };

        keys.push(KeyComparison {
            key: *key,
            mean_a,
            mean_b,
            delta,
            relative_delta: (mean_a != 0.0).then(|| delta / mean_a),
            test,
        });
    }

    let mut totals = Vec::new();
    for family in Family::METRICS.into_iter().filter(Family::is_power) {
        let cores: Vec<MetricKey> = sync
            .keys
            .iter()
            .filter(|k| k.family == family && k.entity.is_some_and(|e| !e.is_thread()))
            .copied()
            .collect();
        if cores.is_empty() {
            continue;
        }
        totals.push(FamilyTotal {
            family,
            cores: cores.len(),
            total_a: mean(&run_sum_per_step(&sync.a, &cores)?)?,
            total_b: mean(&run_sum_per_step(&sync.b, &cores)?)?,
        });
    }

    Ok(RunComparison {
        steps: sync.steps,
        significance_level,
        keys,
        totals,
        warnings: sync.warnings.clone(),
    })
}
