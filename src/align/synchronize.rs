// Cross-run synchronization (e.g. DVFS enabled vs disabled)

use crate::align::reconcile::{reconcile, SeriesRequest};
use crate::classify::MetricKey;
use crate::error::{Result, RunSide, SeriesError, Warning};
use crate::run::Run;
use tracing::{debug, warn};

/// Two runs truncated to a shared step domain
#[derive(Debug, Clone, PartialEq)]
pub struct Synchronized {
    /// First run, holding only `keys` (and elapsed time if requested)
    pub a: Run,
    /// Second run, same keys and length as `a`
    pub b: Run,
    /// Shared number of steps
    pub steps: usize,
    /// Requested keys present in both runs, in request order
    pub keys: Vec<MetricKey>,
    /// Requested keys left out because a run lacked them
    pub warnings: Vec<Warning>,
}

/// Reconcile both runs over their common keys and truncate to the shorter
///
/// Keys present in only one run are skipped with a `SkippedEntity` warning.
/// Fails with `NoComparableData` when no requested key is in both runs, when
/// elapsed time is requested but a run has none, or the shared length is zero.
pub fn synchronize(run_a: &Run, run_b: &Run, request: &SeriesRequest) -> Result<Synchronized> {
    let mut common = Vec::new();
    let mut warnings = Vec::new();

    for key in request.keys() {
        let present_in = match (run_a.contains(key), run_b.contains(key)) {
            (true, true) => {
                common.push(*key);
                continue;
            }
            (true, false) => Some(RunSide::A),
            (false, true) => Some(RunSide::B),
            (false, false) => None,
        };
        let warning = Warning::SkippedEntity {
            key: *key,
            present_in,
        };
        warn!("{}", warning);
        warnings.push(warning);
    }

    if common.is_empty() {
        return Err(SeriesError::NoComparableData(
            "no requested series is present in both runs".to_string(),
        ));
    }

    if request.includes_elapsed() {
        let missing: Vec<RunSide> = [(RunSide::A, run_a), (RunSide::B, run_b)]
            .into_iter()
            .filter(|(_, run)| !run.contains(&MetricKey::ELAPSED))
            .map(|(side, _)| side)
            .collect();
        if !missing.is_empty() {
            let sides: Vec<String> = missing.iter().map(ToString::to_string).collect();
            return Err(SeriesError::NoComparableData(format!(
                "no elapsed-time samples in {}; align without time (--no-time-axis) to compare",
                sides.join(" and ")
            )));
        }
    }

    let request = request.restricted_to(common.clone());
    let reconciled_a = reconcile(run_a, &request)?;
    let reconciled_b = reconcile(run_b, &request)?;
    let len_a = reconciled_a.reconciled_len().unwrap_or(0);
    let len_b = reconciled_b.reconciled_len().unwrap_or(0);

    let steps = len_a.min(len_b);
    if steps == 0 {
        return Err(SeriesError::NoComparableData(format!(
            "common length is zero (run A: {}, run B: {})",
            len_a, len_b
        )));
    }
    debug!(
        "synchronize: {} series, run A {} steps, run B {} steps, shared {}",
        common.len(),
        len_a,
        len_b,
        steps
    );

    let keys = request.effective_keys();
    Ok(Synchronized {
        a: reconciled_a.project(&keys, steps),
        b: reconciled_b.project(&keys, steps),
        steps,
        keys: common,
        warnings,
    })
}
