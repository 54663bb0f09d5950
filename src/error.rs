//! Error and warning kinds for stats extraction and alignment
//!
//! Two tiers, mirroring how anomalies are handled:
//! - [`SeriesError`]: a requested computation is meaningless (no common
//!   series, no common entities, empty input). Returned as `Err`.
//! - [`Warning`]: a local anomaly that was recovered from (a dropped line, an
//!   entity present in only one run). Returned alongside the result.

use crate::classify::MetricKey;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Errors raised by the extraction and alignment engine
#[derive(Error, Debug)]
pub enum SeriesError {
    #[error("empty intersection: {}", describe_missing(.missing))]
    EmptyIntersection { missing: Vec<MetricKey> },

    #[error("no comparable data: {0}")]
    NoComparableData(String),

    #[error("empty series: {0}")]
    EmptySeries(String),

    #[error("length mismatch: series {key} has {actual} samples, expected {expected}")]
    LengthMismatch {
        key: String,
        expected: usize,
        actual: usize,
    },

    #[error("invalid bucket width {width}: {reason}")]
    InvalidBucketWidth { width: f64, reason: &'static str },

    #[error("invalid elapsed time {0}: must be finite and non-negative")]
    InvalidElapsedTime(f64),

    #[error("insufficient samples: need at least {required}, got {actual}")]
    InsufficientSamples { required: usize, actual: usize },

    #[error("statistical test failed: {0}")]
    Statistics(String),

    #[error("invalid stat pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("failed to read stats stream: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SeriesError>;

fn describe_missing(missing: &[MetricKey]) -> String {
    if missing.is_empty() {
        return "no series requested".to_string();
    }
    let names: Vec<String> = missing.iter().map(|k| k.to_string()).collect();
    format!("series not present in run: {}", names.join(", "))
}

/// Which of two synchronized runs carried a series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunSide {
    A,
    B,
}

impl fmt::Display for RunSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunSide::A => write!(f, "run A"),
            RunSide::B => write!(f, "run B"),
        }
    }
}

/// Recoverable anomaly observed while building or aligning runs
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Warning {
    /// A stat line named a known family but its value did not parse
    MalformedSample {
        line_number: usize,
        stat: String,
        reason: String,
    },

    /// A requested series exists in only one run (or neither) and was left out
    SkippedEntity {
        key: MetricKey,
        present_in: Option<RunSide>,
    },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::MalformedSample {
                line_number,
                stat,
                reason,
            } => write!(f, "line {}: malformed sample for {}: {}", line_number, stat, reason),
            Warning::SkippedEntity {
                key,
                present_in: Some(side),
            } => write!(f, "skipped {}: only present in {}", key, side),
            Warning::SkippedEntity {
                key,
                present_in: None,
            } => write!(f, "skipped {}: present in neither run", key),
        }
    }
}
