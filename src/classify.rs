//! Line classifier for simulator statistics dumps
//!
//! A stats dump is a flat stream of `name value [# comment]` lines. Each line
//! is classified as a time sample (`simSeconds`), a metric sample for one
//! entity (core, or core + thread), or ignored.
//!
//! Metric families are enumerated once in [`Family`]; adding a family means
//! adding a variant and its stat suffix, nothing else.
//!
//! Entity paths are matched against the whole stat-name token with anchored
//! patterns, so `cpus1` never captures a `cpus10` line.

use crate::config::ExtractConfig;
use crate::error::Result;
use regex::Regex;
use serde::{Serialize, Serializer};
use std::fmt;

/// Metric family carried by a series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Family {
    /// Instructions per cycle (per core, or per thread via `commitStatsN`)
    Ipc,
    /// `power_model.dynamicPower`
    DynamicPower,
    /// `power_model.staticPower`
    StaticPower,
    /// Elapsed simulated time (`simSeconds`), scalar
    ElapsedTime,
}

impl Family {
    /// Families recognized from per-entity stat lines
    pub const METRICS: [Family; 3] = [Family::Ipc, Family::DynamicPower, Family::StaticPower];

    /// Stable kebab-case name used in keys and reports
    pub fn name(&self) -> &'static str {
        match self {
            Family::Ipc => "ipc",
            Family::DynamicPower => "dynamic-power",
            Family::StaticPower => "static-power",
            Family::ElapsedTime => "elapsed-time",
        }
    }

    /// Trailing part of the stat name that identifies the family
    fn stat_suffix(&self) -> &'static str {
        match self {
            Family::Ipc => "ipc",
            Family::DynamicPower => "power_model.dynamicPower",
            Family::StaticPower => "power_model.staticPower",
            Family::ElapsedTime => "",
        }
    }

    /// Whether the family is also reported per hardware thread
    fn per_thread(&self) -> bool {
        matches!(self, Family::Ipc)
    }

    /// Whether summing across entities yields a system total
    pub fn is_power(&self) -> bool {
        matches!(self, Family::DynamicPower | Family::StaticPower)
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for Family {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

/// Core index, plus thread index for per-thread sub-metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityPath {
    pub core: u32,
    pub thread: Option<u32>,
}

impl EntityPath {
    pub fn core(core: u32) -> Self {
        Self { core, thread: None }
    }

    pub fn thread(core: u32, thread: u32) -> Self {
        Self {
            core,
            thread: Some(thread),
        }
    }

    pub fn is_thread(&self) -> bool {
        self.thread.is_some()
    }
}

impl fmt::Display for EntityPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.thread {
            Some(thread) => write!(f, "cpu{}.thread{}", self.core, thread),
            None => write!(f, "cpu{}", self.core),
        }
    }
}

/// Identifies one series within a run: family plus optional entity path
///
/// The entity is absent only for scalar families (elapsed time).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MetricKey {
    pub family: Family,
    pub entity: Option<EntityPath>,
}

impl MetricKey {
    /// Key of the run-level elapsed-time series
    pub const ELAPSED: MetricKey = MetricKey {
        family: Family::ElapsedTime,
        entity: None,
    };

    pub fn new(family: Family, entity: EntityPath) -> Self {
        Self {
            family,
            entity: Some(entity),
        }
    }

    pub fn is_elapsed(&self) -> bool {
        self.family == Family::ElapsedTime
    }
}

impl fmt::Display for MetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.entity {
            Some(entity) => write!(f, "{}.{}", entity, self.family),
            None => write!(f, "{}", self.family),
        }
    }
}

impl Serialize for MetricKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Outcome of classifying one line
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Classification {
    /// Elapsed simulated time marker
    TimeSample(f64),
    /// Metric value for one entity
    MetricSample {
        family: Family,
        entity: EntityPath,
        value: f64,
    },
    /// Anything else; never an error
    Unrecognized,
}

/// A line matched a family but its value is unusable
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedSample {
    /// Stat name token of the offending line
    pub stat: String,
    pub reason: String,
}

struct FamilyMatcher {
    family: Family,
    suffix: &'static str,
    pattern: Regex,
}

/// Classifies stats lines into time and metric samples
pub struct LineClassifier {
    time_marker: String,
    bare_cluster_core: Option<u32>,
    matchers: Vec<FamilyMatcher>,
}

impl fmt::Debug for LineClassifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LineClassifier")
            .field("time_marker", &self.time_marker)
            .field("bare_cluster_core", &self.bare_cluster_core)
            .field(
                "families",
                &self.matchers.iter().map(|m| m.family).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl LineClassifier {
    /// Build one anchored pattern per metric family from the extract config
    ///
    /// For the default cluster prefix the IPC pattern is equivalent to
    /// `^system\.cpu_cluster\.cpus(\d+)\.(?:commitStats(\d+)\.)?ipc$`.
    pub fn new(config: &ExtractConfig) -> Result<Self> {
        let prefix = regex::escape(&config.cluster_prefix);
        let core = if config.bare_cluster_core.is_some() {
            r"(?P<core>\d+)?"
        } else {
            r"(?P<core>\d+)"
        };

        let mut matchers = Vec::with_capacity(Family::METRICS.len());
        for family in Family::METRICS {
            let thread = if family.per_thread() {
                format!(
                    r"(?:{}(?P<thread>\d+)\.)?",
                    regex::escape(&config.thread_segment)
                )
            } else {
                String::new()
            };
            let pattern = format!(
                r"^{}{}\.{}{}$",
                prefix,
                core,
                thread,
                regex::escape(family.stat_suffix())
            );
            matchers.push(FamilyMatcher {
                family,
                suffix: family.stat_suffix(),
                pattern: Regex::new(&pattern)?,
            });
        }

        Ok(Self {
            time_marker: config.time_marker.clone(),
            bare_cluster_core: config.bare_cluster_core,
            matchers,
        })
    }

    /// Classify a single line
    ///
    /// Returns `Err` only when the line names a known stat but its value is
    /// missing or not a finite float literal; callers drop such lines.
    pub fn classify(&self, line: &str) -> std::result::Result<Classification, MalformedSample> {
        let mut tokens = line.split_whitespace();
        let Some(name) = tokens.next() else {
            return Ok(Classification::Unrecognized);
        };

        if name == self.time_marker {
            let value = parse_value(name, tokens.next())?;
            return Ok(Classification::TimeSample(value));
        }

        for matcher in &self.matchers {
            // Cheap substring gate before running the anchored pattern
            if !name.ends_with(matcher.suffix) {
                continue;
            }
            let Some(captures) = matcher.pattern.captures(name) else {
                continue;
            };

            let core = match captures.name("core") {
                Some(m) => match m.as_str().parse::<u32>() {
                    Ok(core) => core,
                    Err(_) => return Ok(Classification::Unrecognized),
                },
                None => match self.bare_cluster_core {
                    Some(core) => core,
                    None => return Ok(Classification::Unrecognized),
                },
            };
            let thread = match captures.name("thread") {
                Some(m) => match m.as_str().parse::<u32>() {
                    Ok(thread) => Some(thread),
                    Err(_) => return Ok(Classification::Unrecognized),
                },
                None => None,
            };

            let value = parse_value(name, tokens.next())?;
            return Ok(Classification::MetricSample {
                family: matcher.family,
                entity: EntityPath { core, thread },
                value,
            });
        }

        Ok(Classification::Unrecognized)
    }
}

fn parse_value(stat: &str, token: Option<&str>) -> std::result::Result<f64, MalformedSample> {
    let malformed = |reason: String| MalformedSample {
        stat: stat.to_string(),
        reason,
    };

    let token = token.ok_or_else(|| malformed("missing value".to_string()))?;
    let value: f64 = token
        .parse()
        .map_err(|_| malformed(format!("invalid float literal '{}'", token)))?;
    if !value.is_finite() {
        return Err(malformed(format!("non-finite value '{}'", token)));
    }
    Ok(value)
}
