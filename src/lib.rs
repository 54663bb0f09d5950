//! simseries - time-series extraction and comparison for gem5 statistics dumps
//!
//! This library classifies the lines of a gem5 `stats.txt` into per-core (and
//! per-thread) metric series, aligns series of unequal length, aggregates them
//! across cores, downsamples them into time buckets, and compares two runs of
//! the same workload.

pub mod aggregate;
pub mod align;
pub mod bucket;
pub mod classify;
pub mod cli;
pub mod compare;
pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod run;

pub use classify::{EntityPath, Family, LineClassifier, MetricKey};
pub use error::{Result, SeriesError, Warning};
pub use run::{Accumulator, EntityScope, Run};
