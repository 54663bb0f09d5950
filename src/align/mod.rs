// Length reconciliation and cross-run synchronization
//
// Series extracted from one stream grow independently: a crash mid-dump, a
// family that is only dumped every N epochs, or a configuration that adds a
// family all leave series of different lengths. Index i only denotes the same
// epoch across series once they are truncated to a common prefix.
//
// Policy: truncate to the shortest requested series. Trailing samples of
// longer series are discarded, never interpolated. Families sampled at
// different frequencies are still aligned by position; that weakness is
// inherited from the simulator's dump format and logged, not corrected.

mod reconcile;
mod synchronize;

pub use reconcile::{common_length, reconcile, SeriesRequest};
pub use synchronize::{synchronize, Synchronized};
