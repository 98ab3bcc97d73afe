use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TimestampMs(i64);

impl TimestampMs {
    /// Unix epoch milliseconds (UTC)
    pub fn from_epoch_millis(ms: i64) -> Self {
        Self(ms)
    }

    pub fn as_millis(&self) -> i64 {
        self.0
    }

    /// This timestamp shifted forward by `d`, saturating on overflow.
    pub fn offset_by(&self, d: Duration) -> Self {
        let ms = d.as_millis().min(i64::MAX as u128) as i64;
        Self(self.0.saturating_add(ms))
    }

    /// Milliseconds elapsed between `earlier` and `self`; zero when
    /// `earlier` is in the future (clock skew from out-of-order beacons).
    pub fn millis_since(&self, earlier: TimestampMs) -> i64 {
        (self.0 - earlier.0).max(0)
    }
}
