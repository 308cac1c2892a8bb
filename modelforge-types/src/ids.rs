//! Tracking identifiers.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Timestamp;

/// Identifies one tracked edit session over a model.
///
/// Backed by a UUID v7, so identifiers sort by the millisecond their session
/// started and two proxies over the same model never share one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackingId(Uuid);

impl TrackingId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// When the tracked session started, at millisecond precision.
    #[must_use]
    pub fn started_at(&self) -> Timestamp {
        let micros = self.0.get_timestamp().map_or(0, |ts| {
            let (secs, nanos) = ts.to_unix();
            i64::try_from(secs).unwrap_or(i64::MAX / 1_000_000) * 1_000_000 + i64::from(nanos / 1_000)
        });
        Timestamp::from_micros(micros)
    }
}

impl Default for TrackingId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TrackingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "trk-{}", self.0.simple())
    }
}
