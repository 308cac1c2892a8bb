//! Microsecond-precision instants.
//!
//! A [`Timestamp`] is a signed count of microseconds since the Unix epoch.
//! Every `i64` is a valid timestamp, so the 8-byte wire form round-trips
//! exactly; conversion to a calendar date only fails for instants outside
//! the range `chrono` can represent.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::Error;

/// An instant in time, in microseconds since the Unix epoch (UTC).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp {
    micros: i64,
}

impl Timestamp {
    /// The Unix epoch; the default value of a timestamp slot.
    pub const EPOCH: Self = Self { micros: 0 };

    /// Creates a timestamp at the current time.
    #[must_use]
    pub fn now() -> Self {
        Self {
            micros: Utc::now().timestamp_micros(),
        }
    }

    /// Creates a timestamp from microseconds since the Unix epoch.
    #[must_use]
    pub const fn from_micros(micros: i64) -> Self {
        Self { micros }
    }

    /// Returns microseconds since the Unix epoch.
    #[must_use]
    pub const fn as_micros(&self) -> i64 {
        self.micros
    }

    /// Converts from a `chrono` UTC date-time, truncating to microseconds.
    #[must_use]
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self {
            micros: dt.timestamp_micros(),
        }
    }

    /// Converts to a `chrono` UTC date-time.
    ///
    /// Returns `None` when the instant is outside chrono's supported range.
    #[must_use]
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_micros(self.micros)
    }

    /// Fixed 8-byte little-endian encoding.
    #[must_use]
    pub const fn to_le_bytes(&self) -> [u8; 8] {
        self.micros.to_le_bytes()
    }

    /// Decodes the fixed 8-byte little-endian encoding.
    #[must_use]
    pub const fn from_le_bytes(bytes: [u8; 8]) -> Self {
        Self {
            micros: i64::from_le_bytes(bytes),
        }
    }

    /// Parses either an RFC 3339 date-time or a raw microsecond count.
    pub fn parse(s: &str) -> crate::Result<Self> {
        let trimmed = s.trim();
        if let Ok(micros) = trimmed.parse::<i64>() {
            return Ok(Self { micros });
        }
        DateTime::parse_from_rfc3339(trimmed)
            .map(|dt| Self::from_datetime(dt.with_timezone(&Utc)))
            .map_err(|e| Error::InvalidTimestamp(format!("{trimmed:?}: {e}")))
    }

    /// Returns true if this timestamp is before the other.
    #[must_use]
    pub fn is_before(&self, other: &Self) -> bool {
        self < other
    }

    /// Returns true if this timestamp is after the other.
    #[must_use]
    pub fn is_after(&self, other: &Self) -> bool {
        self > other
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self::from_datetime(dt)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_datetime() {
            Some(dt) => f.write_str(&dt.to_rfc3339_opts(SecondsFormat::Micros, true)),
            None => write!(f, "{}", self.micros),
        }
    }
}

impl FromStr for Timestamp {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
