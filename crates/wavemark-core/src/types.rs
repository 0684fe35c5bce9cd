//! Core types for the fingerprint alarm engine
//!
//! Defines the timestamp representation shared by the detector, the
//! generation rate limiter and the pipeline driver, plus the parsed
//! input sample.
//!
//! Timestamps carry microsecond resolution and are only ever consumed
//! as 64-bit microsecond differences (cool-down checks, hourly quota
//! windows). Wall-clock calendar effects such as DST shifts are
//! deliberately ignored.

use serde::{Deserialize, Serialize};

/// A point in time with microsecond resolution.
///
/// Stored as microseconds since the Unix epoch. Comparisons between
/// stream timestamps happen via [`MicroTime::micros_since`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MicroTime(i64);

impl MicroTime {
    /// Epoch origin, used as the "long ago" initial value for alarm and
    /// quota bookkeeping.
    pub const EPOCH: MicroTime = MicroTime(0);

    /// Build from whole seconds and a sub-second microsecond part.
    pub fn from_parts(secs: i64, micros: i64) -> Self {
        MicroTime(secs * 1_000_000 + micros)
    }

    /// Build from a raw microsecond count.
    pub fn from_micros(micros: i64) -> Self {
        MicroTime(micros)
    }

    /// Raw microsecond count.
    pub fn as_micros(&self) -> i64 {
        self.0
    }

    /// Whole seconds part.
    pub fn secs(&self) -> i64 {
        self.0.div_euclid(1_000_000)
    }

    /// Microseconds elapsed since `earlier` (negative if `self` precedes it).
    pub fn micros_since(&self, earlier: MicroTime) -> i64 {
        self.0 - earlier.0
    }
}

/// One parsed input measurement.
#[derive(Debug, Clone)]
pub struct RawSample {
    /// Timestamp parsed from the line.
    pub time: MicroTime,
    /// The timestamp field exactly as it appeared (trimmed), kept for
    /// output records and generated fingerprint filenames.
    pub time_text: String,
    /// Measured value.
    pub value: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_parts_roundtrip() {
        let t = MicroTime::from_parts(1_700_000_000, 729_915);
        assert_eq!(t.secs(), 1_700_000_000);
        assert_eq!(t.as_micros(), 1_700_000_000_729_915);
    }

    #[test]
    fn test_micros_since() {
        let a = MicroTime::from_parts(100, 500_000);
        let b = MicroTime::from_parts(103, 100_000);
        assert_eq!(b.micros_since(a), 2_600_000);
        assert_eq!(a.micros_since(b), -2_600_000);
    }

    #[test]
    fn test_ordering() {
        let a = MicroTime::from_parts(10, 0);
        let b = MicroTime::from_parts(10, 1);
        assert!(a < b);
        assert!(MicroTime::EPOCH < a);
    }
}
