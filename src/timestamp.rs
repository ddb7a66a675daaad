//! Timestamp conversion for archive entries.
//!
//! RAR headers carry Windows FILETIME values: 100-nanosecond intervals since
//! 1601-01-01 UTC, reported by the engine as two 32-bit halves. A raw value
//! of zero means the archive did not record the timestamp.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Seconds between the Windows epoch (1601) and the Unix epoch (1970).
const EPOCH_DIFF_SECS: u64 = 11_644_473_600;

/// FILETIME intervals per second.
const INTERVALS_PER_SECOND: u64 = 10_000_000;

/// A point in time from an archive entry header.
///
/// Stored as raw FILETIME ticks. Conversions clamp to the Unix epoch
/// rather than failing when the value predates 1970.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp {
    ticks: u64,
}

impl Timestamp {
    /// Creates a timestamp from raw FILETIME ticks.
    pub fn from_ticks(ticks: u64) -> Self {
        Timestamp { ticks }
    }

    /// Assembles a timestamp from the high/low 32-bit halves the engine
    /// reports, or `None` when both halves are zero (not recorded).
    pub fn from_halves(high: u32, low: u32) -> Option<Self> {
        let ticks = (u64::from(high) << 32) | u64::from(low);
        if ticks == 0 {
            None
        } else {
            Some(Timestamp { ticks })
        }
    }

    /// Raw FILETIME ticks (100ns intervals since 1601-01-01 UTC).
    pub fn as_ticks(&self) -> u64 {
        self.ticks
    }

    /// Whole seconds since the Unix epoch, clamped to zero for times
    /// before 1970.
    pub fn as_unix_secs(&self) -> u64 {
        (self.ticks / INTERVALS_PER_SECOND).saturating_sub(EPOCH_DIFF_SECS)
    }

    /// Converts to [`SystemTime`], clamped to the Unix epoch for times
    /// before 1970. Sub-second precision is preserved.
    pub fn as_system_time(&self) -> SystemTime {
        let secs = self.ticks / INTERVALS_PER_SECOND;
        if secs < EPOCH_DIFF_SECS {
            return UNIX_EPOCH;
        }
        let nanos = (self.ticks % INTERVALS_PER_SECOND) * 100;
        UNIX_EPOCH + Duration::new(secs - EPOCH_DIFF_SECS, nanos as u32)
    }
}
