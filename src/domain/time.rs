//! Canonical time model.
//!
//! Every duration claim in the engine goes through this type: offsets are
//! stored as whole milliseconds so rounding happens exactly once, at the
//! boundary where a floating-point value enters the system.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::ops::Add;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TimeError {
    #[error("invalid time value: {0}")]
    Invalid(String),
}

/// A non-negative time offset at fixed millisecond precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct TimeOffset {
    millis: u64,
}

impl TimeOffset {
    pub const ZERO: TimeOffset = TimeOffset { millis: 0 };

    pub fn from_millis(millis: u64) -> Self {
        Self { millis }
    }

    /// Convert a floating-point seconds value, rounding half-away-from-zero
    /// at the third decimal. Negative and non-finite values are rejected.
    pub fn from_secs_f64(value: f64) -> Result<Self, TimeError> {
        if !value.is_finite() {
            return Err(TimeError::Invalid(format!("non-finite seconds: {}", value)));
        }
        if value < 0.0 {
            return Err(TimeError::Invalid(format!("negative seconds: {}", value)));
        }
        Ok(Self {
            millis: (value * 1000.0).round() as u64,
        })
    }

    pub fn as_millis(&self) -> u64 {
        self.millis
    }

    pub fn as_secs_f64(&self) -> f64 {
        self.millis as f64 / 1000.0
    }

    /// Plain `S.mmm` seconds string for the ffmpeg command line. Millisecond
    /// precision is preserved, never truncated to whole seconds.
    pub fn as_ffmpeg_arg(&self) -> String {
        format!("{}.{:03}", self.millis / 1000, self.millis % 1000)
    }

    pub fn checked_sub(&self, other: TimeOffset) -> Option<TimeOffset> {
        self.millis.checked_sub(other.millis).map(TimeOffset::from_millis)
    }

    pub fn abs_diff(&self, other: TimeOffset) -> TimeOffset {
        TimeOffset::from_millis(self.millis.abs_diff(other.millis))
    }
}

impl Add for TimeOffset {
    type Output = TimeOffset;

    fn add(self, rhs: TimeOffset) -> TimeOffset {
        TimeOffset::from_millis(self.millis + rhs.millis)
    }
}

impl fmt::Display for TimeOffset {
    /// `M:SS.mmm` - minutes unbounded, seconds and milliseconds zero-padded.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let minutes = self.millis / 60_000;
        let seconds = (self.millis % 60_000) / 1000;
        let millis = self.millis % 1000;
        write!(f, "{}:{:02}.{:03}", minutes, seconds, millis)
    }
}

impl FromStr for TimeOffset {
    type Err = TimeError;

    /// Left inverse of `Display` for every value `Display` produces.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || TimeError::Invalid(format!("malformed time string: {:?}", s));

        let (minutes_part, rest) = s.split_once(':').ok_or_else(invalid)?;
        let (seconds_part, millis_part) = rest.split_once('.').ok_or_else(invalid)?;
        if millis_part.contains('.') {
            return Err(invalid());
        }

        let minutes: u64 = minutes_part.parse().map_err(|_| invalid())?;
        let seconds: u64 = seconds_part.parse().map_err(|_| invalid())?;
        let millis: u64 = millis_part.parse().map_err(|_| invalid())?;

        if seconds >= 60 || millis_part.len() != 3 {
            return Err(invalid());
        }

        Ok(TimeOffset::from_millis(
            minutes * 60_000 + seconds * 1000 + millis,
        ))
    }
}

impl Serialize for TimeOffset {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_secs_f64())
    }
}

impl<'de> Deserialize<'de> for TimeOffset {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = f64::deserialize(deserializer)?;
        TimeOffset::from_secs_f64(value).map_err(serde::de::Error::custom)
    }
}
