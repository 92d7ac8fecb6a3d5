//! Duration accuracy audit.
//!
//! Callers build automated checks against `duration_error_ms`, so the
//! computation lives in one place instead of being repeated at every
//! completion site.

use crate::domain::time::TimeOffset;
use serde::{Deserialize, Serialize};

/// Qualitative accuracy bucket derived from millisecond duration error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrecisionLevel {
    Excellent,
    Good,
    Acceptable,
    Fair,
}

/// Classification thresholds. The defaults match observed behavior but are
/// policy, not physical constraints.
#[derive(Debug, Clone, Copy)]
pub struct PrecisionPolicy {
    pub excellent_ms: u64,
    pub good_ms: u64,
    pub acceptable_ms: u64,
}

impl Default for PrecisionPolicy {
    fn default() -> Self {
        Self {
            excellent_ms: 50,
            good_ms: 100,
            acceptable_ms: 200,
        }
    }
}

impl PrecisionPolicy {
    pub fn classify(&self, error_ms: u64) -> PrecisionLevel {
        if error_ms < self.excellent_ms {
            PrecisionLevel::Excellent
        } else if error_ms < self.good_ms {
            PrecisionLevel::Good
        } else if error_ms < self.acceptable_ms {
            PrecisionLevel::Acceptable
        } else {
            PrecisionLevel::Fair
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PrecisionReport {
    pub error_ms: u64,
    pub error_percent: f64,
    pub level: PrecisionLevel,
}

/// Measure actual vs. expected duration. Exact in whole milliseconds since
/// `TimeOffset` stores millis; the percentage is rounded to two decimals.
pub fn audit(policy: &PrecisionPolicy, expected: TimeOffset, actual: TimeOffset) -> PrecisionReport {
    let error_ms = expected.abs_diff(actual).as_millis();
    let error_percent = if expected.as_millis() > 0 {
        let raw = error_ms as f64 / expected.as_millis() as f64 * 100.0;
        (raw * 100.0).round() / 100.0
    } else {
        0.0
    };
    PrecisionReport {
        error_ms,
        error_percent,
        level: policy.classify(error_ms),
    }
}
