//! Clip and merge request specs plus their validation gate.
//!
//! Validation is pure and runs synchronously at submission time, so
//! malformed requests fail fast before any subprocess work is scheduled.

use crate::domain::time::TimeOffset;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single (source, start, end) cut request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClipSpec {
    pub source_video: String,
    pub start_time: TimeOffset,
    pub end_time: TimeOffset,
}

/// An ordered list of clips to concatenate. Order is significant:
/// concatenation order is exactly the sequence order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeSpec {
    pub clips: Vec<ClipSpec>,
    pub output_name: String,
}

/// Request-shape limits, configurable via [`crate::config::Config`].
#[derive(Debug, Clone, Copy)]
pub struct EngineLimits {
    pub min_clip_duration: TimeOffset,
    pub max_merge_clips: usize,
}

impl Default for EngineLimits {
    fn default() -> Self {
        Self {
            min_clip_duration: TimeOffset::from_millis(100),
            max_merge_clips: 200,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("end_time ({end}) must be greater than start_time ({start})")]
    EndBeforeStart { start: TimeOffset, end: TimeOffset },
    #[error("clip duration {actual} is below the minimum of {minimum}")]
    TooShort {
        actual: TimeOffset,
        minimum: TimeOffset,
    },
    #[error("end_time ({end}) exceeds the source duration ({source_duration})")]
    OutOfRange {
        end: TimeOffset,
        source_duration: TimeOffset,
    },
    #[error("at least one clip is required")]
    EmptyMerge,
    #[error("{count} clips exceeds the maximum of {maximum} per merge")]
    TooManyClips { count: usize, maximum: usize },
    #[error("output name must not be empty")]
    EmptyOutputName,
}

impl ValidationError {
    /// Stable machine-readable code for the HTTP error body.
    pub fn code(&self) -> &'static str {
        match self {
            ValidationError::EndBeforeStart { .. } => "end_before_start",
            ValidationError::TooShort { .. } => "clip_too_short",
            ValidationError::OutOfRange { .. } => "out_of_range",
            ValidationError::EmptyMerge => "empty_merge",
            ValidationError::TooManyClips { .. } => "too_many_clips",
            ValidationError::EmptyOutputName => "empty_output_name",
        }
    }
}

impl ClipSpec {
    pub fn expected_duration(&self) -> TimeOffset {
        self.end_time.abs_diff(self.start_time)
    }

    /// Check the requested range. `known_source_duration` is passed once the
    /// source has actually been probed; it is `None` at submission time.
    pub fn validate(
        &self,
        limits: &EngineLimits,
        known_source_duration: Option<TimeOffset>,
    ) -> Result<(), ValidationError> {
        if self.end_time <= self.start_time {
            return Err(ValidationError::EndBeforeStart {
                start: self.start_time,
                end: self.end_time,
            });
        }
        let duration = self.expected_duration();
        if duration < limits.min_clip_duration {
            return Err(ValidationError::TooShort {
                actual: duration,
                minimum: limits.min_clip_duration,
            });
        }
        if let Some(source_duration) = known_source_duration {
            if self.end_time > source_duration {
                return Err(ValidationError::OutOfRange {
                    end: self.end_time,
                    source_duration,
                });
            }
        }
        Ok(())
    }
}

impl MergeSpec {
    /// Sum of the requested clip durations, exact in millis.
    pub fn expected_total_duration(&self) -> TimeOffset {
        self.clips
            .iter()
            .fold(TimeOffset::ZERO, |acc, clip| acc + clip.expected_duration())
    }

    pub fn validate(&self, limits: &EngineLimits) -> Result<(), ValidationError> {
        if self.clips.is_empty() {
            return Err(ValidationError::EmptyMerge);
        }
        if self.clips.len() > limits.max_merge_clips {
            return Err(ValidationError::TooManyClips {
                count: self.clips.len(),
                maximum: limits.max_merge_clips,
            });
        }
        if self.output_name.trim().is_empty() {
            return Err(ValidationError::EmptyOutputName);
        }
        for clip in &self.clips {
            clip.validate(limits, None)?;
        }
        Ok(())
    }
}
