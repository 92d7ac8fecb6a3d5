//! Asynchronous task records.
//!
//! A task is created Pending at submission, moves to Processing when its
//! worker picks it up, and reaches exactly one terminal state. The registry
//! in `application::tasks` owns every record; workers mutate their own task
//! only, through the registry.

use crate::domain::precision::PrecisionLevel;
use crate::domain::time::TimeOffset;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskKind {
    Clip,
    Merge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl TaskStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed)
    }
}

/// Container-level facts probed from a produced file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoInfo {
    pub duration: TimeOffset,
    pub width: u32,
    pub height: u32,
    pub codec: String,
    pub fps: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClipMetadata {
    pub clip_duration: TimeOffset,
    pub expected_duration: TimeOffset,
    pub duration_error_ms: u64,
    pub duration_error_percent: f64,
    pub precision_level: PrecisionLevel,
    pub file_size: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    pub video_info: VideoInfo,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeMetadata {
    pub total_clips: usize,
    pub merged_duration: TimeOffset,
    pub expected_duration: TimeOffset,
    pub duration_error_ms: u64,
    pub duration_error_percent: f64,
    pub precision_level: PrecisionLevel,
    /// Actual measured length of each input clip after cutting, in request
    /// order.
    pub clip_durations: Vec<TimeOffset>,
    pub file_size: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    pub video_info: VideoInfo,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TaskMetadata {
    Merge(MergeMetadata),
    Clip(ClipMetadata),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub task_id: String,
    pub kind: TaskKind,
    pub status: TaskStatus,
    pub progress: f64,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<TaskMetadata>,
}

impl Task {
    pub fn new(task_id: String, kind: TaskKind, message: String) -> Self {
        let now = Utc::now();
        Self {
            task_id,
            kind,
            status: TaskStatus::Pending,
            progress: 0.0,
            message,
            created_at: now,
            updated_at: now,
            output_path: None,
            output_url: None,
            error: None,
            metadata: None,
        }
    }

    pub fn start_processing(&mut self, message: impl Into<String>) {
        if self.status.is_terminal() {
            return;
        }
        self.status = TaskStatus::Processing;
        self.set_progress(0.1, message);
    }

    /// Progress is monotonically non-decreasing in [0, 1].
    pub fn set_progress(&mut self, progress: f64, message: impl Into<String>) {
        if self.status.is_terminal() {
            return;
        }
        self.progress = self.progress.max(progress.clamp(0.0, 1.0));
        self.message = message.into();
    }

    /// A terminal record never changes again. A task that already timed out
    /// ignores its worker's late completion, and vice versa.
    pub fn complete(
        &mut self,
        output_path: String,
        output_url: String,
        metadata: TaskMetadata,
        message: impl Into<String>,
    ) {
        if self.status.is_terminal() {
            return;
        }
        self.status = TaskStatus::Completed;
        self.progress = 1.0;
        self.message = message.into();
        self.output_path = Some(output_path);
        self.output_url = Some(output_url);
        self.metadata = Some(metadata);
    }

    pub fn fail(&mut self, error: impl Into<String>, message: impl Into<String>) {
        if self.status.is_terminal() {
            return;
        }
        self.status = TaskStatus::Failed;
        self.error = Some(error.into());
        self.message = message.into();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_task_is_pending_with_zero_progress() {
        let task = Task::new("abc".into(), TaskKind::Clip, "created".into());
        assert_eq!(task.status, TaskStatus::Pending);
        assert_eq!(task.progress, 0.0);
        assert!(!task.status.is_terminal());
        assert!(task.metadata.is_none());
    }

    #[test]
    fn progress_never_decreases() {
        let mut task = Task::new("abc".into(), TaskKind::Merge, "created".into());
        task.set_progress(0.7, "merging");
        task.set_progress(0.3, "late update");
        assert_eq!(task.progress, 0.7);
        assert_eq!(task.message, "late update");
        task.set_progress(1.5, "overshoot");
        assert_eq!(task.progress, 1.0);
    }

    #[test]
    fn terminal_states() {
        let mut task = Task::new("abc".into(), TaskKind::Clip, "created".into());
        task.fail("boom", "Clip failed: boom");
        assert_eq!(task.status, TaskStatus::Failed);
        assert!(task.status.is_terminal());
        assert_eq!(task.error.as_deref(), Some("boom"));
    }

    #[test]
    fn terminal_tasks_are_immutable() {
        let mut task = Task::new("abc".into(), TaskKind::Clip, "created".into());
        task.fail("timed out", "Clip failed: timed out");

        task.set_progress(0.9, "late progress");
        task.start_processing("late restart");
        task.complete(
            "clips/out.mp4".into(),
            "http://store.local/clips/out.mp4".into(),
            TaskMetadata::Clip(ClipMetadata {
                clip_duration: TimeOffset::from_millis(1000),
                expected_duration: TimeOffset::from_millis(1000),
                duration_error_ms: 0,
                duration_error_percent: 0.0,
                precision_level: PrecisionLevel::Excellent,
                file_size: 1,
                thumbnail_url: None,
                video_info: VideoInfo {
                    duration: TimeOffset::from_millis(1000),
                    width: 1280,
                    height: 720,
                    codec: "h264".into(),
                    fps: 30.0,
                },
            }),
            "late completion",
        );
        task.fail("second failure", "overwrite attempt");

        assert_eq!(task.status, TaskStatus::Failed);
        assert_eq!(task.error.as_deref(), Some("timed out"));
        assert_eq!(task.message, "Clip failed: timed out");
        assert!(task.metadata.is_none());
        assert!(task.output_url.is_none());
    }

    #[test]
    fn statuses_serialize_lowercase() {
        assert_eq!(
            serde_json::to_string(&TaskStatus::Processing).unwrap(),
            "\"processing\""
        );
        assert_eq!(serde_json::to_string(&TaskKind::Merge).unwrap(), "\"merge\"");
    }
}
