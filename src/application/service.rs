//! Clip and merge task orchestration.
//!
//! `submit_*` validates synchronously, registers a Pending task, spawns a
//! worker, and returns the id immediately. Everything that can fail after
//! that point is captured in the task record; the submission call never
//! blocks on pipeline execution.

use crate::domain::clip::{ClipSpec, EngineLimits, MergeSpec, ValidationError};
use crate::domain::precision::{audit, PrecisionPolicy};
use crate::domain::task::{ClipMetadata, MergeMetadata, Task, TaskKind, TaskMetadata};
use crate::domain::time::TimeOffset;
use crate::media::cmd::MediaExecutor;
use crate::media::{pipeline, probe::probe_video};
use crate::application::tasks::TaskRegistry;
use crate::ports::storage::StoragePort;
use std::error::Error;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

type WorkerResult = Result<(), Box<dyn Error + Send + Sync>>;

pub struct TaskService<S, M> {
    storage: Arc<S>,
    media: Arc<M>,
    registry: TaskRegistry,
    limits: EngineLimits,
    policy: PrecisionPolicy,
    task_timeout: Duration,
}

impl<S, M> TaskService<S, M>
where
    S: StoragePort + 'static,
    M: MediaExecutor + 'static,
{
    pub fn new(
        storage: Arc<S>,
        media: Arc<M>,
        limits: EngineLimits,
        policy: PrecisionPolicy,
        task_timeout: Duration,
    ) -> Self {
        Self {
            storage,
            media,
            registry: TaskRegistry::new(),
            limits,
            policy,
            task_timeout,
        }
    }

    pub fn registry(&self) -> &TaskRegistry {
        &self.registry
    }

    pub async fn status(&self, task_id: &str) -> Option<Task> {
        self.registry.get(task_id).await
    }

    /// Validate and schedule a single-clip cut. Invalid specs are rejected
    /// here and never create a task record.
    pub async fn submit_clip(
        &self,
        spec: ClipSpec,
        output_name: String,
    ) -> Result<String, ValidationError> {
        spec.validate(&self.limits, None)?;
        if output_name.trim().is_empty() {
            return Err(ValidationError::EmptyOutputName);
        }

        let task_id = self
            .registry
            .create(
                TaskKind::Clip,
                format!("Clip task created for {}", spec.source_video),
            )
            .await;
        self.spawn_worker(task_id.clone(), "Clip", {
            let storage = Arc::clone(&self.storage);
            let media = Arc::clone(&self.media);
            let registry = self.registry.clone();
            let limits = self.limits;
            let policy = self.policy;
            let id = task_id.clone();
            async move {
                run_clip_task(
                    &*storage,
                    &*media,
                    &registry,
                    &limits,
                    &policy,
                    &id,
                    spec,
                    output_name,
                )
                .await
            }
        });
        Ok(task_id)
    }

    /// Validate and schedule an ordered multi-clip merge.
    pub async fn submit_merge(&self, spec: MergeSpec) -> Result<String, ValidationError> {
        spec.validate(&self.limits)?;

        let task_id = self
            .registry
            .create(
                TaskKind::Merge,
                format!("Merge task created ({} clips)", spec.clips.len()),
            )
            .await;
        self.spawn_worker(task_id.clone(), "Merge", {
            let storage = Arc::clone(&self.storage);
            let media = Arc::clone(&self.media);
            let registry = self.registry.clone();
            let limits = self.limits;
            let policy = self.policy;
            let id = task_id.clone();
            async move {
                run_merge_task(&*storage, &*media, &registry, &limits, &policy, &id, spec).await
            }
        });
        Ok(task_id)
    }

    /// Run a worker future off the submission path, under the hard task
    /// timeout. Worker errors become the task's terminal Failed state, never
    /// a panic or a lost task.
    fn spawn_worker(
        &self,
        task_id: String,
        kind_label: &'static str,
        work: impl std::future::Future<Output = WorkerResult> + Send + 'static,
    ) {
        let registry = self.registry.clone();
        let timeout = self.task_timeout;
        tokio::spawn(async move {
            match tokio::time::timeout(timeout, work).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    tracing::error!(task_id = %task_id, error = %e, "task failed");
                    let message = format!("{} failed: {}", kind_label, e);
                    registry
                        .update(&task_id, |t| t.fail(e.to_string(), message))
                        .await;
                }
                Err(_) => {
                    tracing::error!(task_id = %task_id, "task timed out");
                    registry
                        .update(&task_id, |t| {
                            t.fail("task timed out", format!("{} failed: task timed out", kind_label))
                        })
                        .await;
                }
            }
        });
    }
}

#[allow(clippy::too_many_arguments)]
async fn run_clip_task<S: StoragePort, M: MediaExecutor>(
    storage: &S,
    media: &M,
    registry: &TaskRegistry,
    limits: &EngineLimits,
    policy: &PrecisionPolicy,
    task_id: &str,
    spec: ClipSpec,
    output_name: String,
) -> WorkerResult {
    registry
        .update(task_id, |t| {
            t.start_processing("Downloading source video...")
        })
        .await;

    // Intermediates are namespaced by task id so concurrent tasks never
    // collide; the directory is removed on every exit path.
    let work_dir = tempfile::Builder::new()
        .prefix(&format!("clip_{}_", task_id))
        .tempdir()?;

    let local_input = work_dir.path().join("input.mp4");
    storage.download(&spec.source_video, &local_input).await?;

    let source_info = probe_video(media, &local_input).await?;
    spec.validate(limits, Some(source_info.duration))?;
    let expected = spec.expected_duration();

    registry
        .update(task_id, |t| {
            t.set_progress(
                0.3,
                format!(
                    "Cutting {} - {} with millisecond precision...",
                    spec.start_time, spec.end_time
                ),
            )
        })
        .await;

    let clip_local = work_dir.path().join("clip.mp4");
    let info = pipeline::cut_clip(media, &local_input, spec.start_time, expected, &clip_local).await?;
    let actual = info.duration;

    let report = audit(policy, expected, actual);
    tracing::info!(
        task_id = %task_id,
        expected = %expected,
        actual = %actual,
        error_ms = report.error_ms,
        level = ?report.level,
        "clip cut complete"
    );

    registry
        .update(task_id, |t| t.set_progress(0.9, "Uploading result..."))
        .await;

    let output_key = format!("clips/{}", output_name);
    storage.upload(&clip_local, &output_key).await?;
    let file_size = tokio::fs::metadata(&clip_local).await?.len();
    let thumbnail_url =
        make_thumbnail(storage, media, &clip_local, work_dir.path(), actual, &output_name).await;
    let output_url = storage.public_url(&output_key);

    let metadata = TaskMetadata::Clip(ClipMetadata {
        clip_duration: actual,
        expected_duration: expected,
        duration_error_ms: report.error_ms,
        duration_error_percent: report.error_percent,
        precision_level: report.level,
        file_size,
        thumbnail_url,
        video_info: info,
    });
    registry
        .update(task_id, |t| {
            t.complete(
                output_key,
                output_url,
                metadata,
                "Clip completed successfully with millisecond precision",
            )
        })
        .await;

    Ok(())
}

async fn run_merge_task<S: StoragePort, M: MediaExecutor>(
    storage: &S,
    media: &M,
    registry: &TaskRegistry,
    limits: &EngineLimits,
    policy: &PrecisionPolicy,
    task_id: &str,
    spec: MergeSpec,
) -> WorkerResult {
    registry
        .update(task_id, |t| {
            t.start_processing("Processing clips with millisecond precision...")
        })
        .await;

    let work_dir = tempfile::Builder::new()
        .prefix(&format!("merge_{}_", task_id))
        .tempdir()?;

    let total_clips = spec.clips.len();
    let expected_total = spec.expected_total_duration();

    // Cut every clip into an intermediate, strictly in request order.
    let mut clip_paths = Vec::with_capacity(total_clips);
    let mut clip_durations: Vec<TimeOffset> = Vec::with_capacity(total_clips);
    for (i, clip) in spec.clips.iter().enumerate() {
        let local_input = work_dir.path().join(format!("input_{}.mp4", i));
        storage.download(&clip.source_video, &local_input).await?;

        let source_info = probe_video(media, &local_input).await?;
        clip.validate(limits, Some(source_info.duration))?;

        let clip_local = work_dir.path().join(format!("clip_{:03}.mp4", i));
        let info = pipeline::cut_clip(
            media,
            &local_input,
            clip.start_time,
            clip.expected_duration(),
            &clip_local,
        )
        .await?;

        tracing::info!(
            task_id = %task_id,
            clip = i + 1,
            total = total_clips,
            expected = %clip.expected_duration(),
            actual = %info.duration,
            "clip cut"
        );

        clip_durations.push(info.duration);
        clip_paths.push(clip_local);
        tokio::fs::remove_file(&local_input).await?;

        let progress = 0.1 + 0.6 * (i + 1) as f64 / total_clips as f64;
        registry
            .update(task_id, |t| {
                t.set_progress(
                    progress,
                    format!("Processed clip {}/{} ({})", i + 1, total_clips, info.duration),
                )
            })
            .await;
    }

    registry
        .update(task_id, |t| t.set_progress(0.7, "Merging clips..."))
        .await;

    let merged_local = work_dir.path().join("merged.mp4");
    let list_file = work_dir.path().join("concat.txt");
    let merged_info = pipeline::concat_files(media, &clip_paths, &list_file, &merged_local).await?;
    let merged_duration = merged_info.duration;

    let report = audit(policy, expected_total, merged_duration);
    tracing::info!(
        task_id = %task_id,
        expected = %expected_total,
        actual = %merged_duration,
        error_ms = report.error_ms,
        level = ?report.level,
        "merge complete"
    );

    registry
        .update(task_id, |t| t.set_progress(0.9, "Uploading result..."))
        .await;

    let output_key = format!("merged/{}", spec.output_name);
    storage.upload(&merged_local, &output_key).await?;
    let file_size = tokio::fs::metadata(&merged_local).await?.len();
    let thumbnail_url = make_thumbnail(
        storage,
        media,
        &merged_local,
        work_dir.path(),
        merged_duration,
        &spec.output_name,
    )
    .await;
    let output_url = storage.public_url(&output_key);

    let metadata = TaskMetadata::Merge(MergeMetadata {
        total_clips,
        merged_duration,
        expected_duration: expected_total,
        duration_error_ms: report.error_ms,
        duration_error_percent: report.error_percent,
        precision_level: report.level,
        clip_durations,
        file_size,
        thumbnail_url,
        video_info: merged_info,
    });
    registry
        .update(task_id, |t| {
            t.complete(
                output_key,
                output_url,
                metadata,
                "Merge completed successfully with millisecond precision",
            )
        })
        .await;

    Ok(())
}

/// Best-effort midpoint thumbnail. Failure is logged, never fatal: the clip
/// itself already succeeded.
async fn make_thumbnail<S: StoragePort, M: MediaExecutor>(
    storage: &S,
    media: &M,
    local_video: &Path,
    work_dir: &Path,
    duration: TimeOffset,
    output_name: &str,
) -> Option<String> {
    let thumb_local = work_dir.join("thumbnail.jpg");
    let midpoint = TimeOffset::from_millis(duration.as_millis() / 2);

    if let Err(e) = pipeline::grab_thumbnail(media, local_video, midpoint, &thumb_local).await {
        tracing::warn!(error = %e, "thumbnail generation failed");
        return None;
    }
    let key = format!("thumbnails/{}.jpg", output_name);
    if let Err(e) = storage.upload(&thumb_local, &key).await {
        tracing::warn!(error = %e, "thumbnail upload failed");
        return None;
    }
    Some(storage.public_url(&key))
}
