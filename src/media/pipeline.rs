//! Cut and concatenate operations on top of the [`MediaExecutor`] seam.
//!
//! Any non-zero subprocess exit is fatal and carries the raw tool stderr;
//! nothing is skipped or retried here. Retry, if wanted, is a caller
//! decision.

use crate::domain::task::VideoInfo;
use crate::domain::time::TimeOffset;
use crate::media::cmd::MediaExecutor;
use crate::media::probe::probe_video;
use crate::media::MediaError;
use std::path::Path;

/// Extract exactly [start, start+duration) from `source` into `output`,
/// then probe the result. The probed duration is the actual duration.
pub async fn cut_clip(
    executor: &impl MediaExecutor,
    source: &Path,
    start: TimeOffset,
    duration: TimeOffset,
    output: &Path,
) -> Result<VideoInfo, MediaError> {
    let result = executor
        .run_ffmpeg_cut(
            source,
            &start.as_ffmpeg_arg(),
            &duration.as_ffmpeg_arg(),
            output,
        )
        .await
        .map_err(|source| MediaError::Spawn {
            tool: "ffmpeg",
            source,
        })?;

    if !result.status.success() {
        return Err(MediaError::ToolFailed {
            tool: "ffmpeg",
            stderr: String::from_utf8_lossy(&result.stderr).into_owned(),
        });
    }

    probe_video(executor, output).await
}

/// Join already-cut intermediates, in the exact order given, into `output`
/// via the concat demuxer. Returns the probed total duration and facts.
pub async fn concat_files(
    executor: &impl MediaExecutor,
    inputs: &[impl AsRef<Path>],
    list_file: &Path,
    output: &Path,
) -> Result<VideoInfo, MediaError> {
    let mut list = String::new();
    for input in inputs {
        // concat-demuxer entry; single quotes in paths are escaped as '\''.
        let path = input.as_ref().display().to_string().replace('\'', r"'\''");
        list.push_str(&format!("file '{}'\n", path));
    }
    tokio::fs::write(list_file, list).await?;

    let result = executor
        .run_ffmpeg_concat(list_file, output)
        .await
        .map_err(|source| MediaError::Spawn {
            tool: "ffmpeg",
            source,
        })?;

    if !result.status.success() {
        return Err(MediaError::ToolFailed {
            tool: "ffmpeg",
            stderr: String::from_utf8_lossy(&result.stderr).into_owned(),
        });
    }

    probe_video(executor, output).await
}

/// Grab a single frame at `timestamp` into `output` (JPEG).
pub async fn grab_thumbnail(
    executor: &impl MediaExecutor,
    source: &Path,
    timestamp: TimeOffset,
    output: &Path,
) -> Result<(), MediaError> {
    let result = executor
        .run_ffmpeg_thumbnail(source, &timestamp.as_ffmpeg_arg(), output)
        .await
        .map_err(|source| MediaError::Spawn {
            tool: "ffmpeg",
            source,
        })?;

    if !result.status.success() {
        return Err(MediaError::ToolFailed {
            tool: "ffmpeg",
            stderr: String::from_utf8_lossy(&result.stderr).into_owned(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::cmd::MockMediaExecutor;
    use std::io;
    use std::os::unix::process::ExitStatusExt;
    use std::path::PathBuf;
    use std::process::{ExitStatus, Output};
    use tempfile::tempdir;

    fn mock_output(stdout: &str, stderr: &str, success: bool) -> Output {
        Output {
            status: if success {
                ExitStatus::from_raw(0)
            } else {
                ExitStatus::from_raw(1)
            },
            stdout: stdout.as_bytes().to_vec(),
            stderr: stderr.as_bytes().to_vec(),
        }
    }

    fn probe_json(duration: &str) -> String {
        format!(
            r#"{{"streams": [{{"codec_type": "video", "codec_name": "h264",
                "width": 1280, "height": 720, "avg_frame_rate": "30/1"}}],
                "format": {{"duration": "{}"}}}}"#,
            duration
        )
    }

    #[tokio::test]
    async fn cut_passes_millisecond_args_and_probes_the_result() {
        let mut executor = MockMediaExecutor::new();
        let source = PathBuf::from("/tmp/source.mp4");
        let output = PathBuf::from("/tmp/clip.mp4");
        let expected_output = output.clone();

        executor
            .expect_run_ffmpeg_cut()
            .withf(move |input, start, duration, out| {
                input == Path::new("/tmp/source.mp4")
                    && start == "1.234"
                    && duration == "1.333"
                    && out == expected_output
            })
            .times(1)
            .returning(|_, _, _, _| {
                let out = mock_output("", "", true);
                Box::pin(async move { Ok(out) })
            });
        executor
            .expect_run_ffprobe()
            .times(1)
            .returning(|_| {
                let out = mock_output(&probe_json("1.333"), "", true);
                Box::pin(async move { Ok(out) })
            });

        let info = cut_clip(
            &executor,
            &source,
            TimeOffset::from_millis(1234),
            TimeOffset::from_millis(1333),
            &output,
        )
        .await
        .unwrap();
        assert_eq!(info.duration, TimeOffset::from_millis(1333));
        assert_eq!(info.codec, "h264");
    }

    #[tokio::test]
    async fn cut_failure_carries_the_tool_diagnostic() {
        let mut executor = MockMediaExecutor::new();
        executor
            .expect_run_ffmpeg_cut()
            .times(1)
            .returning(|_, _, _, _| {
                let out = mock_output("", "Invalid data found when processing input", false);
                Box::pin(async move { Ok(out) })
            });
        executor.expect_run_ffprobe().times(0);

        let err = cut_clip(
            &executor,
            Path::new("/tmp/corrupt.mp4"),
            TimeOffset::ZERO,
            TimeOffset::from_millis(500),
            Path::new("/tmp/out.mp4"),
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("Invalid data found"));
    }

    #[tokio::test]
    async fn cut_spawn_error_is_fatal() {
        let mut executor = MockMediaExecutor::new();
        executor
            .expect_run_ffmpeg_cut()
            .times(1)
            .returning(|_, _, _, _| {
                Box::pin(async move {
                    Err(io::Error::new(io::ErrorKind::NotFound, "ffmpeg not found"))
                })
            });

        let err = cut_clip(
            &executor,
            Path::new("/tmp/source.mp4"),
            TimeOffset::ZERO,
            TimeOffset::from_millis(500),
            Path::new("/tmp/out.mp4"),
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("ffmpeg"));
    }

    #[tokio::test]
    async fn concat_list_preserves_caller_order() {
        let dir = tempdir().unwrap();
        let list_file = dir.path().join("concat.txt");
        let output = dir.path().join("merged.mp4");
        let inputs = vec![
            dir.path().join("clip_000.mp4"),
            dir.path().join("clip_001.mp4"),
            dir.path().join("clip_002.mp4"),
        ];

        let mut executor = MockMediaExecutor::new();
        let expected_list = list_file.clone();
        executor
            .expect_run_ffmpeg_concat()
            .withf(move |list, _| list == expected_list)
            .times(1)
            .returning(|list, _| {
                // The list must already be on disk, in submission order.
                let content = std::fs::read_to_string(list).unwrap();
                let lines: Vec<&str> = content.lines().collect();
                assert_eq!(lines.len(), 3);
                assert!(lines[0].contains("clip_000.mp4"));
                assert!(lines[1].contains("clip_001.mp4"));
                assert!(lines[2].contains("clip_002.mp4"));
                let out = mock_output("", "", true);
                Box::pin(async move { Ok(out) })
            });
        executor
            .expect_run_ffprobe()
            .times(1)
            .returning(|_| {
                let out = mock_output(&probe_json("2.500"), "", true);
                Box::pin(async move { Ok(out) })
            });

        let info = concat_files(&executor, &inputs, &list_file, &output)
            .await
            .unwrap();
        assert_eq!(info.duration, TimeOffset::from_millis(2500));
    }

    #[tokio::test]
    async fn concat_failure_is_fatal() {
        let dir = tempdir().unwrap();
        let list_file = dir.path().join("concat.txt");
        let inputs = vec![dir.path().join("clip_000.mp4")];

        let mut executor = MockMediaExecutor::new();
        executor
            .expect_run_ffmpeg_concat()
            .times(1)
            .returning(|_, _| {
                let out = mock_output("", "could not open file", false);
                Box::pin(async move { Ok(out) })
            });
        executor.expect_run_ffprobe().times(0);

        let err = concat_files(&executor, &inputs, &list_file, &dir.path().join("merged.mp4"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("could not open file"));
    }
}
