use async_trait::async_trait;
use std::io;
use std::path::Path;
use std::process::Output;
use tokio::process::Command as TokioCommand;

/// Subprocess seam around the ffmpeg/ffprobe toolchain. Everything that
/// spawns a process goes through this trait so the pipeline can be tested
/// against a deterministic mock.
#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait MediaExecutor: Send + Sync {
    /// Precise re-encode cut of [start, start+duration) from `input`.
    /// `start` and `duration` are `S.mmm` second strings.
    async fn run_ffmpeg_cut(
        &self,
        input: &Path,
        start: &str,
        duration: &str,
        output: &Path,
    ) -> io::Result<Output>;

    /// Concat-demuxer join of the files listed in `list_file`.
    async fn run_ffmpeg_concat(&self, list_file: &Path, output: &Path) -> io::Result<Output>;

    /// Single-frame JPEG grab at `timestamp` (an `S.mmm` second string).
    async fn run_ffmpeg_thumbnail(
        &self,
        input: &Path,
        timestamp: &str,
        output: &Path,
    ) -> io::Result<Output>;

    /// JSON probe of format and stream facts.
    async fn run_ffprobe(&self, media_path: &Path) -> io::Result<Output>;
}

pub struct RealMediaExecutor;

impl RealMediaExecutor {
    /// Every child is killed when its `output()` future is dropped, so a
    /// worker cancelled by the hard task timeout cannot leave an orphan
    /// ffmpeg re-encoding into an already-removed temp dir.
    fn command(program: &str) -> TokioCommand {
        let mut command = TokioCommand::new(program);
        command.kill_on_drop(true);
        command
    }
}

#[async_trait]
impl MediaExecutor for RealMediaExecutor {
    async fn run_ffmpeg_cut(
        &self,
        input: &Path,
        start: &str,
        duration: &str,
        output: &Path,
    ) -> io::Result<Output> {
        // -ss before -i with a full re-encode gives time-based seeking;
        // stream-copy would snap to keyframes and lose millisecond accuracy.
        Self::command("ffmpeg")
            .arg("-y")
            .arg("-loglevel").arg("error")
            .arg("-ss").arg(start)
            .arg("-i").arg(input)
            .arg("-t").arg(duration)
            .arg("-c:v").arg("libx264")
            .arg("-preset").arg("veryfast")
            .arg("-c:a").arg("aac")
            .arg("-avoid_negative_ts").arg("make_zero")
            .arg("-movflags").arg("+faststart")
            .arg(output)
            .output()
            .await
    }

    async fn run_ffmpeg_concat(&self, list_file: &Path, output: &Path) -> io::Result<Output> {
        // The intermediates were already re-encoded to a common codec and
        // timebase by the cut step, so a demuxer-level copy join does not
        // shift timing.
        Self::command("ffmpeg")
            .arg("-y")
            .arg("-loglevel").arg("error")
            .arg("-f").arg("concat")
            .arg("-safe").arg("0")
            .arg("-i").arg(list_file)
            .arg("-c").arg("copy")
            .arg("-movflags").arg("+faststart")
            .arg(output)
            .output()
            .await
    }

    async fn run_ffmpeg_thumbnail(
        &self,
        input: &Path,
        timestamp: &str,
        output: &Path,
    ) -> io::Result<Output> {
        Self::command("ffmpeg")
            .arg("-y")
            .arg("-loglevel").arg("error")
            .arg("-ss").arg(timestamp)
            .arg("-i").arg(input)
            .arg("-vframes").arg("1")
            .arg("-q:v").arg("2")
            .arg(output)
            .output()
            .await
    }

    async fn run_ffprobe(&self, media_path: &Path) -> io::Result<Output> {
        Self::command("ffprobe")
            .arg("-v").arg("error")
            .arg("-print_format").arg("json")
            .arg("-show_format")
            .arg("-show_streams")
            .arg(media_path)
            .output()
            .await
    }
}
