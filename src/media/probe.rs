//! ffprobe JSON parsing.
//!
//! The pipeline never trusts a requested duration; every produced file is
//! probed and the measured value is what flows into task metadata.

use crate::domain::task::VideoInfo;
use crate::domain::time::TimeOffset;
use crate::media::cmd::MediaExecutor;
use crate::media::MediaError;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: Option<FfprobeFormat>,
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: Option<String>,
    codec_name: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    avg_frame_rate: Option<String>,
}

/// Probe duration, resolution, codec and frame rate of a media file.
pub async fn probe_video(
    executor: &impl MediaExecutor,
    path: &Path,
) -> Result<VideoInfo, MediaError> {
    let output = executor
        .run_ffprobe(path)
        .await
        .map_err(|source| MediaError::Spawn {
            tool: "ffprobe",
            source,
        })?;

    if !output.status.success() {
        return Err(MediaError::ToolFailed {
            tool: "ffprobe",
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        });
    }

    parse_probe_output(&output.stdout, path)
}

fn parse_probe_output(stdout: &[u8], path: &Path) -> Result<VideoInfo, MediaError> {
    let bad_probe = |detail: String| MediaError::BadProbe {
        path: path.to_path_buf(),
        detail,
    };

    let parsed: FfprobeOutput = serde_json::from_slice(stdout)
        .map_err(|e| bad_probe(format!("unparsable ffprobe json: {}", e)))?;

    let duration_str = parsed
        .format
        .and_then(|f| f.duration)
        .ok_or_else(|| bad_probe("no format.duration field".to_string()))?;
    let duration_secs: f64 = duration_str
        .trim()
        .parse()
        .map_err(|e| bad_probe(format!("bad duration {:?}: {}", duration_str, e)))?;
    let duration = TimeOffset::from_secs_f64(duration_secs)
        .map_err(|e| bad_probe(format!("bad duration {:?}: {}", duration_str, e)))?;

    let video = parsed
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .ok_or_else(|| bad_probe("no video stream".to_string()))?;

    Ok(VideoInfo {
        duration,
        width: video.width.unwrap_or(0),
        height: video.height.unwrap_or(0),
        codec: video
            .codec_name
            .clone()
            .unwrap_or_else(|| "unknown".to_string()),
        fps: video
            .avg_frame_rate
            .as_deref()
            .and_then(parse_frame_rate)
            .unwrap_or(0.0),
    })
}

/// ffprobe reports frame rate as a fraction such as `30000/1001`.
fn parse_frame_rate(s: &str) -> Option<f64> {
    match s.split_once('/') {
        Some((num, den)) => {
            let num: f64 = num.parse().ok()?;
            let den: f64 = den.parse().ok()?;
            if den == 0.0 {
                None
            } else {
                Some(num / den)
            }
        }
        None => s.parse().ok(),
    }
}
