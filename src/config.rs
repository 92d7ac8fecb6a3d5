//! Configuration for the clip/merge engine.

use crate::domain::clip::EngineLimits;
use crate::domain::time::TimeOffset;
use std::env;

#[derive(Clone, Debug)]
pub struct Config {
    /// HTTP server bind address
    pub addr: String,
    /// HTTP server port
    pub port: String,
    /// Root directory the storage adapter resolves keys under
    pub storage_root: String,
    /// Base URL prefixed to stored keys in task output URLs
    pub public_base_url: String,
    /// Minimum clip duration in milliseconds
    pub min_clip_duration_ms: u64,
    /// Maximum number of clips per merge request
    pub max_merge_clips: usize,
    /// Hard per-task timeout in seconds
    pub task_timeout_secs: u64,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();

        Self {
            addr: env::var("ADDR").unwrap_or_else(|_| String::from("127.0.0.1")),
            port: env::var("PORT").unwrap_or_else(|_| String::from("3000")),
            storage_root: env::var("STORAGE_ROOT").unwrap_or_else(|_| String::from("./media")),
            public_base_url: env::var("PUBLIC_BASE_URL")
                .unwrap_or_else(|_| String::from("http://localhost:3000/media")),
            min_clip_duration_ms: env::var("MIN_CLIP_DURATION_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(100),
            max_merge_clips: env::var("MAX_MERGE_CLIPS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(200),
            task_timeout_secs: env::var("TASK_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(1800),
        }
    }

    pub fn limits(&self) -> EngineLimits {
        EngineLimits {
            min_clip_duration: TimeOffset::from_millis(self.min_clip_duration_ms),
            max_merge_clips: self.max_merge_clips,
        }
    }
}
