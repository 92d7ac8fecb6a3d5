//! Media processing pipeline: subprocess seams, probing, cut/concat.

pub mod cmd;
pub mod pipeline;
pub mod probe;

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Fatal pipeline errors. The raw tool diagnostic is preserved so it can be
/// surfaced verbatim in the failed task record.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("failed to launch {tool}: {source}")]
    Spawn {
        tool: &'static str,
        source: io::Error,
    },
    #[error("{tool} failed: {stderr}")]
    ToolFailed {
        tool: &'static str,
        stderr: String,
    },
    #[error("unreadable probe output for {path}: {detail}")]
    BadProbe { path: PathBuf, detail: String },
    #[error(transparent)]
    Io(#[from] io::Error),
}
