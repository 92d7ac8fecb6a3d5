//! CloudClip - Clip/Merge Task Engine
//!
//! Hexagonal Architecture:
//! - domain/: Pure business logic (time model, clip specs, tasks, precision)
//! - media/: ffmpeg/ffprobe pipeline behind a mockable subprocess seam
//! - ports/: Trait definitions
//! - adapters/: Concrete implementations (filesystem storage, HTTP API)
//! - application/: Task registry and orchestration
//! - config: Environment configuration

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod media;
pub mod ports;

// Wiring surface for the binary and embedding consumers.
pub use adapters::fs::FsStorage;
pub use application::service::TaskService;
pub use config::Config;
pub use domain::precision::PrecisionPolicy;
pub use media::cmd::RealMediaExecutor;
