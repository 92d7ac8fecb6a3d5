//! Domain layer - Pure business logic.

pub mod clip;
pub mod precision;
pub mod task;
pub mod time;
