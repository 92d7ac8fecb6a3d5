//! Application layer - Task registry and orchestration over the ports.

pub mod service;
pub mod tasks;
