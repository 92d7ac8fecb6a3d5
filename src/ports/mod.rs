//! Ports - Trait definitions for external collaborators.

pub mod storage;
