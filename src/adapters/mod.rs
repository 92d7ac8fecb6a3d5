//! Adapters - Concrete implementations of ports and the inbound HTTP API.

pub mod fs;
pub mod http;
