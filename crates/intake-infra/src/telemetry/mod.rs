//! Telemetry initialization
//!
//! Structured logging through `tracing`, formatted as text or JSON.

mod init_basic;

pub use init_basic::{init_telemetry, shutdown_telemetry};
