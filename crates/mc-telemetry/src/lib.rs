//! Logging and span helpers shared by the mission-control binaries.
//!
//! - **Logging**: human-readable or JSON output via `tracing-subscriber`,
//!   written to stderr so stdout stays free for snapshot JSON.
//! - **Spans**: per-operation spans tagged with a random trace id for
//!   correlating the log lines of one aggregation pass.

pub mod logging;
pub mod spans;
