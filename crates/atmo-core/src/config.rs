//! Compile-time constants shared by every frontend of the node.

/// Subtopic that sensor readings are published to. The transport prepends
/// its own topic prefix, so the full topic is `<prefix>/readings`.
pub const READINGS_SUBTOPIC: &str = "readings";

/// Pause between the end of one sampling cycle and the start of the next,
/// in milliseconds.
pub const SAMPLE_INTERVAL_MS: u32 = 10_000;
