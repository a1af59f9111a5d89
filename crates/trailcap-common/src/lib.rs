pub mod protocol;
pub mod timeline;

/// Milliseconds since the Unix epoch.
pub type Timestamp = u64;
