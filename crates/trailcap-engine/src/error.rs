use crate::protocol::TabId;
use thiserror::Error;

/// Failure modes of the capture core. None of them aborts a session: every
/// variant has a degraded-but-valid outcome at the call site.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CaptureError {
    #[error("Already recording.")]
    DuplicateStart,

    #[error("Not recording.")]
    NotRecording,

    #[error("Event from unexpected tab {actual} (expected {expected})")]
    WrongTarget { expected: TabId, actual: TabId },

    #[error("Unknown transaction: {0}")]
    UnknownTransaction(String),

    #[error("Timeline index {0} does not reference an interaction")]
    IndexOutOfRange(usize),

    #[error("Id cannot be used as a direct lookup: {0:?}")]
    MalformedLocatorInput(String),

    #[error("Request body is not valid text")]
    BodyDecodeFailure,
}
