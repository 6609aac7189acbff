//! Error taxonomy shared across the pipeline and control plane (spec §7).

use thiserror::Error;

/// Top-level error taxonomy surfaced to operators and RTSP responses.
///
/// Every fallible boundary in the core converges to one of these variants
/// rather than using exceptions for control flow (REDESIGN FLAGS).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// Unspecified non-recoverable failure.
    #[error("failed")]
    Failed,

    /// Operation refused because the target is already in the requested state.
    #[error("already in requested state")]
    Already,

    /// Caller-supplied parameter malformed or out of range.
    #[error("invalid parameter: {0}")]
    ParamInvalid(String),

    /// Operation not permitted in the current state.
    #[error("invalid state for this operation")]
    InvalidState,

    /// No active peer.
    #[error("not connected")]
    NotConnected,

    /// Link layer not up yet.
    #[error("not ready")]
    NotReady,

    /// Previous operation not yet complete.
    #[error("operation already in progress")]
    InProgress,

    /// Awaited response did not arrive in time.
    #[error("timed out")]
    Timeout,

    /// TCP or UDP endpoint signaled EOF.
    #[error("remote closed connection")]
    RemoteClosedConnection,
}

impl Error {
    /// `true` for success is represented by `Result::Ok`; this helper exists
    /// for call sites that map a boolean sink back into the taxonomy.
    #[must_use]
    pub fn from_failed(failed: bool) -> Option<Self> {
        failed.then_some(Self::Failed)
    }
}
