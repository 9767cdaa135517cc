//! Error taxonomy for the multiplexer core.
//!
//! Every failure in this crate is recovered at the dispatcher boundary and
//! converted into either a transcript line or a silent drop; nothing here
//! propagates far enough to crash the event loop or the registry.

use thiserror::Error;

use crate::backend::BackendError;
use crate::session::SessionId;

/// Errors surfaced by the multiplexer core.
#[derive(Debug, Error)]
pub enum MuxError {
    /// The session-creation call failed; no session was registered.
    /// The caller may retry.
    #[error("backend unavailable: {0}")]
    BackendUnavailable(BackendError),

    /// A remote execute call failed or returned a non-success outcome.
    /// Surfaced as a single error line in the owning session's transcript;
    /// never fatal.
    #[error("command execution failed: {0}")]
    ExecutionFailed(BackendError),

    /// A response arrived for a session no longer present in the registry.
    /// Discarded silently; never written to any transcript.
    #[error("stale result for closed session {0}")]
    StaleSessionResult(SessionId),
}
