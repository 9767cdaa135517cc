//! Remote execution backend interface.
//!
//! The multiplexer core never runs commands itself; everything that is not
//! a built-in is handed to a backend implementing [`CommandBackend`]. The
//! production implementation speaks the REST contract defined in the
//! `protocol` crate; tests substitute scripted stand-ins.

mod http;

pub use http::HttpBackend;

use async_trait::async_trait;
use thiserror::Error;

use crate::session::SessionId;

/// Errors returned by a backend call.
///
/// The core treats any of these uniformly as "the call did not succeed";
/// the variants only drive logging and the wording of the error line
/// written to the transcript.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BackendError {
    /// The backend answered with a non-success status code.
    #[error("backend returned status {0}")]
    Status(u16),

    /// The request never completed (connection, DNS, I/O).
    #[error("{0}")]
    Transport(String),

    /// The response body could not be decoded.
    #[error("malformed response: {0}")]
    Decode(String),
}

/// Interface to the remote execution backend.
///
/// Implementations must be safe to share across the dispatcher's
/// per-session worker tasks.
#[async_trait]
pub trait CommandBackend: Send + Sync {
    /// Requests a new session from the backend.
    ///
    /// Returns the opaque session identifier the backend issued. A failure
    /// here means no session is registered.
    async fn create_session(&self) -> Result<SessionId, BackendError>;

    /// Executes `command` in the given session and returns its raw output.
    ///
    /// The output may be empty or newline-delimited multi-line text.
    async fn execute(&self, session_id: &SessionId, command: &str)
        -> Result<String, BackendError>;
}
