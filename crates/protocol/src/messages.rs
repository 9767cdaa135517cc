//! Protocol message definitions for WebMux.
//!
//! This module defines the request and response payloads exchanged with the
//! remote execution backend, plus the endpoint paths they travel on. All
//! payloads are serialized as JSON.

use serde::{Deserialize, Serialize};

/// Path of the session-creation endpoint, relative to the backend base URL.
pub fn create_session_path() -> &'static str {
    "/api/terminal/create"
}

/// Path of the command-execution endpoint for a given session, relative to
/// the backend base URL.
pub fn execute_path(session_id: &str) -> String {
    format!("/api/terminal/{session_id}/execute")
}

/// Response confirming session creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateSessionResponse {
    /// Opaque session identifier issued by the backend.
    pub session_id: String,
}

/// Request to execute a command in an existing session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecuteRequest {
    /// The literal command text to run.
    pub command: String,
}

/// Response carrying the textual output of an executed command.
///
/// The output may be empty or span multiple newline-delimited lines; a
/// missing field is treated as empty output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecuteResponse {
    /// Raw command output, newline-delimited.
    #[serde(default)]
    pub output: String,
}
