//! HTTP implementation of the remote execution backend.
//!
//! Speaks the REST contract from the `protocol` crate: JSON bodies over
//! `POST`, session ids embedded in the execute path. No timeout is applied
//! here; the backend's own timeout behavior is opaque to the core.

use async_trait::async_trait;
use protocol::messages::{
    create_session_path, execute_path, CreateSessionResponse, ExecuteRequest, ExecuteResponse,
};

use super::{BackendError, CommandBackend};
use crate::session::SessionId;

/// Backend client for an HTTP execution service.
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
}

impl HttpBackend {
    /// Creates a client for the backend rooted at `base_url`.
    ///
    /// A trailing slash on the base URL is tolerated.
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client: reqwest::Client::new(),
            base_url,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl CommandBackend for HttpBackend {
    async fn create_session(&self) -> Result<SessionId, BackendError> {
        let response = self
            .client
            .post(self.url(create_session_path()))
            .send()
            .await
            .map_err(|e| BackendError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(BackendError::Status(status.as_u16()));
        }

        let body: CreateSessionResponse = response
            .json()
            .await
            .map_err(|e| BackendError::Decode(e.to_string()))?;

        tracing::debug!(session_id = %body.session_id, "Backend created session");
        Ok(body.session_id)
    }

    async fn execute(
        &self,
        session_id: &SessionId,
        command: &str,
    ) -> Result<String, BackendError> {
        let request = ExecuteRequest {
            command: command.to_string(),
        };

        let response = self
            .client
            .post(self.url(&execute_path(session_id)))
            .json(&request)
            .send()
            .await
            .map_err(|e| BackendError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(BackendError::Status(status.as_u16()));
        }

        let body: ExecuteResponse = response
            .json()
            .await
            .map_err(|e| BackendError::Decode(e.to_string()))?;

        Ok(body.output)
    }
}
