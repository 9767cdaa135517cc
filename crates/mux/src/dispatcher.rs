//! Command dispatch: built-ins, remote execution, and reconciliation.
//!
//! Submissions are fire-and-forget from the editor's point of view.
//! Built-ins execute locally and synchronously and never contact the
//! backend. Everything else goes through one FIFO worker per session, so
//! a session never has two requests in flight and results land in the
//! order their requests were issued. Distinct sessions are fully
//! independent.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::backend::CommandBackend;
use crate::display::DisplaySurface;
use crate::error::MuxError;
use crate::multiplexer::MuxEvent;
use crate::session::{SessionId, SessionRegistry};

/// Fixed reference written by the `help` built-in.
const HELP_TEXT: &[&str] = &[
    "Available commands:",
    "  help   - Show this help message",
    "  clear  - Clear the visible terminal output",
    "",
    "Anything else is executed on the remote backend.",
];

/// Result of one remote execution, routed back to the owning session.
#[derive(Debug)]
pub struct Completion {
    pub session_id: SessionId,
    pub result: Result<String, MuxError>,
}

/// Decides built-in vs. remote and reconciles responses into the display.
pub struct Dispatcher {
    backend: Arc<dyn CommandBackend>,
    events: mpsc::UnboundedSender<MuxEvent>,
    queues: DashMap<SessionId, mpsc::UnboundedSender<String>>,
}

impl Dispatcher {
    /// Creates a dispatcher that reports completions on `events`.
    pub fn new(backend: Arc<dyn CommandBackend>, events: mpsc::UnboundedSender<MuxEvent>) -> Self {
        Self {
            backend,
            events,
            queues: DashMap::new(),
        }
    }

    /// Handles one submitted command for a session.
    ///
    /// Built-ins complete before this returns, prompt included. Remote
    /// commands are queued; their results surface later as
    /// [`Completion`] events.
    pub fn dispatch(&self, surface: &mut DisplaySurface, session_id: &SessionId, text: &str) {
        match text {
            "help" => {
                for line in HELP_TEXT {
                    surface.write_output(session_id, line);
                }
                surface.show_prompt(session_id);
            }
            "clear" => {
                surface.clear(session_id);
                surface.show_prompt(session_id);
            }
            _ => self.enqueue_remote(session_id, text),
        }
    }

    /// Applies a remote completion to the owning session's transcript.
    ///
    /// Results for sessions no longer in the registry are discarded
    /// silently. On success, output is split on newlines with blank lines
    /// dropped; on failure a single error line is written. The prompt is
    /// re-shown in every surviving case (fail-open: the session is never
    /// left silently waiting).
    pub fn apply_completion(
        &self,
        surface: &mut DisplaySurface,
        registry: &SessionRegistry,
        completion: Completion,
    ) {
        let Completion { session_id, result } = completion;

        if !registry.contains(&session_id) {
            let stale = MuxError::StaleSessionResult(session_id);
            tracing::debug!(error = %stale, "Discarding remote result");
            return;
        }

        match result {
            Ok(output) => {
                for line in output.split('\n') {
                    if !line.trim().is_empty() {
                        surface.write_output(&session_id, line);
                    }
                }
            }
            Err(err) => {
                surface.write_error(&session_id, &error_line(&err));
            }
        }

        surface.show_prompt(&session_id);
    }

    /// Drops the command queue of a closed session.
    ///
    /// An in-flight request still completes; its result is discarded by
    /// [`apply_completion`](Dispatcher::apply_completion).
    pub fn forget(&self, session_id: &SessionId) {
        if self.queues.remove(session_id).is_some() {
            tracing::debug!(session_id = %session_id, "Dropped command queue for closed session");
        }
    }

    fn enqueue_remote(&self, session_id: &SessionId, command: &str) {
        let sender = self
            .queues
            .entry(session_id.clone())
            .or_insert_with(|| self.spawn_worker(session_id.clone()))
            .clone();

        if sender.send(command.to_string()).is_err() {
            // The worker died with the engine's event channel; nothing
            // left to deliver results to.
            tracing::debug!(session_id = %session_id, "Command queue closed; dropping submission");
        }
    }

    /// Spawns the per-session FIFO worker. Each command is sent only
    /// after the previous one's response or failure has been reported.
    fn spawn_worker(&self, session_id: SessionId) -> mpsc::UnboundedSender<String> {
        let (tx, mut rx) = mpsc::unbounded_channel::<String>();
        let backend = Arc::clone(&self.backend);
        let events = self.events.clone();

        tokio::spawn(async move {
            while let Some(command) = rx.recv().await {
                let request_id = Uuid::new_v4();
                tracing::debug!(
                    session_id = %session_id,
                    request_id = %request_id,
                    command = %command,
                    "Executing remote command"
                );

                let result = backend
                    .execute(&session_id, &command)
                    .await
                    .map_err(MuxError::ExecutionFailed);

                if let Err(ref err) = result {
                    tracing::warn!(
                        session_id = %session_id,
                        request_id = %request_id,
                        error = %err,
                        "Remote execution failed"
                    );
                }

                let completion = Completion {
                    session_id: session_id.clone(),
                    result,
                };
                if events.send(MuxEvent::Completion(completion)).is_err() {
                    break;
                }
            }
            tracing::debug!(session_id = %session_id, "Command worker ended");
        });

        tx
    }
}

/// Transcript wording for a failed execution.
fn error_line(err: &MuxError) -> String {
    use crate::backend::BackendError;

    match err {
        MuxError::ExecutionFailed(BackendError::Status(_)) => "Error executing command".to_string(),
        MuxError::ExecutionFailed(inner) => format!("Command failed: {inner}"),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::testing::StubBackend;
    use crate::backend::BackendError;
    use crate::display::DisplayLine;
    use crate::resize::ViewportSize;

    fn fixture() -> (
        Arc<StubBackend>,
        Dispatcher,
        mpsc::UnboundedReceiver<MuxEvent>,
        DisplaySurface,
    ) {
        let backend = Arc::new(StubBackend::new());
        let (tx, rx) = mpsc::unbounded_channel();
        let dispatcher = Dispatcher::new(Arc::clone(&backend) as Arc<dyn CommandBackend>, tx);
        let surface = DisplaySurface::new("~/workspace", ViewportSize::default(), 1000);
        (backend, dispatcher, rx, surface)
    }

    async fn registry_with_session(backend: &StubBackend) -> (SessionRegistry, SessionId) {
        let mut registry = SessionRegistry::new();
        let id = registry.create_session(backend).await.unwrap();
        (registry, id)
    }

    #[tokio::test]
    async fn test_help_never_contacts_backend() {
        let (backend, dispatcher, _rx, mut surface) = fixture();
        let id = "s1".to_string();

        dispatcher.dispatch(&mut surface, &id, "help");

        assert_eq!(backend.execute_calls(), 0);
        let first = surface.render_lines(&id).first().cloned();
        assert_eq!(first, Some("Available commands:".to_string()));
        assert_eq!(surface.live_input(&id), Some(""));
    }

    #[tokio::test]
    async fn test_clear_never_contacts_backend() {
        let (backend, dispatcher, _rx, mut surface) = fixture();
        let id = "s1".to_string();
        surface.activate(&id);
        surface.write_output(&id, "old output");
        surface.seal_line(&id);

        dispatcher.dispatch(&mut surface, &id, "clear");

        assert_eq!(backend.execute_calls(), 0);
        assert!(surface.transcript(&id).is_empty());
        assert_eq!(surface.live_input(&id), Some(""));
    }

    #[tokio::test]
    async fn test_remote_output_drops_blank_lines() {
        let (backend, dispatcher, mut rx, mut surface) = fixture();
        let (registry, id) = registry_with_session(&backend).await;
        backend.set_output("echo hi", "hi\n\n").await;

        dispatcher.dispatch(&mut surface, &id, "echo hi");
        let event = rx.recv().await.unwrap();
        let MuxEvent::Completion(completion) = event else {
            panic!("expected completion");
        };
        dispatcher.apply_completion(&mut surface, &registry, completion);

        let output: Vec<_> = surface
            .transcript(&id)
            .iter()
            .filter(|l| matches!(l, DisplayLine::Output(_)))
            .collect();
        assert_eq!(output, vec![&DisplayLine::Output("hi".to_string())]);
        assert_eq!(surface.live_input(&id), Some(""));
    }

    #[tokio::test]
    async fn test_remote_failure_writes_one_error_line_and_prompt() {
        let (backend, dispatcher, mut rx, mut surface) = fixture();
        let (registry, id) = registry_with_session(&backend).await;
        backend.fail_execute();

        dispatcher.dispatch(&mut surface, &id, "echo hi");
        let MuxEvent::Completion(completion) = rx.recv().await.unwrap() else {
            panic!("expected completion");
        };
        dispatcher.apply_completion(&mut surface, &registry, completion);

        let errors: Vec<_> = surface
            .transcript(&id)
            .iter()
            .filter(|l| matches!(l, DisplayLine::Error(_)))
            .collect();
        assert_eq!(
            errors,
            vec![&DisplayLine::Error(
                "Command failed: connection reset".to_string()
            )]
        );
        assert_eq!(surface.live_input(&id), Some(""));
    }

    #[tokio::test]
    async fn test_stale_completion_discarded_silently() {
        let (backend, dispatcher, mut rx, mut surface) = fixture();
        let (mut registry, id) = registry_with_session(&backend).await;

        dispatcher.dispatch(&mut surface, &id, "pwd");
        let MuxEvent::Completion(completion) = rx.recv().await.unwrap() else {
            panic!("expected completion");
        };

        // Session closes before the result is applied.
        registry.close_session(&id);
        dispatcher.forget(&id);
        dispatcher.apply_completion(&mut surface, &registry, completion);

        assert!(surface.transcript(&id).is_empty());
        assert_eq!(surface.live_input(&id), None);
    }

    #[tokio::test]
    async fn test_per_session_requests_are_serialized() {
        let (backend, dispatcher, mut rx, mut surface) = fixture();
        let (registry, id) = registry_with_session(&backend).await;
        let gate = backend.gate("slow").await;

        dispatcher.dispatch(&mut surface, &id, "slow");
        dispatcher.dispatch(&mut surface, &id, "fast");

        // The first request is gated; the second must not be sent yet, so
        // no completion can arrive.
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert!(rx.try_recv().is_err());
        assert_eq!(backend.execute_calls(), 1);

        gate.notify_one();

        let MuxEvent::Completion(first) = rx.recv().await.unwrap() else {
            panic!("expected completion");
        };
        let MuxEvent::Completion(second) = rx.recv().await.unwrap() else {
            panic!("expected completion");
        };
        dispatcher.apply_completion(&mut surface, &registry, first);
        dispatcher.apply_completion(&mut surface, &registry, second);

        assert_eq!(surface.render_lines(&id), vec!["ran: slow", "ran: fast"]);
    }

    #[tokio::test]
    async fn test_sessions_execute_independently() {
        let (backend, dispatcher, mut rx, mut surface) = fixture();
        let mut registry = SessionRegistry::new();
        let first = registry.create_session(&*backend).await.unwrap();
        let second = registry.create_session(&*backend).await.unwrap();
        let gate = backend.gate("blocked").await;

        dispatcher.dispatch(&mut surface, &first, "blocked");
        dispatcher.dispatch(&mut surface, &second, "free");

        // The second session's request completes while the first is still
        // in flight.
        let MuxEvent::Completion(completion) = rx.recv().await.unwrap() else {
            panic!("expected completion");
        };
        assert_eq!(completion.session_id, second);
        dispatcher.apply_completion(&mut surface, &registry, completion);
        assert_eq!(surface.render_lines(&second), vec!["ran: free"]);

        gate.notify_one();
        let MuxEvent::Completion(completion) = rx.recv().await.unwrap() else {
            panic!("expected completion");
        };
        assert_eq!(completion.session_id, first);
    }

    #[test]
    fn test_error_line_wording() {
        assert_eq!(
            error_line(&MuxError::ExecutionFailed(BackendError::Status(500))),
            "Error executing command"
        );
        assert_eq!(
            error_line(&MuxError::ExecutionFailed(BackendError::Transport(
                "connection refused".to_string()
            ))),
            "Command failed: connection refused"
        );
        assert_eq!(
            error_line(&MuxError::ExecutionFailed(BackendError::Decode(
                "expected value".to_string()
            ))),
            "Command failed: malformed response: expected value"
        );
    }
}
