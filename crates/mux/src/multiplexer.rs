//! The multiplexer engine: one event loop over all sessions.
//!
//! Every external stimulus enters as a [`MuxEvent`] on a single channel
//! and is processed to completion before the next is taken, so editor
//! transitions never run in parallel. The only suspension points are the
//! backend calls; command execution suspends on per-session workers (its
//! results come back as completion events), session creation suspends the
//! loop itself.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::backend::CommandBackend;
use crate::dispatcher::{Completion, Dispatcher};
use crate::display::DisplaySurface;
use crate::editor::{KeyEvent, KeyOutcome, LineEditor};
use crate::history::CommandHistory;
use crate::resize::{ResizeCoordinator, ViewportSize};
use crate::session::{SessionId, SessionRegistry};

/// Session-control and lifecycle actions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlAction {
    /// Create a new session via the backend and make it active.
    CreateSession,
    /// Make the given session active; unknown ids are a silent no-op.
    SelectSession(SessionId),
    /// Close the given session.
    CloseSession(SessionId),
    /// Close the active session, if any.
    CloseActive,
    /// Make the next session (in sequence order, wrapping) active.
    CycleSession,
    /// Manual fit action, independent of a geometry change.
    Fit,
    /// Stop the event loop.
    Shutdown,
}

/// One unit of work for the engine.
#[derive(Debug)]
pub enum MuxEvent {
    /// A key event for the active session.
    Key(KeyEvent),
    /// A remote execution result.
    Completion(Completion),
    /// The rendering viewport changed geometry.
    Resize(ViewportSize),
    /// A session-control action.
    Control(ControlAction),
}

/// The terminal multiplexer core.
///
/// Owns the session registry, the line editor and shared history, the
/// display surface, the dispatcher, and the resize coordinator, and wires
/// them together through a single event channel.
pub struct Multiplexer {
    registry: SessionRegistry,
    editor: LineEditor,
    history: CommandHistory,
    surface: DisplaySurface,
    dispatcher: Dispatcher,
    resize: ResizeCoordinator,
    backend: Arc<dyn CommandBackend>,
    events_tx: mpsc::UnboundedSender<MuxEvent>,
    events_rx: mpsc::UnboundedReceiver<MuxEvent>,
}

impl Multiplexer {
    /// Creates an engine over the given backend.
    ///
    /// `prompt_cwd` is the working-directory placeholder shown in the
    /// prompt; `viewport` is the initial geometry; `scrollback` caps each
    /// session's transcript.
    pub fn new(
        backend: Arc<dyn CommandBackend>,
        prompt_cwd: impl Into<String>,
        viewport: ViewportSize,
        scrollback: usize,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            registry: SessionRegistry::new(),
            editor: LineEditor::new(),
            history: CommandHistory::new(),
            surface: DisplaySurface::new(prompt_cwd, viewport, scrollback),
            dispatcher: Dispatcher::new(Arc::clone(&backend), events_tx.clone()),
            resize: ResizeCoordinator::new(viewport),
            backend,
            events_tx,
            events_rx,
        }
    }

    /// Returns a handle for feeding events into the engine.
    pub fn sender(&self) -> mpsc::UnboundedSender<MuxEvent> {
        self.events_tx.clone()
    }

    /// Returns the session registry.
    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    /// Returns the display surface.
    pub fn surface(&self) -> &DisplaySurface {
        &self.surface
    }

    /// Receives the next event. Returns `None` when every sender is gone.
    pub async fn recv(&mut self) -> Option<MuxEvent> {
        self.events_rx.recv().await
    }

    /// Runs the event loop until shutdown.
    pub async fn run(&mut self) {
        while let Some(event) = self.events_rx.recv().await {
            if !self.handle_event(event).await {
                break;
            }
        }
        tracing::info!("Multiplexer stopped");
    }

    /// Processes one event to completion. Returns false on shutdown.
    pub async fn handle_event(&mut self, event: MuxEvent) -> bool {
        match event {
            MuxEvent::Key(key) => {
                self.on_key(key);
                true
            }
            MuxEvent::Completion(completion) => {
                self.dispatcher
                    .apply_completion(&mut self.surface, &self.registry, completion);
                true
            }
            MuxEvent::Resize(size) => {
                if self.resize.observe(size) {
                    self.surface.fit(size);
                }
                true
            }
            MuxEvent::Control(action) => self.on_control(action).await,
        }
    }

    fn on_key(&mut self, key: KeyEvent) {
        let Some(active) = self.registry.active().cloned() else {
            // No session has input focus; the event is dropped.
            return;
        };

        match self.editor.handle_key(key, &mut self.history) {
            KeyOutcome::Ignored => {}
            KeyOutcome::Echo(c) => self.surface.echo_char(&active, c),
            KeyOutcome::EraseChar => self.surface.erase_char(&active),
            KeyOutcome::ReplaceLine(text) => self.surface.replace_line(&active, text),
            KeyOutcome::Submit(text) => {
                self.surface.seal_line(&active);
                self.dispatcher.dispatch(&mut self.surface, &active, &text);
            }
            KeyOutcome::SubmitEmpty => {
                self.surface.seal_line(&active);
                self.surface.show_prompt(&active);
            }
        }
    }

    async fn on_control(&mut self, action: ControlAction) -> bool {
        match action {
            ControlAction::CreateSession => {
                match self.registry.create_session(self.backend.as_ref()).await {
                    Ok(id) => self.focus(&id),
                    Err(err) => {
                        // No session is registered; the caller may retry.
                        tracing::warn!(error = %err, "Failed to create session");
                    }
                }
            }
            ControlAction::SelectSession(id) => {
                let before = self.registry.active().cloned();
                self.registry.select_session(&id);
                if self.registry.active().cloned() != before {
                    self.focus(&id);
                }
            }
            ControlAction::CloseSession(id) => self.close(&id),
            ControlAction::CloseActive => {
                if let Some(active) = self.registry.active().cloned() {
                    self.close(&active);
                }
            }
            ControlAction::CycleSession => {
                if let Some(next) = self.registry.cycle_active() {
                    self.focus(&next);
                }
            }
            ControlAction::Fit => self.resize.refit(&mut self.surface),
            ControlAction::Shutdown => return false,
        }
        true
    }

    /// Starts a fresh edit cycle on a newly active session.
    fn focus(&mut self, id: &SessionId) {
        self.editor.reset();
        self.surface.activate(id);
    }

    fn close(&mut self, id: &SessionId) {
        let was_active = self.registry.active() == Some(id);
        let was_present = self.registry.contains(id);
        self.registry.close_session(id);
        if !was_present {
            return;
        }

        self.dispatcher.forget(id);
        self.surface.remove(id);

        if was_active {
            if let Some(next) = self.registry.active().cloned() {
                self.focus(&next);
            } else {
                self.editor.reset();
            }
        }
    }
}
