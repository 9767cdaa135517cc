//! # WebMux Core Library
//!
//! This crate implements the terminal multiplexer core: multiple
//! concurrent interactive sessions over a remote execution backend, with
//! per-keystroke line editing, shared command history, and a display
//! surface that stays consistent under asynchronous responses and
//! viewport resizes.
//!
//! ## Architecture
//!
//! ```text
//! key event ──▶ LineEditor ──(submit)──▶ Dispatcher ──▶ built-in, local
//!                   │                        │
//!                   ▼ echo                   ▼ remote (one FIFO worker
//!             DisplaySurface ◀── completion ─┘  per session)
//!                   ▲
//! geometry ──▶ ResizeCoordinator
//! ```
//!
//! The [`Multiplexer`] engine consumes every stimulus (key events,
//! remote-call completions, geometry changes, control actions) from a
//! single channel, one event to completion at a time. The
//! [`SessionRegistry`] gates which session's editor receives keystrokes.
//! Per-session command results apply in the order their requests were
//! issued; distinct sessions run independently.
//!
//! This is not a terminal emulator: there is no escape-sequence parsing,
//! no mid-line cursor movement, and no PTY handling. Commands execute on
//! the remote backend, which returns plain text.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use mux::{ControlAction, HttpBackend, Multiplexer, MuxEvent, ViewportSize};
//!
//! #[tokio::main]
//! async fn main() {
//!     let backend = Arc::new(HttpBackend::new("http://127.0.0.1:8000"));
//!     let mut mux = Multiplexer::new(backend, "~/workspace", ViewportSize::new(80, 24), 1000);
//!
//!     let events = mux.sender();
//!     events
//!         .send(MuxEvent::Control(ControlAction::CreateSession))
//!         .unwrap();
//!
//!     // Feed key events through `events`; the loop runs until shutdown.
//!     mux.run().await;
//! }
//! ```
//!
//! ## Modules
//!
//! - [`backend`]: Remote execution backend trait and HTTP implementation
//! - [`config`]: Configuration loading and defaults
//! - [`dispatcher`]: Built-in vs. remote dispatch and reconciliation
//! - [`display`]: Per-session transcripts and the banner/prompt protocol
//! - [`editor`]: Per-keystroke line editing state machine
//! - [`error`]: Error taxonomy
//! - [`history`]: Process-wide command history
//! - [`multiplexer`]: The event-loop engine
//! - [`resize`]: Viewport tracking and display-fit coordination
//! - [`session`]: Session bookkeeping

pub mod backend;
pub mod config;
pub mod dispatcher;
pub mod display;
pub mod editor;
pub mod error;
pub mod history;
pub mod multiplexer;
pub mod resize;
pub mod session;

// Re-export the crate surface for convenience
pub use backend::{BackendError, CommandBackend, HttpBackend};
pub use config::{default_config_path, Config, ConfigError};
pub use dispatcher::{Completion, Dispatcher};
pub use display::{DisplayLine, DisplaySurface};
pub use editor::{KeyEvent, KeyOutcome, LineEditor};
pub use error::MuxError;
pub use history::CommandHistory;
pub use multiplexer::{ControlAction, Multiplexer, MuxEvent};
pub use resize::{spawn_geometry_watcher, ResizeCoordinator, ViewportSize};
pub use session::{Session, SessionId, SessionRegistry};
