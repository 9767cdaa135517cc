//! # WebMux Protocol Library
//!
//! This crate defines the wire contract between the multiplexer core and
//! the remote execution backend.
//!
//! ## Overview
//!
//! The backend exposes two REST operations, both `POST` with JSON bodies:
//!
//! - **create session**: no request body; the response carries an opaque
//!   session identifier.
//! - **execute command**: keyed by session identifier, carrying the literal
//!   command text; the response carries textual output (possibly empty or
//!   multi-line, newline-delimited).
//!
//! Any non-success outcome of either call is treated uniformly as a
//! failure by the core; the backend's internals are out of scope.
//!
//! ## Modules
//!
//! - [`messages`]: Request/response payload types and endpoint paths

pub mod messages;

pub use messages::{
    create_session_path, execute_path, CreateSessionResponse, ExecuteRequest, ExecuteResponse,
};
