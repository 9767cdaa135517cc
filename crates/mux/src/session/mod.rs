//! Session bookkeeping.
//!
//! A session is one logical interactive command stream, identified by an
//! opaque id issued by the remote backend. The registry owns the set of
//! open sessions and the notion of which one is active.

mod registry;

pub use registry::{Session, SessionRegistry};

/// Unique identifier for a session, issued by the remote backend.
pub type SessionId = String;
