//! Debuggee session lifecycle: the wire-side contract the engine drives.
//!
//! The actual wire protocol client (connecting to the runtime's debug port,
//! issuing requests, reading notifications) lives outside this workspace.
//! This crate defines what the engine needs from it: the [`DebuggeeSession`]
//! control surface, the [`DebuggeeEvent`] stream those clients feed, the
//! construction seam ([`SessionFactory`]), and an in-memory fake for tests.

pub mod error;
pub mod event;
pub mod fake;
pub mod session;

pub use error::SessionError;
pub use event::*;
pub use session::*;
