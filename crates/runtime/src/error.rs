//! Session-level error types.

use thiserror::Error;

/// Errors surfaced by a debuggee session.
#[derive(Debug, Error)]
pub enum SessionError {
	#[error("failed to spawn debuggee process: {0}")]
	Spawn(String),

	#[error("failed to connect to debugger port {host}:{port}: {reason}")]
	Connect {
		host: String,
		port: u16,
		reason: String,
	},

	#[error("wire protocol error: {0}")]
	Wire(String),

	/// The session's connection is already gone. Teardown paths treat this
	/// as non-fatal.
	#[error("debuggee session already closed")]
	AlreadyClosed,
}
