//! Events the debuggee session reports to the engine.
//!
//! Events are fed through an unbounded mpsc channel by the wire-protocol
//! reader and consumed by a single pump task, so their relative order is
//! whatever the debuggee produced.

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::mpsc;

/// Receiving half of a session's event stream.
pub type DebuggeeEvents = mpsc::UnboundedReceiver<DebuggeeEvent>;

/// Sending half of a session's event stream, held by the wire reader.
pub type DebuggeeEventSender = mpsc::UnboundedSender<DebuggeeEvent>;

/// Debuggee-native thread handle (the runtime's own thread id).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ThreadHandle(pub u64);

impl fmt::Display for ThreadHandle {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

/// Debuggee-native module handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModuleHandle(pub u64);

impl fmt::Display for ModuleHandle {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

/// Debuggee-native breakpoint handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BreakpointHandle(pub u64);

/// Thread description as the debuggee reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadInfo {
	pub handle: ThreadHandle,
	pub name: Option<String>,
}

impl ThreadInfo {
	pub fn new(handle: ThreadHandle) -> Self {
		Self { handle, name: None }
	}
}

/// Module description as the debuggee reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleInfo {
	pub handle: ModuleHandle,
	pub name: String,
	/// Script path on the machine the debuggee runs on, when known.
	pub source_path: Option<String>,
}

/// Details of a raised exception.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExceptionDetails {
	pub type_name: String,
	pub description: String,
}

/// A notification from the debuggee session.
///
/// Events that can legitimately race thread registration carry the full
/// [`ThreadInfo`] so the engine can create the identity lazily;
/// `ExceptionRaised` carries only the handle because the engine never
/// creates identities on that path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DebuggeeEvent {
	/// The debuggee finished loading. `running` reports whether it was
	/// already executing rather than stopped at the entry point.
	ProcessLoaded { running: bool },
	ModuleLoaded { module: ModuleInfo },
	ThreadCreated { thread: ThreadInfo },
	ThreadExited { thread: ThreadHandle },
	BreakpointHit {
		breakpoint: BreakpointHandle,
		thread: ThreadInfo,
	},
	AsyncBreakComplete { thread: ThreadInfo },
	ExceptionRaised {
		thread: ThreadHandle,
		exception: ExceptionDetails,
		unhandled: bool,
	},
	EntryPointHit { thread: ThreadInfo },
	StepComplete { thread: ThreadInfo },
	ProcessExited { exit_code: i32 },
	Output { thread: ThreadInfo, text: String },
}
