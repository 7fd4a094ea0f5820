//! Control surface of a debuggee session and its construction seam.

use crate::error::SessionError;
use crate::event::{DebuggeeEvents, ThreadHandle};
use nodedbg_protocol::{DebugOptions, DirMapping, ExceptionHitTreatment, LaunchFlags, StepKind};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Debugger endpoint of a running process, for attach.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebugEndpoint {
	pub host: String,
	pub port: u16,
}

/// Everything needed to launch a debuggee in a suspended-equivalent state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchSpec {
	pub exe: String,
	pub args: String,
	pub dir: String,
	pub env: Option<String>,
	pub interpreter_options: Option<String>,
	pub options: DebugOptions,
	pub flags: LaunchFlags,
	pub dir_mappings: Vec<DirMapping>,
}

/// Everything needed to attach to an already-running debuggee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachSpec {
	pub endpoint: DebugEndpoint,
	pub process_id: u32,
}

/// A live connection to one out-of-process debuggee.
///
/// Control operations are asynchronous requests: they return as soon as the
/// request is on the wire, and completion is reported later through the
/// session's event stream. There is no per-thread resume granularity in the
/// runtime, so `resume` always resumes the whole debuggee.
pub trait DebuggeeSession: Send + Sync {
	fn process_id(&self) -> u32;

	/// Begins execution of a launched debuggee and starts the wire reader.
	fn start(&self) -> Result<(), SessionError>;

	fn resume(&self) -> Result<(), SessionError>;

	/// Requests an all-threads break; completion arrives as
	/// [`DebuggeeEvent::AsyncBreakComplete`].
	///
	/// [`DebuggeeEvent::AsyncBreakComplete`]: crate::event::DebuggeeEvent
	fn break_all(&self) -> Result<(), SessionError>;

	fn step(&self, thread: ThreadHandle, kind: StepKind) -> Result<(), SessionError>;

	/// Drops any pending single-step state on `thread`.
	fn clear_stepping(&self, thread: ThreadHandle) -> Result<(), SessionError>;

	fn detach(&self) -> Result<(), SessionError>;

	fn terminate(&self) -> Result<(), SessionError>;

	/// Releases the wire connection without touching the debuggee.
	fn close(&self);

	/// Applies a batch exception-policy update. `default` replaces the
	/// catch-all treatment when present; `named` entries replace their
	/// categories.
	fn set_exception_treatment(
		&self,
		default: Option<ExceptionHitTreatment>,
		named: Vec<(String, ExceptionHitTreatment)>,
	) -> Result<(), SessionError>;

	/// Reverts the given categories to their built-in treatment.
	fn clear_exception_treatment(
		&self,
		default: Option<ExceptionHitTreatment>,
		named: Vec<(String, ExceptionHitTreatment)>,
	) -> Result<(), SessionError>;

	fn clear_all_exception_treatments(&self) -> Result<(), SessionError>;
}

/// Constructs debuggee sessions. Implemented by the wire-protocol client;
/// the engine only ever sees the trait.
///
/// Both constructors hand back the receiving half of the session's event
/// stream; the engine's owner pumps it into the engine.
pub trait SessionFactory: Send + Sync {
	fn launch(&self, spec: LaunchSpec) -> Result<(Arc<dyn DebuggeeSession>, DebuggeeEvents), SessionError>;

	fn attach(&self, spec: AttachSpec) -> Result<(Arc<dyn DebuggeeSession>, DebuggeeEvents), SessionError>;
}
