//! Host notifications and the delivery/observation seams.

use crate::breakpoints::{BoundBreakpoint, PendingBreakpoint};
use crate::engine::DebugEngine;
use crate::identity::{ModuleIdentity, ThreadIdentity};
use parking_lot::Mutex;
use std::sync::Arc;
use thiserror::Error;

/// A notification the engine sends the host.
///
/// Events that concern a specific thread carry its identity; the
/// load-complete pair targets the main thread when one exists.
#[derive(Debug, Clone)]
pub enum HostEvent {
	EngineCreate,
	ProgramCreate,
	ProgramDestroy {
		exit_code: i32,
	},
	ModuleLoad {
		module: Arc<ModuleIdentity>,
		is_load: bool,
	},
	ThreadCreate {
		thread: Arc<ThreadIdentity>,
	},
	ThreadDestroy {
		thread: Arc<ThreadIdentity>,
		// Exit code is not propagated by the debuggee; always 0 for now.
		exit_code: i32,
	},
	LoadComplete {
		thread: Option<Arc<ThreadIdentity>>,
	},
	LoadCompleteRunning {
		thread: Option<Arc<ThreadIdentity>>,
	},
	EntryPoint {
		thread: Arc<ThreadIdentity>,
	},
	SteppingComplete {
		thread: Arc<ThreadIdentity>,
	},
	AsyncBreakComplete {
		thread: Arc<ThreadIdentity>,
	},
	Breakpoint {
		breakpoint: Arc<BoundBreakpoint>,
		thread: Arc<ThreadIdentity>,
	},
	BreakpointBound {
		pending: Arc<PendingBreakpoint>,
		bound: Arc<BoundBreakpoint>,
	},
	BreakpointError {
		pending: Arc<PendingBreakpoint>,
	},
	Exception {
		thread: Arc<ThreadIdentity>,
		type_name: String,
		description: String,
		unhandled: bool,
	},
	OutputString {
		thread: Arc<ThreadIdentity>,
		text: String,
	},
}

impl HostEvent {
	/// Short name used in logs.
	pub fn name(&self) -> &'static str {
		match self {
			HostEvent::EngineCreate => "engine-create",
			HostEvent::ProgramCreate => "program-create",
			HostEvent::ProgramDestroy { .. } => "program-destroy",
			HostEvent::ModuleLoad { .. } => "module-load",
			HostEvent::ThreadCreate { .. } => "thread-create",
			HostEvent::ThreadDestroy { .. } => "thread-destroy",
			HostEvent::LoadComplete { .. } => "load-complete",
			HostEvent::LoadCompleteRunning { .. } => "load-complete-running",
			HostEvent::EntryPoint { .. } => "entry-point",
			HostEvent::SteppingComplete { .. } => "stepping-complete",
			HostEvent::AsyncBreakComplete { .. } => "async-break-complete",
			HostEvent::Breakpoint { .. } => "breakpoint",
			HostEvent::BreakpointBound { .. } => "breakpoint-bound",
			HostEvent::BreakpointError { .. } => "breakpoint-error",
			HostEvent::Exception { .. } => "exception",
			HostEvent::OutputString { .. } => "output-string",
		}
	}
}

/// The host released its callback identity while the session was tearing
/// down. Delivery failures are swallowed, never retried.
#[derive(Debug, Error)]
#[error("host event sink is gone")]
pub struct SinkGone;

/// Delivery contract for host notifications.
///
/// Implemented by the host-adapter layer. Delivery is synchronous and
/// fire-and-forget from the engine's perspective.
pub trait EventSink: Send + Sync {
	fn deliver(&self, event: HostEvent) -> Result<(), SinkGone>;
}

/// Cross-cutting hooks the owning host-adapter layer can subscribe to.
///
/// Observers are held weakly; a dropped observer is pruned on the next
/// notification pass.
pub trait EngineObserver: Send + Sync {
	/// Load-complete finished; the engine is fully attached.
	fn attached(&self, _engine: &DebugEngine) {}

	/// The engine is about to detach from the debuggee.
	fn detaching(&self, _engine: &DebugEngine) {}

	/// A pending breakpoint bound successfully somewhere.
	fn breakpoint_bound(&self, _engine: &DebugEngine) {}
}

/// [`EventSink`] that records everything it is handed. For tests of this
/// workspace and of host adapters built on it.
#[derive(Default)]
pub struct RecordingSink {
	events: Mutex<Vec<HostEvent>>,
	gone: Mutex<bool>,
}

impl RecordingSink {
	pub fn new() -> Self {
		Self::default()
	}

	/// Snapshot of delivered events.
	pub fn events(&self) -> Vec<HostEvent> {
		self.events.lock().clone()
	}

	/// Event names in delivery order, for compact assertions.
	pub fn event_names(&self) -> Vec<&'static str> {
		self.events.lock().iter().map(HostEvent::name).collect()
	}

	/// Takes all delivered events, clearing the log.
	pub fn take_events(&self) -> Vec<HostEvent> {
		std::mem::take(&mut *self.events.lock())
	}

	/// Makes subsequent deliveries fail as if the host dropped its
	/// callback identity.
	pub fn go_away(&self) {
		*self.gone.lock() = true;
	}
}

impl EventSink for RecordingSink {
	fn deliver(&self, event: HostEvent) -> Result<(), SinkGone> {
		if *self.gone.lock() {
			return Err(SinkGone);
		}
		self.events.lock().push(event);
		Ok(())
	}
}
