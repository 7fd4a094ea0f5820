//! In-memory fake debuggee for unit testing the engine core.
//!
//! Stands in for the wire-protocol client: records every control request
//! and lets tests inject debuggee events, without a runtime process.
//!
//! # Example
//!
//! ```ignore
//! let factory = FakeSessionFactory::new(4102);
//! let launched = engine.launch(request, sink, &factory)?;
//! let controller = factory.controller().unwrap();
//!
//! controller.thread_created(ThreadHandle(1));
//! controller.process_loaded(false);
//! // pump `launched.events` into the engine, then assert on
//! // controller.take_commands()
//! ```

use crate::error::SessionError;
use crate::event::{
	BreakpointHandle, DebuggeeEvent, DebuggeeEventSender, DebuggeeEvents, ExceptionDetails,
	ModuleHandle, ModuleInfo, ThreadHandle, ThreadInfo,
};
use crate::session::{AttachSpec, DebuggeeSession, LaunchSpec, SessionFactory};
use nodedbg_protocol::{ExceptionHitTreatment, StepKind};
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::mpsc;

/// A control request the engine issued against the fake session.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionCommand {
	Start,
	Resume,
	BreakAll,
	Step(ThreadHandle, StepKind),
	ClearStepping(ThreadHandle),
	Detach,
	Terminate,
	Close,
	SetExceptionTreatment {
		default: Option<ExceptionHitTreatment>,
		named: Vec<(String, ExceptionHitTreatment)>,
	},
	ClearExceptionTreatment {
		default: Option<ExceptionHitTreatment>,
		named: Vec<(String, ExceptionHitTreatment)>,
	},
	ClearAllExceptionTreatments,
}

/// Fake [`DebuggeeSession`] backing an engine under test.
pub struct FakeDebuggee {
	process_id: u32,
	commands: Arc<Mutex<Vec<SessionCommand>>>,
	events: DebuggeeEventSender,
	terminate_fails: Arc<AtomicBool>,
}

impl FakeDebuggee {
	/// Builds a fake session plus its event stream and controller.
	pub fn new(process_id: u32) -> (Arc<FakeDebuggee>, DebuggeeEvents, FakeDebuggeeController) {
		let (event_tx, event_rx) = mpsc::unbounded_channel();
		let commands = Arc::new(Mutex::new(Vec::new()));
		let terminate_fails = Arc::new(AtomicBool::new(false));

		let session = Arc::new(FakeDebuggee {
			process_id,
			commands: Arc::clone(&commands),
			events: event_tx.clone(),
			terminate_fails: Arc::clone(&terminate_fails),
		});

		let controller = FakeDebuggeeController {
			events: event_tx,
			commands,
			terminate_fails,
		};

		(session, event_rx, controller)
	}

	fn record(&self, command: SessionCommand) -> Result<(), SessionError> {
		self.commands.lock().push(command);
		Ok(())
	}
}

impl DebuggeeSession for FakeDebuggee {
	fn process_id(&self) -> u32 {
		self.process_id
	}

	fn start(&self) -> Result<(), SessionError> {
		self.record(SessionCommand::Start)
	}

	fn resume(&self) -> Result<(), SessionError> {
		self.record(SessionCommand::Resume)
	}

	fn break_all(&self) -> Result<(), SessionError> {
		self.record(SessionCommand::BreakAll)
	}

	fn step(&self, thread: ThreadHandle, kind: StepKind) -> Result<(), SessionError> {
		self.record(SessionCommand::Step(thread, kind))
	}

	fn clear_stepping(&self, thread: ThreadHandle) -> Result<(), SessionError> {
		self.record(SessionCommand::ClearStepping(thread))
	}

	fn detach(&self) -> Result<(), SessionError> {
		self.record(SessionCommand::Detach)
	}

	fn terminate(&self) -> Result<(), SessionError> {
		if self.terminate_fails.load(Ordering::SeqCst) {
			return Err(SessionError::AlreadyClosed);
		}
		self.record(SessionCommand::Terminate)
	}

	fn close(&self) {
		self.commands.lock().push(SessionCommand::Close);
	}

	fn set_exception_treatment(
		&self,
		default: Option<ExceptionHitTreatment>,
		named: Vec<(String, ExceptionHitTreatment)>,
	) -> Result<(), SessionError> {
		self.record(SessionCommand::SetExceptionTreatment { default, named })
	}

	fn clear_exception_treatment(
		&self,
		default: Option<ExceptionHitTreatment>,
		named: Vec<(String, ExceptionHitTreatment)>,
	) -> Result<(), SessionError> {
		self.record(SessionCommand::ClearExceptionTreatment { default, named })
	}

	fn clear_all_exception_treatments(&self) -> Result<(), SessionError> {
		self.record(SessionCommand::ClearAllExceptionTreatments)
	}
}

/// Controller for injecting debuggee events and inspecting issued commands.
#[derive(Clone)]
pub struct FakeDebuggeeController {
	events: DebuggeeEventSender,
	commands: Arc<Mutex<Vec<SessionCommand>>>,
	terminate_fails: Arc<AtomicBool>,
}

impl FakeDebuggeeController {
	/// Injects a raw event into the session's stream.
	pub fn inject(&self, event: DebuggeeEvent) {
		tracing::trace!(target: "nodedbg.runtime", ?event, "injecting debuggee event");
		let _ = self.events.send(event);
	}

	pub fn process_loaded(&self, running: bool) {
		self.inject(DebuggeeEvent::ProcessLoaded { running });
	}

	pub fn module_loaded(&self, handle: ModuleHandle, name: &str) {
		self.inject(DebuggeeEvent::ModuleLoaded {
			module: ModuleInfo {
				handle,
				name: name.to_string(),
				source_path: None,
			},
		});
	}

	pub fn thread_created(&self, handle: ThreadHandle) {
		self.inject(DebuggeeEvent::ThreadCreated {
			thread: ThreadInfo::new(handle),
		});
	}

	pub fn thread_exited(&self, handle: ThreadHandle) {
		self.inject(DebuggeeEvent::ThreadExited { thread: handle });
	}

	pub fn breakpoint_hit(&self, breakpoint: BreakpointHandle, thread: ThreadHandle) {
		self.inject(DebuggeeEvent::BreakpointHit {
			breakpoint,
			thread: ThreadInfo::new(thread),
		});
	}

	pub fn async_break_complete(&self, thread: ThreadHandle) {
		self.inject(DebuggeeEvent::AsyncBreakComplete {
			thread: ThreadInfo::new(thread),
		});
	}

	pub fn exception_raised(&self, thread: ThreadHandle, type_name: &str, description: &str) {
		self.inject(DebuggeeEvent::ExceptionRaised {
			thread,
			exception: ExceptionDetails {
				type_name: type_name.to_string(),
				description: description.to_string(),
			},
			unhandled: false,
		});
	}

	pub fn entry_point_hit(&self, thread: ThreadHandle) {
		self.inject(DebuggeeEvent::EntryPointHit {
			thread: ThreadInfo::new(thread),
		});
	}

	pub fn step_complete(&self, thread: ThreadHandle) {
		self.inject(DebuggeeEvent::StepComplete {
			thread: ThreadInfo::new(thread),
		});
	}

	pub fn process_exited(&self, exit_code: i32) {
		self.inject(DebuggeeEvent::ProcessExited { exit_code });
	}

	pub fn output(&self, thread: ThreadHandle, text: &str) {
		self.inject(DebuggeeEvent::Output {
			thread: ThreadInfo::new(thread),
			text: text.to_string(),
		});
	}

	/// Makes subsequent `terminate` calls fail as already-gone.
	pub fn fail_terminate(&self) {
		self.terminate_fails.store(true, Ordering::SeqCst);
	}

	/// Takes all recorded commands, clearing the log.
	pub fn take_commands(&self) -> Vec<SessionCommand> {
		std::mem::take(&mut *self.commands.lock())
	}
}

/// [`SessionFactory`] producing fake sessions, one per launch/attach call.
#[derive(Default)]
pub struct FakeSessionFactory {
	process_id: u32,
	controller: Mutex<Option<FakeDebuggeeController>>,
	launches: Mutex<Vec<LaunchSpec>>,
	attaches: Mutex<Vec<AttachSpec>>,
}

impl FakeSessionFactory {
	pub fn new(process_id: u32) -> Self {
		Self {
			process_id,
			..Default::default()
		}
	}

	/// Controller of the most recently constructed session.
	pub fn controller(&self) -> Option<FakeDebuggeeController> {
		self.controller.lock().clone()
	}

	/// Launch specs the engine handed this factory, in order.
	pub fn launches(&self) -> Vec<LaunchSpec> {
		self.launches.lock().clone()
	}

	/// Attach specs the engine handed this factory, in order.
	pub fn attaches(&self) -> Vec<AttachSpec> {
		self.attaches.lock().clone()
	}

	fn build(&self) -> (Arc<dyn DebuggeeSession>, DebuggeeEvents) {
		let (session, events, controller) = FakeDebuggee::new(self.process_id);
		*self.controller.lock() = Some(controller);
		(session, events)
	}
}

impl SessionFactory for FakeSessionFactory {
	fn launch(&self, spec: LaunchSpec) -> Result<(Arc<dyn DebuggeeSession>, DebuggeeEvents), SessionError> {
		self.launches.lock().push(spec);
		Ok(self.build())
	}

	fn attach(&self, spec: AttachSpec) -> Result<(Arc<dyn DebuggeeSession>, DebuggeeEvents), SessionError> {
		self.attaches.lock().push(spec);
		Ok(self.build())
	}
}
