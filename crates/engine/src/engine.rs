//! The session state machine.
//!
//! One [`DebugEngine`] drives one debug run: it sequences launch/attach,
//! gates the load-complete notification on the host and debuggee readiness
//! flags, translates debuggee events into host notifications through the
//! identity registries, and serializes host commands into debuggee session
//! operations.

use crate::breakpoints::{BoundBreakpoint, BreakpointBinder, BreakpointRequest, PendingBreakpoint};
use crate::error::{EngineError, Result};
use crate::events::{EngineObserver, EventSink, HostEvent};
use crate::exceptions;
use crate::identity::{IdentityRegistry, ModuleIdentity, ThreadIdentity};
use nodedbg_protocol::{
	ENGINE_ID, ENGINE_NAME, EngineId, ExceptionInfo, LANGUAGE_ID, LaunchFlags, LaunchOptions,
	ProgramId, StepKind, StepUnit,
};
use nodedbg_runtime::{
	AttachSpec, DebugEndpoint, DebuggeeEvent, DebuggeeEvents, DebuggeeSession, LaunchSpec,
	ModuleHandle, SessionError, SessionFactory, ThreadHandle, ThreadInfo,
};
use parking_lot::Mutex;
use std::sync::{Arc, Weak};

/// Host request to launch a new debuggee under the engine.
///
/// `options` is the raw semicolon-delimited options string; the engine parses
/// it with [`LaunchOptions::parse`].
#[derive(Debug, Clone)]
pub struct LaunchRequest {
	pub exe: String,
	pub args: String,
	pub dir: String,
	pub env: Option<String>,
	pub options: String,
	pub flags: LaunchFlags,
}

/// One program the host asks the engine to attach to.
///
/// `endpoint` is required when no session exists yet (direct attach to a
/// running process); after a launch the engine already owns the connection.
#[derive(Debug, Clone)]
pub struct AttachRequest {
	pub program_id: ProgramId,
	pub process_id: u32,
	pub endpoint: Option<DebugEndpoint>,
}

/// Process the host can address launch-follow-up commands to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessDescriptor {
	pub process_id: u32,
}

/// Result of a successful launch: the process descriptor for the host and
/// the session's event stream for the engine's owner to pump.
pub struct Launched {
	pub process: ProcessDescriptor,
	pub events: DebuggeeEvents,
}

/// Where the session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
	Unattached,
	Launching,
	Attaching,
	AwaitingLoadComplete,
	Running,
	Broken,
	Detaching,
	Terminating,
	Destroyed,
}

struct EngineInner {
	state: EngineState,
	session: Option<Arc<dyn DebuggeeSession>>,
	sink: Option<Arc<dyn EventSink>>,
	program_id: Option<ProgramId>,
	// True once a host-initiated attach/terminate handshake has happened;
	// teardown force-kills the debuggee only when it never did.
	handshake_complete: bool,
	host_ready: bool,
	debuggee_loaded: bool,
	loaded_running: bool,
	load_complete_sent: bool,
	threads: IdentityRegistry<ThreadHandle, ThreadIdentity>,
	modules: IdentityRegistry<ModuleHandle, ModuleIdentity>,
	main_thread: Option<Arc<ThreadIdentity>>,
}

impl EngineInner {
	/// Marks load-complete sent and builds its notification batch, or
	/// returns `None` while either readiness flag is still unset.
	///
	/// The ordering inside the batch is load-bearing: the host must learn
	/// about modules and threads before being told loading finished.
	fn take_load_complete_batch(&mut self) -> Option<Vec<HostEvent>> {
		if self.load_complete_sent || !self.host_ready || !self.debuggee_loaded {
			return None;
		}
		self.load_complete_sent = true;
		self.state = if self.loaded_running {
			EngineState::Running
		} else {
			EngineState::Broken
		};

		let mut batch = vec![HostEvent::EngineCreate, HostEvent::ProgramCreate];
		batch.extend(self.modules.iter().map(|module| HostEvent::ModuleLoad {
			module: Arc::clone(module),
			is_load: true,
		}));
		batch.extend(self.threads.iter().map(|thread| HostEvent::ThreadCreate {
			thread: Arc::clone(thread),
		}));
		let thread = self.main_thread.clone();
		batch.push(if self.loaded_running {
			HostEvent::LoadCompleteRunning { thread }
		} else {
			HostEvent::LoadComplete { thread }
		});
		Some(batch)
	}
}

/// Debug engine for one Node.js debug run.
///
/// Host commands are synchronous and arrive on one logical host thread;
/// debuggee events arrive through [`DebugEngine::pump`]. All shared state
/// sits behind one lock that is never held across a notification send.
pub struct DebugEngine {
	inner: Mutex<EngineInner>,
	binder: Arc<dyn BreakpointBinder>,
	observers: Mutex<Vec<Weak<dyn EngineObserver>>>,
	#[cfg(debug_assertions)]
	host_thread: std::sync::OnceLock<std::thread::ThreadId>,
}

impl DebugEngine {
	pub fn new(binder: Arc<dyn BreakpointBinder>) -> Self {
		Self {
			inner: Mutex::new(EngineInner {
				state: EngineState::Unattached,
				session: None,
				sink: None,
				program_id: None,
				handshake_complete: false,
				host_ready: false,
				debuggee_loaded: false,
				loaded_running: false,
				load_complete_sent: false,
				threads: IdentityRegistry::new(),
				modules: IdentityRegistry::new(),
				main_thread: None,
			}),
			binder,
			observers: Mutex::new(Vec::new()),
			#[cfg(debug_assertions)]
			host_thread: std::sync::OnceLock::new(),
		}
	}

	/// Registers a cross-cutting observer. Held weakly; dropped observers
	/// are pruned on the next notification pass.
	pub fn add_observer(&self, observer: &Arc<dyn EngineObserver>) {
		self.observers.lock().push(Arc::downgrade(observer));
	}

	// Host commands are expected on one logical thread; debug builds check.
	fn assert_host_thread(&self) {
		#[cfg(debug_assertions)]
		{
			let current = std::thread::current().id();
			let first = *self.host_thread.get_or_init(|| current);
			debug_assert_eq!(first, current, "host command arrived off the host thread");
		}
	}

	// ---- lifecycle commands ------------------------------------------------

	/// Launches a new debuggee in a suspended-equivalent state.
	///
	/// The caller pumps `Launched::events` into [`DebugEngine::pump`]; the
	/// host completes the sequence with [`DebugEngine::attach`] and
	/// [`DebugEngine::resume_process`].
	pub fn launch(&self, request: LaunchRequest, factory: &dyn SessionFactory) -> Result<Launched> {
		self.assert_host_thread();
		let options = LaunchOptions::parse(&request.options);
		tracing::info!(
			target: "nodedbg.engine",
			exe = %request.exe,
			args = %request.args,
			"launching debuggee",
		);

		let mut inner = self.inner.lock();
		if inner.session.is_some() {
			return Err(EngineError::AlreadyLaunched);
		}
		let (session, events) = factory.launch(LaunchSpec {
			exe: request.exe,
			args: request.args,
			dir: request.dir,
			env: request.env,
			interpreter_options: options.interpreter_options.clone(),
			options: options.debug_options(),
			flags: request.flags,
			dir_mappings: options.dir_mappings,
		})?;
		let process_id = session.process_id();
		inner.session = Some(session);
		inner.state = EngineState::Launching;

		Ok(Launched {
			process: ProcessDescriptor { process_id },
			events,
		})
	}

	/// Attaches the host to the debuggee, constructing the session when the
	/// target is an already-running process.
	///
	/// Exactly one program per session; attaching again is legal only for
	/// the same process identity. Returns the new session's event stream
	/// when one was constructed, for the caller to pump.
	pub fn attach(
		&self,
		requests: &[AttachRequest],
		sink: Arc<dyn EventSink>,
		factory: &dyn SessionFactory,
	) -> Result<Option<DebuggeeEvents>> {
		self.assert_host_thread();
		let [request] = requests else {
			return Err(EngineError::SingleProgramOnly);
		};

		let (batch, new_events) = {
			let mut inner = self.inner.lock();
			let mut new_events = None;
			match &inner.session {
				Some(session) => {
					let current = session.process_id();
					if current != request.process_id {
						return Err(EngineError::ProcessMismatch {
							requested: request.process_id,
							current,
						});
					}
				}
				None => {
					let endpoint = request
						.endpoint
						.clone()
						.ok_or(EngineError::AttachEndpointMissing)?;
					let (session, events) = factory.attach(AttachSpec {
						endpoint,
						process_id: request.process_id,
					})?;
					inner.session = Some(session);
					inner.state = EngineState::Attaching;
					new_events = Some(events);
				}
			}

			inner.sink = Some(sink);
			inner.program_id = Some(request.program_id.clone());
			inner.handshake_complete = true;
			inner.host_ready = true;
			if !inner.load_complete_sent {
				inner.state = EngineState::AwaitingLoadComplete;
			}
			(inner.take_load_complete_batch(), new_events)
		};

		tracing::info!(
			target: "nodedbg.engine",
			process_id = request.process_id,
			program_id = %request.program_id,
			"host attached",
		);
		if let Some(batch) = batch {
			self.send_batch(batch);
		}
		Ok(new_events)
	}

	/// Starts execution of a launched debuggee.
	///
	/// `Ok(false)` means the process identity is not ours. Fails when attach
	/// never completed and the program identifier is still empty.
	pub fn resume_process(&self, process_id: u32) -> Result<bool> {
		self.assert_host_thread();
		let session = self.session()?;
		if session.process_id() != process_id {
			return Ok(false);
		}
		if self.inner.lock().program_id.is_none() {
			return Err(EngineError::AttachIncomplete);
		}
		session.start()?;

		let batch = {
			let mut inner = self.inner.lock();
			inner.host_ready = true;
			inner.take_load_complete_batch()
		};
		if let Some(batch) = batch {
			self.send_batch(batch);
		}
		Ok(true)
	}

	/// `Ok(false)` means the process identity is not ours.
	pub fn can_terminate_process(&self, process_id: u32) -> Result<bool> {
		self.assert_host_thread();
		Ok(self.session()?.process_id() == process_id)
	}

	pub fn can_detach(&self) -> bool {
		self.inner.lock().session.is_some()
	}

	/// Host termination command. Fires the detaching hooks, then detaches;
	/// the debuggee is never force-killed on this path.
	///
	/// `Ok(false)` means the process identity is not ours.
	pub fn terminate_process(&self, process_id: u32) -> Result<bool> {
		self.assert_host_thread();
		let session = self.session()?;
		if session.process_id() != process_id {
			return Ok(false);
		}
		tracing::info!(target: "nodedbg.engine", process_id, "terminating (detach)");
		self.for_each_observer(|observer| observer.detaching(self));
		session.detach()?;

		let mut inner = self.inner.lock();
		inner.handshake_complete = true;
		inner.state = EngineState::Terminating;
		Ok(true)
	}

	/// Detaches from the debuggee: clears every bound breakpoint, fires the
	/// detaching hooks, detaches the session, and resets the program
	/// identifier.
	pub fn detach(&self) -> Result<()> {
		self.assert_host_thread();
		let session = self.session()?;
		tracing::info!(target: "nodedbg.engine", "detaching from debuggee");
		self.binder.clear_all_bound();
		self.for_each_observer(|observer| observer.detaching(self));
		session.detach()?;

		let mut inner = self.inner.lock();
		inner.program_id = None;
		inner.host_ready = false;
		inner.handshake_complete = true;
		inner.state = EngineState::Detaching;
		Ok(())
	}

	/// The engine reports program-destroy itself when the debuggee exits,
	/// so a host-initiated destroy is always answered as already pending.
	pub fn destroy_program(&self) -> Result<()> {
		self.assert_host_thread();
		Err(EngineError::ProgramDestroyPending)
	}

	/// Host acknowledged the program-destroy notification; the session is
	/// torn down and the engine reaches its terminal state.
	pub fn program_destroy_ack(&self) {
		self.assert_host_thread();
		let session = {
			let mut inner = self.inner.lock();
			inner.state = EngineState::Destroyed;
			inner.sink = None;
			inner.program_id = None;
			inner.main_thread = None;
			inner.threads.clear();
			inner.modules.clear();
			inner.handshake_complete = true;
			inner.session.take()
		};
		if let Some(session) = session {
			session.close();
		}
		tracing::debug!(target: "nodedbg.engine", "program destroy acknowledged");
	}

	/// Releases the engine's session.
	///
	/// When no host-initiated attach/terminate handshake ever completed, the
	/// debuggee was launched by us and nobody else will reap it: the sink is
	/// dropped to suppress the redundant exit notification and the debuggee
	/// is terminated outright, tolerating one that is already gone.
	pub fn close(&self) {
		let (session, orphaned) = {
			let mut inner = self.inner.lock();
			let orphaned = !inner.handshake_complete;
			if orphaned {
				inner.sink = None;
			}
			inner.state = EngineState::Destroyed;
			(inner.session.take(), orphaned)
		};
		let Some(session) = session else {
			return;
		};
		if orphaned {
			match session.terminate() {
				Ok(()) | Err(SessionError::AlreadyClosed) => {}
				Err(error) => {
					tracing::warn!(
						target: "nodedbg.engine",
						%error,
						"terminating orphaned debuggee failed",
					);
				}
			}
		} else {
			session.close();
		}
	}

	// ---- execution commands ------------------------------------------------

	/// Continues from a stop on `thread`: clears its pending single-step
	/// state, then resumes the whole debuggee. The runtime has no per-thread
	/// resume granularity.
	pub fn continue_thread(&self, thread: ThreadHandle) -> Result<()> {
		self.assert_host_thread();
		let session = self.session()?;
		session.clear_stepping(thread)?;
		session.resume()?;
		self.inner.lock().state = EngineState::Running;
		Ok(())
	}

	/// Host execute command; same contract as [`DebugEngine::continue_thread`].
	pub fn execute_on_thread(&self, thread: ThreadHandle) -> Result<()> {
		self.continue_thread(thread)
	}

	/// Single-steps `thread`. The step unit is accepted but the runtime only
	/// steps by statement.
	pub fn step(&self, thread: ThreadHandle, kind: StepKind, unit: StepUnit) -> Result<()> {
		self.assert_host_thread();
		tracing::debug!(target: "nodedbg.engine", thread = %thread, ?kind, ?unit, "step");
		let session = self.session()?;
		session.step(thread, kind)?;
		self.inner.lock().state = EngineState::Running;
		Ok(())
	}

	/// Requests an all-threads break; completion arrives later as an
	/// async-break-complete notification.
	pub fn cause_break(&self) -> Result<()> {
		self.assert_host_thread();
		self.session()?.break_all()?;
		Ok(())
	}

	// ---- breakpoints -------------------------------------------------------

	/// Creates a pending breakpoint for a request in this engine's language.
	pub fn create_pending_breakpoint(
		&self,
		request: &BreakpointRequest,
	) -> Result<Arc<PendingBreakpoint>> {
		self.assert_host_thread();
		if request.language != LANGUAGE_ID {
			return Err(EngineError::LanguageMismatch);
		}
		self.binder.create_pending(request)
	}

	/// Breakpoint manager callback: a pending breakpoint bound successfully.
	pub fn breakpoint_bind_succeeded(
		&self,
		pending: Arc<PendingBreakpoint>,
		bound: Arc<BoundBreakpoint>,
	) {
		self.notify(HostEvent::BreakpointBound { pending, bound });
		self.for_each_observer(|observer| observer.breakpoint_bound(self));
	}

	/// Breakpoint manager callback: a pending breakpoint failed to bind.
	pub fn breakpoint_bind_failed(&self, pending: Arc<PendingBreakpoint>) {
		self.notify(HostEvent::BreakpointError { pending });
	}

	// ---- exception policy --------------------------------------------------

	/// Applies a host exception-policy batch. Entries for other engines are
	/// ignored; a batch with nothing of ours is a no-op.
	pub fn set_exceptions(&self, infos: &[ExceptionInfo]) -> Result<()> {
		self.assert_host_thread();
		let Some(batch) = exceptions::partition_batch(infos) else {
			return Ok(());
		};
		self.session()?
			.set_exception_treatment(batch.default, batch.named)?;
		Ok(())
	}

	/// Reverts the categories in a host batch to their built-in treatment.
	pub fn remove_set_exceptions(&self, infos: &[ExceptionInfo]) -> Result<()> {
		self.assert_host_thread();
		let Some(batch) = exceptions::partition_batch(infos) else {
			return Ok(());
		};
		self.session()?
			.clear_exception_treatment(batch.default, batch.named)?;
		Ok(())
	}

	/// Reverts every category to its built-in treatment, when the host is
	/// talking about this engine.
	pub fn remove_all_set_exceptions(&self, engine: EngineId) -> Result<()> {
		self.assert_host_thread();
		if engine != ENGINE_ID {
			return Ok(());
		}
		self.session()?.clear_all_exception_treatments()?;
		Ok(())
	}

	// ---- host queries and host-environment setters -------------------------

	pub fn engine_id(&self) -> EngineId {
		ENGINE_ID
	}

	pub fn engine_name(&self) -> &'static str {
		ENGINE_NAME
	}

	/// Empty until an attach completes; reset on detach.
	pub fn program_id(&self) -> Option<ProgramId> {
		self.inner.lock().program_id.clone()
	}

	/// The engine exposes no user-facing program name.
	pub fn program_name(&self) -> Option<String> {
		None
	}

	pub fn state(&self) -> EngineState {
		self.inner.lock().state
	}

	pub fn process_id(&self) -> Option<u32> {
		self.inner.lock().session.as_ref().map(|s| s.process_id())
	}

	/// Known threads, in creation order.
	pub fn threads(&self) -> Vec<Arc<ThreadIdentity>> {
		self.inner.lock().threads.iter().cloned().collect()
	}

	/// Loaded modules, in load order.
	pub fn modules(&self) -> Vec<Arc<ModuleIdentity>> {
		self.inner.lock().modules.iter().cloned().collect()
	}

	/// Default event-delivery target: the first thread the debuggee created.
	pub fn main_thread(&self) -> Option<Arc<ThreadIdentity>> {
		self.inner.lock().main_thread.clone()
	}

	// Accepted and ignored; the engine has no use for host environment data.
	pub fn set_locale(&self, _locale: u16) -> Result<()> {
		Ok(())
	}

	pub fn set_registry_root(&self, _root: &str) -> Result<()> {
		Ok(())
	}

	pub fn set_metric(&self, _metric: &str, _value: &str) -> Result<()> {
		Ok(())
	}

	pub fn set_symbol_load_state(&self, _load_symbols: bool) -> Result<()> {
		Ok(())
	}

	// Surfaces the host probes for but this engine does not provide.
	pub fn memory_bytes(&self) -> Result<()> {
		Err(EngineError::NotImplemented)
	}

	pub fn disassembly_stream(&self) -> Result<()> {
		Err(EngineError::NotImplemented)
	}

	pub fn write_dump(&self) -> Result<()> {
		Err(EngineError::NotImplemented)
	}

	pub fn enum_code_paths(&self) -> Result<()> {
		Err(EngineError::NotImplemented)
	}

	pub fn enc_update(&self) -> Result<()> {
		Err(EngineError::NotImplemented)
	}

	// Deprecated host entry points; superseded by attach/execute-on-thread.
	pub fn enum_programs(&self) -> Result<()> {
		Err(EngineError::NotImplemented)
	}

	pub fn get_process(&self) -> Result<()> {
		Err(EngineError::NotImplemented)
	}

	pub fn execute(&self) -> Result<()> {
		Err(EngineError::NotImplemented)
	}

	// ---- debuggee events ---------------------------------------------------

	/// Drives the engine from a session's event stream until it closes.
	pub async fn pump(&self, mut events: DebuggeeEvents) {
		while let Some(event) = events.recv().await {
			self.handle_event(event);
		}
		tracing::debug!(target: "nodedbg.engine", "debuggee event stream closed");
	}

	/// Applies one debuggee event. [`DebugEngine::pump`] calls this for
	/// every event on the stream.
	pub fn handle_event(&self, event: DebuggeeEvent) {
		match event {
			DebuggeeEvent::ProcessLoaded { running } => {
				let batch = {
					let mut inner = self.inner.lock();
					inner.debuggee_loaded = true;
					inner.loaded_running = running;
					inner.take_load_complete_batch()
				};
				if let Some(batch) = batch {
					self.send_batch(batch);
				}
			}
			DebuggeeEvent::ModuleLoaded { module } => {
				let (identity, announce) = {
					let mut inner = self.inner.lock();
					let (identity, _) = inner
						.modules
						.register_with(module.handle, || ModuleIdentity::from_info(&module));
					(identity, inner.load_complete_sent)
				};
				if announce {
					self.notify(HostEvent::ModuleLoad {
						module: identity,
						is_load: true,
					});
				}
			}
			DebuggeeEvent::ThreadCreated { thread } => {
				let (identity, announce) = {
					let mut inner = self.inner.lock();
					let (identity, _) = inner
						.threads
						.register_with(thread.handle, || ThreadIdentity::from_info(&thread));
					if inner.main_thread.is_none() {
						inner.main_thread = Some(Arc::clone(&identity));
					}
					(identity, inner.load_complete_sent)
				};
				if announce {
					self.notify(HostEvent::ThreadCreate { thread: identity });
				}
			}
			DebuggeeEvent::ThreadExited { thread } => {
				let removed = self.inner.lock().threads.remove(thread);
				match removed {
					Some(identity) => {
						// Thread exit codes are not propagated by the runtime.
						self.notify(HostEvent::ThreadDestroy {
							thread: identity,
							exit_code: 0,
						});
					}
					None => {
						tracing::warn!(
							target: "nodedbg.engine",
							thread = %thread,
							"exit reported for unknown thread",
						);
					}
				}
			}
			DebuggeeEvent::BreakpointHit { breakpoint, thread } => {
				let Some(bound) = self.binder.resolve_bound(breakpoint) else {
					tracing::warn!(
						target: "nodedbg.engine",
						breakpoint = breakpoint.0,
						"hit reported for unknown breakpoint",
					);
					return;
				};
				let identity = self.register_thread_lazily(&thread);
				self.set_state(EngineState::Broken);
				self.notify(HostEvent::Breakpoint {
					breakpoint: bound,
					thread: identity,
				});
			}
			DebuggeeEvent::AsyncBreakComplete { thread } => {
				let identity = self.register_thread_lazily(&thread);
				self.set_state(EngineState::Broken);
				self.notify(HostEvent::AsyncBreakComplete { thread: identity });
			}
			DebuggeeEvent::ExceptionRaised {
				thread,
				exception,
				unhandled,
			} => {
				// No lazy creation here: the session may be tearing down
				// before the thread was ever registered, and that race is
				// tolerated by dropping the event.
				let Some(identity) = self.inner.lock().threads.resolve(thread) else {
					tracing::debug!(
						target: "nodedbg.engine",
						thread = %thread,
						"exception on unregistered thread dropped",
					);
					return;
				};
				self.set_state(EngineState::Broken);
				self.notify(HostEvent::Exception {
					thread: identity,
					type_name: exception.type_name,
					description: exception.description,
					unhandled,
				});
			}
			DebuggeeEvent::EntryPointHit { thread } => {
				let identity = self.register_thread_lazily(&thread);
				self.set_state(EngineState::Broken);
				self.notify(HostEvent::EntryPoint { thread: identity });
			}
			DebuggeeEvent::StepComplete { thread } => {
				let identity = self.register_thread_lazily(&thread);
				self.set_state(EngineState::Broken);
				self.notify(HostEvent::SteppingComplete { thread: identity });
			}
			DebuggeeEvent::ProcessExited { exit_code } => {
				tracing::info!(target: "nodedbg.engine", exit_code, "debuggee exited");
				self.notify(HostEvent::ProgramDestroy { exit_code });
			}
			DebuggeeEvent::Output { thread, text } => {
				let identity = self.register_thread_lazily(&thread);
				self.notify(HostEvent::OutputString {
					thread: identity,
					text,
				});
			}
		}
	}

	// ---- internals ---------------------------------------------------------

	fn session(&self) -> Result<Arc<dyn DebuggeeSession>> {
		self.inner.lock().session.clone().ok_or(EngineError::NotAttached)
	}

	fn set_state(&self, state: EngineState) {
		let mut inner = self.inner.lock();
		if inner.state != state {
			tracing::trace!(
				target: "nodedbg.engine",
				from = ?inner.state,
				to = ?state,
				"state transition",
			);
			inner.state = state;
		}
	}

	fn register_thread_lazily(&self, info: &ThreadInfo) -> Arc<ThreadIdentity> {
		let mut inner = self.inner.lock();
		let (identity, _) = inner
			.threads
			.register_with(info.handle, || ThreadIdentity::from_info(info));
		identity
	}

	/// Delivers one host notification, tolerating a host that already
	/// released its callback identity.
	fn notify(&self, event: HostEvent) {
		let sink = self.inner.lock().sink.clone();
		let Some(sink) = sink else {
			tracing::debug!(
				target: "nodedbg.engine",
				event = event.name(),
				"host event dropped, no sink",
			);
			return;
		};
		deliver(&sink, event);
	}

	fn send_batch(&self, batch: Vec<HostEvent>) {
		let sink = self.inner.lock().sink.clone();
		if let Some(sink) = sink {
			for event in batch {
				deliver(&sink, event);
			}
		}
		self.for_each_observer(|observer| observer.attached(self));
	}

	fn for_each_observer(&self, mut f: impl FnMut(&dyn EngineObserver)) {
		let observers: Vec<Arc<dyn EngineObserver>> = {
			let mut observers = self.observers.lock();
			observers.retain(|weak| weak.strong_count() > 0);
			observers.iter().filter_map(Weak::upgrade).collect()
		};
		for observer in observers {
			f(observer.as_ref());
		}
	}
}

impl Drop for DebugEngine {
	fn drop(&mut self) {
		self.close();
	}
}

fn deliver(sink: &Arc<dyn EventSink>, event: HostEvent) {
	let name = event.name();
	if sink.deliver(event).is_err() {
		tracing::debug!(
			target: "nodedbg.engine",
			event = name,
			"host released its callback identity, event dropped",
		);
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::breakpoints::FakeBreakpointBinder;
	use crate::events::RecordingSink;
	use nodedbg_runtime::fake::{FakeSessionFactory, SessionCommand};

	fn engine() -> (DebugEngine, Arc<FakeBreakpointBinder>) {
		let binder = Arc::new(FakeBreakpointBinder::new());
		(DebugEngine::new(Arc::clone(&binder) as Arc<dyn BreakpointBinder>), binder)
	}

	fn launch_request() -> LaunchRequest {
		LaunchRequest {
			exe: "node".to_string(),
			args: "app.js".to_string(),
			dir: "/srv/app".to_string(),
			env: None,
			options: String::new(),
			flags: LaunchFlags(0),
		}
	}

	fn attach_request(process_id: u32) -> AttachRequest {
		AttachRequest {
			program_id: ProgramId::new("prog-1"),
			process_id,
			endpoint: None,
		}
	}

	#[test]
	fn second_launch_is_rejected() {
		let (engine, _) = engine();
		let factory = FakeSessionFactory::new(4102);
		engine.launch(launch_request(), &factory).unwrap();
		assert!(matches!(
			engine.launch(launch_request(), &factory),
			Err(EngineError::AlreadyLaunched)
		));
	}

	#[test]
	fn attach_requires_exactly_one_program() {
		let (engine, _) = engine();
		let factory = FakeSessionFactory::new(4102);
		let sink = Arc::new(RecordingSink::new());
		let requests = vec![attach_request(1), attach_request(2)];
		assert!(matches!(
			engine.attach(&requests, sink, &factory),
			Err(EngineError::SingleProgramOnly)
		));
	}

	#[test]
	fn attach_to_the_wrong_process_mutates_nothing() {
		let (engine, _) = engine();
		let factory = FakeSessionFactory::new(4102);
		engine.launch(launch_request(), &factory).unwrap();

		let sink = Arc::new(RecordingSink::new());
		let result = engine.attach(&[attach_request(9999)], sink, &factory);
		assert!(matches!(
			result,
			Err(EngineError::ProcessMismatch { requested: 9999, current: 4102 })
		));
		assert!(engine.program_id().is_none());
		assert_eq!(engine.state(), EngineState::Launching);
	}

	#[test]
	fn fresh_attach_without_an_endpoint_fails() {
		let (engine, _) = engine();
		let factory = FakeSessionFactory::new(4102);
		let sink = Arc::new(RecordingSink::new());
		assert!(matches!(
			engine.attach(&[attach_request(4102)], sink, &factory),
			Err(EngineError::AttachEndpointMissing)
		));
	}

	#[test]
	fn resume_before_attach_reports_incomplete() {
		let (engine, _) = engine();
		let factory = FakeSessionFactory::new(4102);
		engine.launch(launch_request(), &factory).unwrap();
		assert!(matches!(
			engine.resume_process(4102),
			Err(EngineError::AttachIncomplete)
		));
	}

	#[test]
	fn resume_of_a_foreign_process_is_a_soft_negative() {
		let (engine, _) = engine();
		let factory = FakeSessionFactory::new(4102);
		engine.launch(launch_request(), &factory).unwrap();
		assert!(!engine.resume_process(31337).unwrap());
	}

	#[test]
	fn continue_clears_stepping_then_resumes_the_whole_session() {
		let (engine, _) = engine();
		let factory = FakeSessionFactory::new(4102);
		engine.launch(launch_request(), &factory).unwrap();
		let controller = factory.controller().unwrap();
		controller.take_commands();

		engine.continue_thread(ThreadHandle(1)).unwrap();
		assert_eq!(
			controller.take_commands(),
			vec![
				SessionCommand::ClearStepping(ThreadHandle(1)),
				SessionCommand::Resume,
			]
		);
		assert_eq!(engine.state(), EngineState::Running);
	}

	#[test]
	fn wrong_language_breakpoint_is_rejected_before_the_binder() {
		let (engine, binder) = engine();
		let request = BreakpointRequest {
			language: nodedbg_protocol::LanguageId("{00000000-0000-0000-0000-000000000000}"),
			path: "app.js".to_string(),
			line: 10,
			condition: None,
		};
		assert!(matches!(
			engine.create_pending_breakpoint(&request),
			Err(EngineError::LanguageMismatch)
		));
		assert!(binder.pending().is_empty());
	}

	#[test]
	fn destroy_program_is_always_pending() {
		let (engine, _) = engine();
		assert!(matches!(
			engine.destroy_program(),
			Err(EngineError::ProgramDestroyPending)
		));
	}

	#[test]
	fn exception_batches_for_other_engines_never_reach_the_session() {
		let (engine, _) = engine();
		let factory = FakeSessionFactory::new(4102);
		engine.launch(launch_request(), &factory).unwrap();
		let controller = factory.controller().unwrap();

		let other = EngineId("{00000000-0000-0000-0000-000000000000}");
		engine
			.set_exceptions(&[ExceptionInfo {
				engine: other,
				name: "TypeError".to_string(),
				state: nodedbg_protocol::ExceptionState::STOP_FIRST_CHANCE,
			}])
			.unwrap();
		engine.remove_all_set_exceptions(other).unwrap();
		assert!(!controller
			.take_commands()
			.iter()
			.any(|c| matches!(c, SessionCommand::SetExceptionTreatment { .. }
				| SessionCommand::ClearAllExceptionTreatments)));
	}

	#[test]
	fn close_force_terminates_a_never_attached_launch() {
		let (engine, _) = engine();
		let factory = FakeSessionFactory::new(4102);
		engine.launch(launch_request(), &factory).unwrap();
		let controller = factory.controller().unwrap();
		controller.take_commands();

		engine.close();
		assert_eq!(controller.take_commands(), vec![SessionCommand::Terminate]);
	}

	#[test]
	fn close_tolerates_an_already_gone_debuggee() {
		let (engine, _) = engine();
		let factory = FakeSessionFactory::new(4102);
		engine.launch(launch_request(), &factory).unwrap();
		factory.controller().unwrap().fail_terminate();
		engine.close();
	}

	#[test]
	fn close_after_attach_only_releases_the_connection() {
		let (engine, _) = engine();
		let factory = FakeSessionFactory::new(4102);
		engine.launch(launch_request(), &factory).unwrap();
		let sink = Arc::new(RecordingSink::new());
		engine.attach(&[attach_request(4102)], sink, &factory).unwrap();
		let controller = factory.controller().unwrap();
		controller.take_commands();

		engine.close();
		assert_eq!(controller.take_commands(), vec![SessionCommand::Close]);
	}

	#[tokio::test]
	async fn pump_feeds_events_into_the_engine() {
		let (engine, _) = engine();
		let factory = FakeSessionFactory::new(4102);
		let launched = engine.launch(launch_request(), &factory).unwrap();
		let sink = Arc::new(RecordingSink::new());
		engine
			.attach(&[attach_request(4102)], Arc::clone(&sink) as Arc<dyn EventSink>, &factory)
			.unwrap();

		let engine = Arc::new(engine);
		let pumping = {
			let engine = Arc::clone(&engine);
			tokio::spawn(async move { engine.pump(launched.events).await })
		};

		let controller = factory.controller().unwrap();
		controller.thread_created(ThreadHandle(1));
		controller.process_loaded(false);
		for _ in 0..8 {
			tokio::task::yield_now().await;
		}

		assert_eq!(
			sink.event_names(),
			vec!["engine-create", "program-create", "thread-create", "load-complete"]
		);
		pumping.abort();
	}
}
