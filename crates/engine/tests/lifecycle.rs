//! End-to-end lifecycle coverage: launch/attach sequencing, load-complete
//! gating, identity bookkeeping, and detach behavior, driven through the
//! fake debuggee session.

use nodedbg::{
	AttachRequest, BreakpointBinder, DebugEngine, EngineState, EventSink, HostEvent,
	LaunchRequest, breakpoints::FakeBreakpointBinder, events::RecordingSink,
};
use nodedbg_protocol::{DebugOptions, LaunchFlags, ProgramId};
use nodedbg_runtime::{
	BreakpointHandle, DebuggeeEvent, ModuleHandle, ModuleInfo, ThreadHandle, ThreadInfo,
	fake::{FakeSessionFactory, SessionCommand},
};
use std::sync::Arc;

struct Harness {
	engine: DebugEngine,
	binder: Arc<FakeBreakpointBinder>,
	factory: FakeSessionFactory,
	sink: Arc<RecordingSink>,
}

impl Harness {
	fn new() -> Self {
		let binder = Arc::new(FakeBreakpointBinder::new());
		Self {
			engine: DebugEngine::new(Arc::clone(&binder) as Arc<dyn BreakpointBinder>),
			binder,
			factory: FakeSessionFactory::new(4102),
			sink: Arc::new(RecordingSink::new()),
		}
	}

	fn launch(&self, options: &str) {
		self.engine
			.launch(
				LaunchRequest {
					exe: "node".to_string(),
					args: "app.js".to_string(),
					dir: "/srv/app".to_string(),
					env: None,
					options: options.to_string(),
					flags: LaunchFlags(0),
				},
				&self.factory,
			)
			.unwrap();
	}

	fn attach(&self) {
		self.engine
			.attach(
				&[AttachRequest {
					program_id: ProgramId::new("prog-1"),
					process_id: 4102,
					endpoint: None,
				}],
				Arc::clone(&self.sink) as Arc<dyn EventSink>,
				&self.factory,
			)
			.unwrap();
	}

	fn thread_created(&self, id: u64) {
		self.engine.handle_event(DebuggeeEvent::ThreadCreated {
			thread: ThreadInfo::new(ThreadHandle(id)),
		});
	}

	fn module_loaded(&self, id: u64, name: &str) {
		self.engine.handle_event(DebuggeeEvent::ModuleLoaded {
			module: ModuleInfo {
				handle: ModuleHandle(id),
				name: name.to_string(),
				source_path: None,
			},
		});
	}

	fn process_loaded(&self, running: bool) {
		self.engine
			.handle_event(DebuggeeEvent::ProcessLoaded { running });
	}
}

#[test]
fn launch_options_reach_the_session_as_a_bitmask() {
	let h = Harness::new();
	h.launch("WAIT_ON_NORMAL_EXIT=true;REDIRECT_OUTPUT=true");

	let launches = h.factory.launches();
	assert_eq!(launches.len(), 1);
	let options = launches[0].options;
	assert!(options.contains(DebugOptions::WAIT_ON_NORMAL_EXIT));
	assert!(options.contains(DebugOptions::REDIRECT_OUTPUT));
	assert!(!options.contains(DebugOptions::WAIT_ON_ABNORMAL_EXIT));
}

#[test]
fn load_complete_waits_for_both_readiness_flags_host_first() {
	let h = Harness::new();
	h.launch("");
	h.attach();
	assert_eq!(h.engine.state(), EngineState::AwaitingLoadComplete);
	assert!(h.sink.events().is_empty());

	h.process_loaded(false);
	assert_eq!(
		h.sink.event_names(),
		vec!["engine-create", "program-create", "load-complete"]
	);
	assert_eq!(h.engine.state(), EngineState::Broken);
}

#[test]
fn load_complete_waits_for_both_readiness_flags_debuggee_first() {
	let h = Harness::new();
	h.launch("");
	h.process_loaded(true);
	assert!(h.sink.events().is_empty());

	h.attach();
	assert_eq!(
		h.sink.event_names(),
		vec!["engine-create", "program-create", "load-complete-running"]
	);
	assert_eq!(h.engine.state(), EngineState::Running);
}

#[test]
fn load_complete_fires_exactly_once() {
	let h = Harness::new();
	h.launch("");
	h.attach();
	h.process_loaded(false);
	h.sink.take_events();

	h.process_loaded(false);
	h.attach();
	let repeats = h
		.sink
		.event_names()
		.into_iter()
		.filter(|name| name.starts_with("load-complete"))
		.count();
	assert_eq!(repeats, 0);
}

#[test]
fn load_complete_replays_known_modules_then_threads_in_order() {
	let h = Harness::new();
	h.launch("");
	// Registration order deliberately interleaves threads and modules.
	h.thread_created(1);
	h.module_loaded(10, "app.js");
	h.thread_created(2);
	h.module_loaded(11, "util.js");
	h.process_loaded(false);
	assert!(h.sink.events().is_empty());

	h.attach();
	assert_eq!(
		h.sink.event_names(),
		vec![
			"engine-create",
			"program-create",
			"module-load",
			"module-load",
			"thread-create",
			"thread-create",
			"load-complete",
		]
	);

	let events = h.sink.take_events();
	let HostEvent::LoadComplete { thread } = events.last().unwrap() else {
		panic!("expected load-complete last");
	};
	assert_eq!(thread.as_ref().unwrap().handle, ThreadHandle(1));
}

#[test]
fn events_after_load_complete_are_forwarded_directly() {
	let h = Harness::new();
	h.launch("");
	h.attach();
	h.process_loaded(false);
	h.sink.take_events();

	h.module_loaded(10, "late.js");
	h.thread_created(2);
	assert_eq!(h.sink.event_names(), vec!["module-load", "thread-create"]);
}

#[test]
fn first_created_thread_stays_the_main_thread() {
	let h = Harness::new();
	h.launch("");
	h.thread_created(7);
	h.thread_created(8);
	h.thread_created(9);
	assert_eq!(h.engine.main_thread().unwrap().handle, ThreadHandle(7));

	// Even its exit does not promote a different thread.
	h.engine.handle_event(DebuggeeEvent::ThreadExited {
		thread: ThreadHandle(7),
	});
	assert_eq!(h.engine.main_thread().unwrap().handle, ThreadHandle(7));
}

#[test]
fn lazily_registered_threads_never_become_the_main_thread() {
	let h = Harness::new();
	h.launch("");
	h.engine.handle_event(DebuggeeEvent::Output {
		thread: ThreadInfo::new(ThreadHandle(5)),
		text: "hello".to_string(),
	});
	assert_eq!(h.engine.threads().len(), 1);
	assert!(h.engine.main_thread().is_none());

	h.thread_created(6);
	assert_eq!(h.engine.main_thread().unwrap().handle, ThreadHandle(6));
}

#[test]
fn output_and_async_break_create_identities_lazily() {
	let h = Harness::new();
	h.launch("");
	h.attach();
	h.process_loaded(true);
	h.sink.take_events();

	h.engine.handle_event(DebuggeeEvent::Output {
		thread: ThreadInfo::new(ThreadHandle(3)),
		text: "log line".to_string(),
	});
	h.engine.handle_event(DebuggeeEvent::AsyncBreakComplete {
		thread: ThreadInfo::new(ThreadHandle(4)),
	});
	assert_eq!(h.sink.event_names(), vec!["output-string", "async-break-complete"]);
	assert_eq!(h.engine.threads().len(), 2);
}

#[test]
fn exceptions_on_unregistered_threads_are_dropped() {
	let h = Harness::new();
	h.launch("");
	h.attach();
	h.process_loaded(true);
	h.sink.take_events();

	h.engine.handle_event(DebuggeeEvent::ExceptionRaised {
		thread: ThreadHandle(99),
		exception: nodedbg_runtime::ExceptionDetails {
			type_name: "TypeError".to_string(),
			description: "boom".to_string(),
		},
		unhandled: false,
	});
	assert!(h.sink.events().is_empty());
	assert!(h.engine.threads().is_empty());

	h.thread_created(99);
	h.sink.take_events();
	h.engine.handle_event(DebuggeeEvent::ExceptionRaised {
		thread: ThreadHandle(99),
		exception: nodedbg_runtime::ExceptionDetails {
			type_name: "TypeError".to_string(),
			description: "boom".to_string(),
		},
		unhandled: true,
	});
	assert_eq!(h.sink.event_names(), vec!["exception"]);
}

#[test]
fn breakpoint_hits_resolve_through_the_binder() {
	let h = Harness::new();
	h.launch("");
	h.attach();
	h.process_loaded(true);
	h.sink.take_events();

	h.binder.bind(BreakpointHandle(1), "app.js", 12);
	h.engine.handle_event(DebuggeeEvent::BreakpointHit {
		breakpoint: BreakpointHandle(1),
		thread: ThreadInfo::new(ThreadHandle(1)),
	});
	assert_eq!(h.sink.event_names(), vec!["breakpoint"]);
	assert_eq!(h.engine.state(), EngineState::Broken);

	// A hit the binder cannot resolve is dropped.
	h.sink.take_events();
	h.engine.handle_event(DebuggeeEvent::BreakpointHit {
		breakpoint: BreakpointHandle(42),
		thread: ThreadInfo::new(ThreadHandle(1)),
	});
	assert!(h.sink.events().is_empty());
}

#[test]
fn detach_clears_bound_breakpoints_and_resets_the_program() {
	let h = Harness::new();
	h.launch("");
	h.attach();
	h.process_loaded(true);
	let controller = h.factory.controller().unwrap();
	controller.take_commands();
	h.binder.bind(BreakpointHandle(1), "app.js", 12);

	h.engine.detach().unwrap();
	assert_eq!(h.binder.clear_count(), 1);
	assert_eq!(controller.take_commands(), vec![SessionCommand::Detach]);
	assert!(h.engine.program_id().is_none());
	assert_eq!(h.engine.state(), EngineState::Detaching);
	assert!(h.binder.resolve_bound(BreakpointHandle(1)).is_none());
}

#[test]
fn terminate_detaches_rather_than_killing() {
	let h = Harness::new();
	h.launch("");
	h.attach();
	h.process_loaded(true);
	let controller = h.factory.controller().unwrap();
	controller.take_commands();

	assert!(h.engine.terminate_process(4102).unwrap());
	let commands = controller.take_commands();
	assert_eq!(commands, vec![SessionCommand::Detach]);
	assert_eq!(h.engine.state(), EngineState::Terminating);
}

#[test]
fn terminate_of_a_foreign_process_is_a_soft_negative() {
	let h = Harness::new();
	h.launch("");
	assert!(!h.engine.terminate_process(31337).unwrap());
	assert!(!h.engine.can_terminate_process(31337).unwrap());
	assert!(h.engine.can_terminate_process(4102).unwrap());
}

#[test]
fn process_exit_round_trips_through_the_destroy_handshake() {
	let h = Harness::new();
	h.launch("");
	h.attach();
	h.process_loaded(true);
	h.sink.take_events();
	h.thread_created(1);

	h.engine.handle_event(DebuggeeEvent::ProcessExited { exit_code: 3 });
	let events = h.sink.take_events();
	assert!(matches!(
		events.as_slice(),
		[.., HostEvent::ProgramDestroy { exit_code: 3 }]
	));

	h.engine.program_destroy_ack();
	assert_eq!(h.engine.state(), EngineState::Destroyed);
	assert!(h.engine.threads().is_empty());
	assert!(h.engine.program_id().is_none());
	let controller = h.factory.controller().unwrap();
	assert!(controller.take_commands().contains(&SessionCommand::Close));
}

#[tokio::test]
async fn attach_to_a_running_process_pumps_its_own_stream() {
	let h = Harness::new();
	let events = h
		.engine
		.attach(
			&[AttachRequest {
				program_id: ProgramId::new("prog-1"),
				process_id: 4102,
				endpoint: Some(nodedbg_runtime::DebugEndpoint {
					host: "localhost".to_string(),
					port: 5858,
				}),
			}],
			Arc::clone(&h.sink) as Arc<dyn EventSink>,
			&h.factory,
		)
		.unwrap()
		.expect("fresh attach returns an event stream");

	let engine = Arc::new(h.engine);
	let pumping = {
		let engine = Arc::clone(&engine);
		tokio::spawn(async move { engine.pump(events).await })
	};

	let controller = h.factory.controller().unwrap();
	controller.thread_created(ThreadHandle(1));
	controller.process_loaded(true);
	for _ in 0..8 {
		tokio::task::yield_now().await;
	}

	assert_eq!(
		h.sink.event_names(),
		vec!["engine-create", "program-create", "thread-create", "load-complete-running"]
	);
	assert_eq!(h.factory.attaches().len(), 1);
	pumping.abort();
}
