//! Session state machine core of the Node.js debug engine.
//!
//! The engine mediates between two protocols: the debug host's synchronous
//! command surface (attach, launch, step, breakpoints, exception policy) and
//! the asynchronous event stream of an out-of-process debuggee. It owns the
//! attach/launch sequencing, the load-complete gating, the thread/module
//! identity mapping, and the translation of debuggee events into host
//! notifications.
//!
//! The host-adapter layer that marshals a concrete IDE's debug contract onto
//! this API is a consumer of this crate, not part of it.

pub mod breakpoints;
pub mod engine;
pub mod error;
pub mod events;
pub mod exceptions;
pub mod identity;
pub mod registry;

pub use breakpoints::{BoundBreakpoint, BreakpointBinder, BreakpointRequest, PendingBreakpoint};
pub use engine::{
	AttachRequest, DebugEngine, EngineState, LaunchRequest, Launched, ProcessDescriptor,
};
pub use error::{EngineError, Result};
pub use events::{EngineObserver, EventSink, HostEvent, SinkGone};
pub use identity::{IdentityRegistry, ModuleIdentity, ThreadIdentity};
pub use registry::EngineRegistry;
