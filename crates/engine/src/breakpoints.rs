//! Breakpoint-manager contract.
//!
//! Pending/bound breakpoint ownership lives outside the engine; the engine
//! triggers pending-breakpoint creation, resolves debuggee-native breakpoint
//! handles to bound breakpoints when they hit, and clears all bound
//! breakpoints on detach. Bind outcomes re-enter the engine through
//! [`DebugEngine::breakpoint_bind_succeeded`] and
//! [`DebugEngine::breakpoint_bind_failed`].
//!
//! [`DebugEngine::breakpoint_bind_succeeded`]: crate::engine::DebugEngine::breakpoint_bind_succeeded
//! [`DebugEngine::breakpoint_bind_failed`]: crate::engine::DebugEngine::breakpoint_bind_failed

use crate::error::Result;
use nodedbg_protocol::LanguageId;
use nodedbg_runtime::BreakpointHandle;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// A host request for a breakpoint at a source location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BreakpointRequest {
	pub language: LanguageId,
	pub path: String,
	pub line: u32,
	pub condition: Option<String>,
}

/// A breakpoint request accepted by the manager but not yet resolved to a
/// concrete location in the running debuggee.
#[derive(Debug, PartialEq, Eq)]
pub struct PendingBreakpoint {
	pub request: BreakpointRequest,
}

/// A breakpoint resolved to a concrete location in the running debuggee.
#[derive(Debug, PartialEq, Eq)]
pub struct BoundBreakpoint {
	pub handle: BreakpointHandle,
	pub path: String,
	pub line: u32,
}

/// Contract the breakpoint manager exposes to the engine.
pub trait BreakpointBinder: Send + Sync {
	/// Creates a pending breakpoint. The engine has already verified the
	/// request's language before delegating.
	fn create_pending(&self, request: &BreakpointRequest) -> Result<Arc<PendingBreakpoint>>;

	/// Resolves a debuggee-native breakpoint to its bound breakpoint.
	fn resolve_bound(&self, handle: BreakpointHandle) -> Option<Arc<BoundBreakpoint>>;

	/// Removes every bound breakpoint from the debuggee.
	fn clear_all_bound(&self);
}

/// In-memory [`BreakpointBinder`] for tests: pending breakpoints are always
/// accepted, bound breakpoints are registered up front by the test.
#[derive(Default)]
pub struct FakeBreakpointBinder {
	bound: Mutex<HashMap<BreakpointHandle, Arc<BoundBreakpoint>>>,
	pending: Mutex<Vec<Arc<PendingBreakpoint>>>,
	cleared: Mutex<u32>,
}

impl FakeBreakpointBinder {
	pub fn new() -> Self {
		Self::default()
	}

	/// Registers a bound breakpoint the debuggee may report hits for.
	pub fn bind(&self, handle: BreakpointHandle, path: &str, line: u32) -> Arc<BoundBreakpoint> {
		let bound = Arc::new(BoundBreakpoint {
			handle,
			path: path.to_string(),
			line,
		});
		self.bound.lock().insert(handle, Arc::clone(&bound));
		bound
	}

	/// Pending breakpoints created through the engine, in order.
	pub fn pending(&self) -> Vec<Arc<PendingBreakpoint>> {
		self.pending.lock().clone()
	}

	/// How many times the engine cleared all bound breakpoints.
	pub fn clear_count(&self) -> u32 {
		*self.cleared.lock()
	}
}

impl BreakpointBinder for FakeBreakpointBinder {
	fn create_pending(&self, request: &BreakpointRequest) -> Result<Arc<PendingBreakpoint>> {
		let pending = Arc::new(PendingBreakpoint {
			request: request.clone(),
		});
		self.pending.lock().push(Arc::clone(&pending));
		Ok(pending)
	}

	fn resolve_bound(&self, handle: BreakpointHandle) -> Option<Arc<BoundBreakpoint>> {
		self.bound.lock().get(&handle).cloned()
	}

	fn clear_all_bound(&self) {
		self.bound.lock().clear();
		*self.cleared.lock() += 1;
	}
}
