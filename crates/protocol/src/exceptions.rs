//! Exception states and treatments.
//!
//! The host describes how each exception category should be handled with a
//! state bitmask; the debuggee session understands the coarser
//! [`ExceptionHitTreatment`]. Translation between the two lives here.

use crate::ids::EngineId;
use serde::{Deserialize, Serialize};
use std::ops::{BitOr, BitOrAssign};

/// Name of the catch-all exception category owned by this engine. Entries
/// with this name update the default treatment instead of a named one.
pub const DEFAULT_EXCEPTION_CATEGORY: &str = "Node.js Exceptions";

/// Host exception-state bitmask.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExceptionState(u32);

impl ExceptionState {
	pub const NONE: ExceptionState = ExceptionState(0);
	pub const STOP_FIRST_CHANCE: ExceptionState = ExceptionState(0x0001);
	pub const STOP_SECOND_CHANCE: ExceptionState = ExceptionState(0x0002);
	pub const STOP_USER_FIRST_CHANCE: ExceptionState = ExceptionState(0x0010);
	pub const STOP_USER_UNCAUGHT: ExceptionState = ExceptionState(0x0020);

	pub fn contains(self, other: ExceptionState) -> bool {
		self.0 & other.0 == other.0
	}
}

impl BitOr for ExceptionState {
	type Output = ExceptionState;

	fn bitor(self, rhs: ExceptionState) -> ExceptionState {
		ExceptionState(self.0 | rhs.0)
	}
}

impl BitOrAssign for ExceptionState {
	fn bitor_assign(&mut self, rhs: ExceptionState) {
		self.0 |= rhs.0;
	}
}

/// How the debuggee session treats a thrown exception in a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExceptionHitTreatment {
	BreakAlways,
	/// Defined for completeness but never produced: the runtime has a
	/// catch-all handler, so no exception is distinguishably unhandled on
	/// this path.
	BreakOnUnhandled,
	BreakNever,
}

impl ExceptionHitTreatment {
	/// Translates a host state bitmask into a treatment.
	pub fn from_state(state: ExceptionState) -> ExceptionHitTreatment {
		if state.contains(ExceptionState::STOP_FIRST_CHANCE) {
			ExceptionHitTreatment::BreakAlways
		} else {
			ExceptionHitTreatment::BreakNever
		}
	}
}

/// One entry of a host exception-policy batch update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound(deserialize = "'de: 'static"))]
pub struct ExceptionInfo {
	/// Engine that owns the category. Entries for other engines are ignored.
	pub engine: EngineId,
	/// Category name; [`DEFAULT_EXCEPTION_CATEGORY`] selects the catch-all.
	pub name: String,
	pub state: ExceptionState,
}
