//! Step requests as the host issues them.

use serde::{Deserialize, Serialize};

/// Kind of step the host requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
	Into,
	Over,
	Out,
}

/// Granularity of a step request.
///
/// The debuggee runtime only steps at statement granularity, so the engine
/// accepts and ignores the unit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepUnit {
	#[default]
	Statement,
	Line,
	Instruction,
}
