//! Engine error taxonomy.
//!
//! The host adapter maps these onto its tri-state result convention:
//! `Ok` is success, [`EngineError::NotImplemented`] is the soft
//! not-supported signal, and everything else is a hard failure. Soft
//! "not this process" negatives are modeled as `Ok(false)` on the
//! process-identity commands, not as errors.

use nodedbg_runtime::SessionError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, EngineError>;

#[derive(Debug, Error)]
pub enum EngineError {
	/// The host supplied more or fewer programs than the one this engine
	/// debugs per session.
	#[error("debug engine supports exactly one program per session")]
	SingleProgramOnly,

	#[error("target process has already been launched")]
	AlreadyLaunched,

	/// Attach requested for a different process while a session is live.
	#[error("attach requested for process {requested} while debugging process {current}")]
	ProcessMismatch { requested: u32, current: u32 },

	#[error("no debuggee session is active")]
	NotAttached,

	/// Resume arrived before the host completed attach; the program
	/// identifier is still empty.
	#[error("attach never completed; program identifier is empty")]
	AttachIncomplete,

	#[error("attach request carries no debugger endpoint")]
	AttachEndpointMissing,

	#[error("breakpoint request is for a language this engine does not debug")]
	LanguageMismatch,

	/// Soft answer to a destroy-program request: the engine already knows
	/// the program is exiting and will send program-destroy itself.
	#[error("program destroy is already pending")]
	ProgramDestroyPending,

	#[error("operation is not implemented by this engine")]
	NotImplemented,

	#[error(transparent)]
	Session(#[from] SessionError),
}
