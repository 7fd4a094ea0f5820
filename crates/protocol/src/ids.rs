//! Identifier tokens shared with the debug host.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of the engine this crate implements.
///
/// Duplicated in external launcher tooling and cannot be changed.
pub const ENGINE_ID: EngineId = EngineId("{0A638DAC-429B-4973-ADA0-E8DCDFB29B61}");

/// Identifier of the source language this engine debugs.
///
/// Duplicated in external launcher tooling and cannot be changed.
pub const LANGUAGE_ID: LanguageId = LanguageId("{F7FA31DA-C32A-11D0-B442-00A0244A1DD2}");

/// Name the engine reports to the host.
pub const ENGINE_NAME: &str = "Node Engine";

/// Opaque engine identifier as the host knows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EngineId(pub &'static str);

impl fmt::Display for EngineId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.0)
	}
}

/// Opaque language identifier as the host knows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LanguageId(pub &'static str);

impl fmt::Display for LanguageId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.0)
	}
}

/// Program identifier assigned by the host when attach completes.
///
/// The engine never mints these; it hands back whatever the host passed in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProgramId(pub String);

impl ProgramId {
	pub fn new(token: impl Into<String>) -> Self {
		Self(token.into())
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for ProgramId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}
