//! Launch options-string grammar and debug-option bitmasks.
//!
//! The host passes launch configuration as a semicolon-delimited list of
//! `KEY=VALUE` entries. A doubled semicolon (`;;`) inside a value is an
//! escape for a literal `;`, not an entry separator, and a trailing entry
//! without a terminating `;` is still an entry.

use serde::{Deserialize, Serialize};
use std::ops::{BitOr, BitOrAssign};

/// Prompt for input before exiting on an abnormal exit.
pub const WAIT_ON_ABNORMAL_EXIT_SETTING: &str = "WAIT_ON_ABNORMAL_EXIT";

/// Prompt for input before exiting on a normal exit.
pub const WAIT_ON_NORMAL_EXIT_SETTING: &str = "WAIT_ON_NORMAL_EXIT";

/// Redirect debuggee output to the host's output surface.
pub const REDIRECT_OUTPUT_SETTING: &str = "REDIRECT_OUTPUT";

/// Options passed to the interpreter ahead of the script. Semicolons inside
/// the value must be escaped as `;;`.
pub const INTERPRETER_OPTIONS_SETTING: &str = "INTERPRETER_OPTIONS";

/// Directory mapping in the form `OLD|NEW`, mapping files on the local
/// machine to files deployed on the running machine. Repeatable.
pub const DIR_MAPPING_SETTING: &str = "DIR_MAPPING";

/// Behavior flags forwarded to the debuggee session at launch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DebugOptions(u32);

impl DebugOptions {
	pub const NONE: DebugOptions = DebugOptions(0);
	pub const WAIT_ON_ABNORMAL_EXIT: DebugOptions = DebugOptions(0x01);
	pub const WAIT_ON_NORMAL_EXIT: DebugOptions = DebugOptions(0x02);
	pub const REDIRECT_OUTPUT: DebugOptions = DebugOptions(0x04);

	pub fn contains(self, other: DebugOptions) -> bool {
		self.0 & other.0 == other.0
	}

	pub fn is_empty(self) -> bool {
		self.0 == 0
	}

	pub fn bits(self) -> u32 {
		self.0
	}
}

impl BitOr for DebugOptions {
	type Output = DebugOptions;

	fn bitor(self, rhs: DebugOptions) -> DebugOptions {
		DebugOptions(self.0 | rhs.0)
	}
}

impl BitOrAssign for DebugOptions {
	fn bitor_assign(&mut self, rhs: DebugOptions) {
		self.0 |= rhs.0;
	}
}

/// Host launch-flags bitmask. Opaque to the engine; carried through to the
/// debuggee session untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LaunchFlags(pub u32);

/// One `OLD|NEW` directory mapping entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirMapping {
	pub local: String,
	pub remote: String,
}

/// Parsed launch options string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LaunchOptions {
	pub wait_on_abnormal_exit: bool,
	pub wait_on_normal_exit: bool,
	pub redirect_output: bool,
	pub interpreter_options: Option<String>,
	pub dir_mappings: Vec<DirMapping>,
}

impl LaunchOptions {
	/// Parses an options string. Unrecognized keys and malformed entries are
	/// ignored rather than rejected; the host sends settings for several
	/// engines through the same string.
	pub fn parse(options: &str) -> LaunchOptions {
		let mut parsed = LaunchOptions::default();
		for entry in split_options(options) {
			let Some((key, value)) = entry.split_once('=') else {
				continue;
			};
			match key {
				WAIT_ON_ABNORMAL_EXIT_SETTING => {
					parsed.wait_on_abnormal_exit = parse_bool(value);
				}
				WAIT_ON_NORMAL_EXIT_SETTING => {
					parsed.wait_on_normal_exit = parse_bool(value);
				}
				REDIRECT_OUTPUT_SETTING => {
					parsed.redirect_output = parse_bool(value);
				}
				INTERPRETER_OPTIONS_SETTING => {
					parsed.interpreter_options = Some(value.to_string());
				}
				DIR_MAPPING_SETTING => {
					let dirs: Vec<&str> = value.split('|').collect();
					if let [local, remote] = dirs[..] {
						parsed.dir_mappings.push(DirMapping {
							local: local.to_string(),
							remote: remote.to_string(),
						});
					}
				}
				_ => {}
			}
		}
		parsed
	}

	/// Collapses the boolean settings into the debuggee-session bitmask.
	pub fn debug_options(&self) -> DebugOptions {
		let mut options = DebugOptions::NONE;
		if self.wait_on_abnormal_exit {
			options |= DebugOptions::WAIT_ON_ABNORMAL_EXIT;
		}
		if self.wait_on_normal_exit {
			options |= DebugOptions::WAIT_ON_NORMAL_EXIT;
		}
		if self.redirect_output {
			options |= DebugOptions::REDIRECT_OUTPUT;
		}
		options
	}
}

/// Splits an options string on `;`, unescaping `;;` to a literal `;`.
fn split_options(options: &str) -> Vec<String> {
	let mut entries = Vec::new();
	let mut current = String::new();
	let mut chars = options.chars().peekable();

	while let Some(c) = chars.next() {
		if c != ';' {
			current.push(c);
			continue;
		}
		if chars.peek() == Some(&';') {
			chars.next();
			current.push(';');
		} else {
			entries.push(std::mem::take(&mut current));
		}
	}
	if !current.is_empty() {
		entries.push(current);
	}
	entries
}

fn parse_bool(value: &str) -> bool {
	value.eq_ignore_ascii_case("true")
}
