//! Host-protocol value types for the Node.js debug engine.
//!
//! This crate contains the plain data types that cross the seam between the
//! host adapter (the IDE-facing layer) and the engine core: identifier
//! constants, option bitmasks, the launch options-string grammar, step kinds,
//! and exception states/treatments.
//!
//! # Design Philosophy
//!
//! Types in this crate are:
//! * Pure data: no behavior beyond parsing and bitmask translation
//! * Fixed on the wire: identifier GUIDs and option key names cannot change
//! * Host-shaped: they mirror what the debug host hands the engine verbatim
//!
//! The state machine built on top of these types lives in `nodedbg`.

pub mod exceptions;
pub mod ids;
pub mod options;
pub mod stepping;

pub use exceptions::*;
pub use ids::*;
pub use options::*;
pub use stepping::*;
