//! Enumeration of live engines for the owning host-adapter layer.

use crate::engine::DebugEngine;
use parking_lot::Mutex;
use std::sync::{Arc, Weak};

/// Weakly-held set of live engines, for diagnostics and enumeration.
///
/// Owned by whichever layer creates engines; there is no implicit global.
/// Entries do not keep an engine alive, and dropped engines are pruned on
/// the next enumeration.
#[derive(Default)]
pub struct EngineRegistry {
	engines: Mutex<Vec<Weak<DebugEngine>>>,
}

impl EngineRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn add(&self, engine: &Arc<DebugEngine>) {
		self.engines.lock().push(Arc::downgrade(engine));
	}

	pub fn remove(&self, engine: &Arc<DebugEngine>) {
		self.engines.lock().retain(|weak| match weak.upgrade() {
			Some(live) => !Arc::ptr_eq(&live, engine),
			None => false,
		});
	}

	/// Live engines in registration order.
	pub fn engines(&self) -> Vec<Arc<DebugEngine>> {
		let mut engines = self.engines.lock();
		engines.retain(|weak| weak.strong_count() > 0);
		engines.iter().filter_map(Weak::upgrade).collect()
	}
}
