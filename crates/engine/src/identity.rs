//! Mapping between debuggee-native handles and adapter-facing identities.

use nodedbg_runtime::{ModuleHandle, ModuleInfo, ThreadHandle, ThreadInfo};
use std::sync::Arc;

/// Adapter-facing thread object the host receives in notifications.
#[derive(Debug, PartialEq, Eq)]
pub struct ThreadIdentity {
	pub handle: ThreadHandle,
	pub name: Option<String>,
}

impl ThreadIdentity {
	pub fn from_info(info: &ThreadInfo) -> Self {
		Self {
			handle: info.handle,
			name: info.name.clone(),
		}
	}

	/// User-displayable thread name.
	pub fn display_name(&self) -> String {
		match &self.name {
			Some(name) => name.clone(),
			None => format!("Thread {}", self.handle),
		}
	}
}

/// Adapter-facing module object the host receives in notifications.
#[derive(Debug, PartialEq, Eq)]
pub struct ModuleIdentity {
	pub handle: ModuleHandle,
	pub name: String,
	pub source_path: Option<String>,
}

impl ModuleIdentity {
	pub fn from_info(info: &ModuleInfo) -> Self {
		Self {
			handle: info.handle,
			name: info.name.clone(),
			source_path: info.source_path.clone(),
		}
	}
}

/// Insertion-ordered handle-to-identity map.
///
/// Entries are created lazily on first observation and live until the
/// debuggee reports them gone or the session is destroyed. Insertion order
/// is creation order, which is what designates the main thread.
#[derive(Debug)]
pub struct IdentityRegistry<H, I> {
	entries: Vec<(H, Arc<I>)>,
}

impl<H: Copy + PartialEq, I> IdentityRegistry<H, I> {
	pub fn new() -> Self {
		Self { entries: Vec::new() }
	}

	/// Returns the identity for `handle`, creating it with `make` when this
	/// is the first observation. The `bool` reports whether an insert
	/// happened.
	pub fn register_with(&mut self, handle: H, make: impl FnOnce() -> I) -> (Arc<I>, bool) {
		if let Some(existing) = self.resolve(handle) {
			return (existing, false);
		}
		let identity = Arc::new(make());
		self.entries.push((handle, Arc::clone(&identity)));
		(identity, true)
	}

	pub fn resolve(&self, handle: H) -> Option<Arc<I>> {
		self.entries
			.iter()
			.find(|(h, _)| *h == handle)
			.map(|(_, identity)| Arc::clone(identity))
	}

	pub fn remove(&mut self, handle: H) -> Option<Arc<I>> {
		let index = self.entries.iter().position(|(h, _)| *h == handle)?;
		Some(self.entries.remove(index).1)
	}

	/// Identities in creation order.
	pub fn iter(&self) -> impl Iterator<Item = &Arc<I>> {
		self.entries.iter().map(|(_, identity)| identity)
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	pub fn clear(&mut self) {
		self.entries.clear();
	}
}

impl<H: Copy + PartialEq, I> Default for IdentityRegistry<H, I> {
	fn default() -> Self {
		Self::new()
	}
}
