//! Batch translation of host exception policy into debuggee treatments.

use nodedbg_protocol::{
	DEFAULT_EXCEPTION_CATEGORY, ENGINE_ID, ExceptionHitTreatment, ExceptionInfo,
};

/// A host exception batch reduced to one debuggee-session call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreatmentBatch {
	/// New catch-all treatment, when the batch addressed the default
	/// category.
	pub default: Option<ExceptionHitTreatment>,
	/// Named-category treatments, in host order.
	pub named: Vec<(String, ExceptionHitTreatment)>,
}

/// Partitions a host exception batch into the default-category treatment and
/// named-category treatments.
///
/// Only entries owned by this engine participate; entries carrying another
/// engine's identifier are ignored. Returns `None` when nothing in the batch
/// was ours, in which case no session call is made at all.
pub fn partition_batch(infos: &[ExceptionInfo]) -> Option<TreatmentBatch> {
	let mut default = None;
	let mut named = Vec::new();
	let mut ours = false;

	for info in infos {
		if info.engine != ENGINE_ID {
			continue;
		}
		ours = true;
		let treatment = ExceptionHitTreatment::from_state(info.state);
		if info.name == DEFAULT_EXCEPTION_CATEGORY {
			default = Some(treatment);
		} else {
			named.push((info.name.clone(), treatment));
		}
	}

	ours.then_some(TreatmentBatch { default, named })
}
