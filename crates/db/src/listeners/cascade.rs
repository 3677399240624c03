use std::sync::Arc;

use annota_primitives::DbId;

use super::{CascadeObserver, ListenerHandle, ObserverSet, deregister_internal_id, register_internal_id};
use crate::error::{DbResult, SystemError};
use crate::index::DbIndex;

/// Cascade depth counter plus its observers.
///
/// Brackets nest; observers hear only the outermost begin (0 to 1) and end (1 to 0).
#[derive(Debug, Default)]
pub struct CascadeListeners {
	depth: u32,
	internal: Vec<DbId>,
	external: ObserverSet<dyn CascadeObserver>,
}

impl CascadeListeners {
	pub fn new() -> Self {
		Self::default()
	}

	#[inline]
	pub fn depth(&self) -> u32 {
		self.depth
	}

	#[inline]
	pub fn in_cascade(&self) -> bool {
		self.depth > 0
	}

	/// Opens a bracket. Returns `true` when this is the outermost one.
	pub(crate) fn enter(&mut self) -> bool {
		self.depth += 1;
		tracing::debug!(depth = self.depth, "cascade begin");
		self.depth == 1
	}

	/// Closes a bracket. Returns `true` when the outermost one closed.
	pub(crate) fn exit(&mut self) -> DbResult<bool> {
		if self.depth == 0 {
			return Err(SystemError::CascadeUnderflow.into());
		}
		self.depth -= 1;
		tracing::debug!(depth = self.depth, "cascade end");
		Ok(self.depth == 0)
	}

	/// Internal cascade listeners in registration order.
	#[inline]
	pub fn internal(&self) -> &[DbId] {
		&self.internal
	}

	pub fn register_internal(&mut self, id: DbId, idx: &DbIndex) -> DbResult<()> {
		register_internal_id(&mut self.internal, DbId::INVALID, id, idx)
	}

	pub fn deregister_internal(&mut self, id: DbId) -> DbResult<()> {
		deregister_internal_id(&mut self.internal, DbId::INVALID, id)
	}

	pub fn register_external(&mut self, observer: Arc<dyn CascadeObserver>) -> ListenerHandle {
		self.external.register(observer)
	}

	pub fn deregister_external(&mut self, handle: ListenerHandle) -> DbResult<()> {
		self.external.deregister(DbId::INVALID, handle)
	}

	pub(crate) fn notify_external_begin(&self) {
		for observer in self.external.snapshot() {
			observer.begin_cascade();
		}
	}

	pub(crate) fn notify_external_end(&self) {
		for observer in self.external.snapshot() {
			observer.end_cascade();
		}
	}
}
