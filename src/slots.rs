//! Positional hook bookkeeping.
//!
//! Slots are addressed by call order within one render, not by name.
//! A render callback that calls hooks conditionally or in a loop shifts every later slot
//! and silently hands state to the wrong hook. This is not detected.

use core::any::{type_name, Any};
use tracing::warn;

pub(crate) type Cleanup = Box<dyn FnOnce()>;
pub(crate) type Effect = Box<dyn FnOnce() -> Option<Cleanup>>;

#[derive(Default)]
pub(crate) struct StateSlots {
	slots: Vec<Box<dyn Any>>,
	cursor: usize,
}
impl StateSlots {
	pub fn begin_render(&mut self) {
		self.cursor = 0;
	}

	/// Claims the next slot, seeding it with `initial` on first use.
	pub fn claim<T: Clone + 'static>(&mut self, initial: T) -> (usize, T) {
		let index = self.cursor;
		self.cursor += 1;

		match self.slots.get(index).map(|slot| slot.downcast_ref::<T>()) {
			None => {
				self.slots.push(Box::new(initial.clone()));
				(index, initial)
			}
			Some(Some(value)) => (index, value.clone()),
			Some(None) => {
				warn!(
					"State slot {} does not hold a `{}`. Hooks were probably called in a different order than before. Re-seeding the slot.",
					index,
					type_name::<T>()
				);
				self.slots[index] = Box::new(initial.clone());
				(index, initial)
			}
		}
	}

	pub fn write(&mut self, index: usize, value: Box<dyn Any>) {
		match self.slots.get_mut(index) {
			Some(slot) => *slot = value,
			None => warn!("Ignoring write to unclaimed state slot {}.", index),
		}
	}

	pub fn len(&self) -> usize {
		self.slots.len()
	}
}

pub(crate) struct PendingEffect {
	deps: Box<dyn Any>,
	changed: fn(&dyn Any, &dyn Any) -> bool,
	effect: Effect,
}
impl PendingEffect {
	pub fn new<D: PartialEq + 'static>(deps: D, effect: Effect) -> Self {
		Self {
			deps: Box::new(deps),
			changed: deps_changed::<D>,
			effect,
		}
	}
}

fn deps_changed<D: PartialEq + 'static>(previous: &dyn Any, next: &dyn Any) -> bool {
	match (previous.downcast_ref::<D>(), next.downcast_ref::<D>()) {
		(Some(previous), Some(next)) => previous != next,
		_ => true,
	}
}

#[derive(Default)]
struct EffectRecord {
	/// Dependencies of the last run.
	deps: Option<Box<dyn Any>>,
	cleanup: Option<Cleanup>,
	/// Registered by the latest render, consumed by the next check.
	pending: Option<PendingEffect>,
}

#[derive(Default)]
pub(crate) struct EffectSlots {
	records: Vec<EffectRecord>,
	cursor: usize,
}
impl EffectSlots {
	pub fn begin_render(&mut self) {
		self.cursor = 0;
	}

	pub fn claim(&mut self, pending: PendingEffect) -> usize {
		let index = self.cursor;
		self.cursor += 1;
		if index == self.records.len() {
			self.records.push(EffectRecord::default());
		}
		self.records[index].pending = Some(pending);
		index
	}

	pub fn len(&self) -> usize {
		self.records.len()
	}

	/// Consumes the pending registration at `index`.
	///
	/// If it is due (first run, or changed dependencies), commits its dependencies and returns
	/// the previous cleanup (if any) along with the effect to run.
	pub fn take_due(&mut self, index: usize) -> Option<(Option<Cleanup>, Effect)> {
		let record = self.records.get_mut(index)?;
		let pending = record.pending.take()?;
		let due = match &record.deps {
			None => true,
			Some(previous) => (pending.changed)(&**previous, &*pending.deps),
		};
		if !due {
			return None;
		}
		record.deps = Some(pending.deps);
		Some((record.cleanup.take(), pending.effect))
	}

	pub fn store_cleanup(&mut self, index: usize, cleanup: Option<Cleanup>) {
		if let Some(record) = self.records.get_mut(index) {
			record.cleanup = cleanup;
		}
	}

	/// Takes every stored cleanup in slot order and drops all pending registrations.
	pub fn take_cleanups(&mut self) -> Vec<Cleanup> {
		self.records
			.iter_mut()
			.filter_map(|record| {
				record.pending = None;
				record.cleanup.take()
			})
			.collect()
	}
}
