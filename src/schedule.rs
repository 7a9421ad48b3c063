//! Deferred work: effect checks run "after the current synchronous work, before the next visual update".

use core::{cell::RefCell, fmt, mem};
use std::collections::VecDeque;
use tracing::{instrument, trace};

pub type Task = Box<dyn FnOnce()>;

/// Defers a task to the next UI tick. Injected into each [`Component`](`crate::component::Component`).
///
/// There is no way to cancel a task once it is scheduled.
pub trait Scheduler {
	fn schedule(&self, task: Task);
}

/// A FIFO of tasks that the host integration drains once per tick with [`TaskQueue::run_pending`].
#[derive(Default)]
pub struct TaskQueue {
	tasks: RefCell<VecDeque<Task>>,
}
impl TaskQueue {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.tasks.borrow().len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.tasks.borrow().is_empty()
	}

	/// Runs the tasks that were queued before this call, in order, and returns how many ran.
	///
	/// Tasks scheduled while draining are left for the next call.
	#[instrument(skip(self))]
	pub fn run_pending(&self) -> usize {
		let batch = mem::take(&mut *self.tasks.borrow_mut());
		let count = batch.len();
		for task in batch {
			task()
		}
		trace!("Ran {} task(s), {} pending.", count, self.len());
		count
	}
}
impl Scheduler for TaskQueue {
	fn schedule(&self, task: Task) {
		self.tasks.borrow_mut().push_back(task)
	}
}
impl fmt::Debug for TaskQueue {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("TaskQueue").field("len", &self.len()).finish()
	}
}
