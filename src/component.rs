//! Stateful components: one node tree per mount point, re-reconciled whenever local state changes.
//!
//! # Hook rules
//!
//! [`Hooks::use_state`] and [`Hooks::use_effect`] address their slots by call order.
//! A render callback must call them unconditionally, the same number of times and in the same order on every render.
//! Violations are not detected and corrupt unrelated state.

use crate::{
	diff::patch,
	host::Host,
	node::Node,
	schedule::Scheduler,
	slots::{Cleanup, EffectSlots, PendingEffect, StateSlots},
};
use core::{
	any::Any,
	cell::{Cell, Ref, RefCell},
	fmt,
	marker::PhantomData,
	sync::atomic::{AtomicU64, Ordering},
};
use std::rc::{Rc, Weak};
use tracing::{debug, instrument, trace, trace_span, warn};

/// Addresses a component, for example in server action requests.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ComponentId(String);
impl ComponentId {
	/// A fresh identity, unique within this process (and randomized in the browser).
	#[must_use]
	pub fn generate() -> Self {
		static NEXT: AtomicU64 = AtomicU64::new(0);
		let serial = NEXT.fetch_add(1, Ordering::Relaxed);

		#[cfg(target_arch = "wasm32")]
		{
			#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
			let random = (js_sys::Math::random() * 2_f64.powi(32)) as u64;
			Self(format!("{}{}", to_base36(random), to_base36(serial)))
		}
		#[cfg(not(target_arch = "wasm32"))]
		{
			Self(format!("c{}", to_base36(serial)))
		}
	}

	#[must_use]
	pub fn as_str(&self) -> &str {
		&self.0
	}
}
impl fmt::Display for ComponentId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}
impl From<&str> for ComponentId {
	fn from(id: &str) -> Self {
		Self(id.to_owned())
	}
}
impl From<String> for ComponentId {
	fn from(id: String) -> Self {
		Self(id)
	}
}

fn to_base36(mut n: u64) -> String {
	const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
	let mut digits = Vec::new();
	loop {
		digits.push(DIGITS[(n % 36) as usize]);
		n /= 36;
		if n == 0 {
			break;
		}
	}
	digits.reverse();
	String::from_utf8(digits).unwrap_or_default()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
	Idle,
	Rendering,
	/// A setter ran during the current render, so another one follows immediately.
	RenderQueued,
	Unmounted,
}

/// What setters and effect checks need from their component, independent of its property and host types.
trait Owner {
	fn write_state(&self, index: usize, value: Box<dyn Any>);
	fn request_update(&self);
}

type RenderFn<P, A> = Box<dyn FnMut(&P, &mut Hooks<'_>) -> Node<A>>;

struct Inner<P, H: Host> {
	this: Weak<Self>,
	identity: ComponentId,
	properties: P,
	mount_point: H::Artifact,
	host: H,
	scheduler: Rc<dyn Scheduler>,
	render: RefCell<RenderFn<P, H::Artifact>>,
	tree: RefCell<Option<Node<H::Artifact>>>,
	state: RefCell<StateSlots>,
	effects: RefCell<EffectSlots>,
	phase: Cell<Phase>,
}

impl<P: 'static, H: Host + 'static> Inner<P, H> {
	fn owner(&self) -> Weak<dyn Owner> {
		self.this.clone()
	}

	#[instrument(skip(self), fields(identity = %self.identity))]
	fn update(&self) {
		match self.phase.get() {
			Phase::Unmounted => return debug!("Ignoring update of unmounted component."),
			Phase::Rendering | Phase::RenderQueued => {
				trace!("Update requested during render. Queueing another render.");
				return self.phase.set(Phase::RenderQueued);
			}
			Phase::Idle => (),
		}

		loop {
			self.phase.set(Phase::Rendering);
			self.render_once();
			match self.phase.get() {
				Phase::RenderQueued => continue,
				Phase::Rendering => {
					self.phase.set(Phase::Idle);
					break;
				}
				Phase::Idle | Phase::Unmounted => break,
			}
		}
	}

	fn render_once(&self) {
		self.state.borrow_mut().begin_render();
		self.effects.borrow_mut().begin_render();

		let new_tree = {
			let span = trace_span!("Rendering");
			let _enter = span.enter();
			let mut hooks = Hooks {
				owner: self.owner(),
				state: &self.state,
				effects: &self.effects,
			};
			let mut render = self.render.borrow_mut();
			(*render)(&self.properties, &mut hooks)
		};

		if self.phase.get() == Phase::Unmounted {
			// The render callback unmounted this component.
			return trace!("Discarding tree rendered during unmount.");
		}

		let old_tree = self.tree.borrow_mut().take();
		let current = patch(&self.host, &self.mount_point, old_tree, Some(new_tree));
		*self.tree.borrow_mut() = current;

		let this = self.this.clone();
		self.scheduler.schedule(Box::new(move || match this.upgrade() {
			Some(this) => this.run_effects(),
			None => trace!("Component dropped before its effect check."),
		}));
	}

	/// One effect check pass, operating on whatever registrations exist when it runs.
	#[instrument(skip(self), fields(identity = %self.identity))]
	fn run_effects(&self) {
		if self.phase.get() == Phase::Unmounted {
			return trace!("Skipping effect check of unmounted component.");
		}

		let count = self.effects.borrow().len();
		for index in 0..count {
			let due = self.effects.borrow_mut().take_due(index);
			if let Some((cleanup, effect)) = due {
				trace!(index, "Running effect.");
				if let Some(cleanup) = cleanup {
					cleanup()
				}
				let cleanup = effect();
				if self.phase.get() == Phase::Unmounted {
					// Unmounted by the effect itself.
					if let Some(cleanup) = cleanup {
						cleanup()
					}
					return;
				}
				self.effects.borrow_mut().store_cleanup(index, cleanup);
			}
		}
	}
}

impl<P: 'static, H: Host + 'static> Owner for Inner<P, H> {
	fn write_state(&self, index: usize, value: Box<dyn Any>) {
		self.state.borrow_mut().write(index, value)
	}

	fn request_update(&self) {
		self.update()
	}
}

/// The hook primitives available to a render callback.
pub struct Hooks<'a> {
	owner: Weak<dyn Owner>,
	state: &'a RefCell<StateSlots>,
	effects: &'a RefCell<EffectSlots>,
}
impl Hooks<'_> {
	/// Claims the next state slot.
	///
	/// `initial` seeds the slot on the first render and is ignored afterwards.
	/// The returned [`Setter`] overwrites the slot and re-renders the component on every call.
	pub fn use_state<T: Clone + 'static>(&mut self, initial: T) -> (T, Setter<T>) {
		let (index, value) = self.state.borrow_mut().claim(initial);
		(
			value,
			Setter {
				owner: self.owner.clone(),
				index,
				_value: PhantomData,
			},
		)
	}

	/// Registers a side effect for the next effect check, which runs after this render commits.
	///
	/// `effect` runs on the first check of this slot and whenever `deps` differs from the previous run's.
	/// Its return value is the cleanup that runs before the next run of this slot (or on unmount).
	/// With unchanged `deps`, neither the effect nor the cleanup run.
	pub fn use_effect<F, C, D>(&mut self, effect: F, deps: D)
	where
		F: FnOnce() -> Option<C> + 'static,
		C: FnOnce() + 'static,
		D: PartialEq + 'static,
	{
		let effect = Box::new(move || effect().map(|cleanup| Box::new(cleanup) as Cleanup));
		self.effects.borrow_mut().claim(PendingEffect::new(deps, effect));
	}
}
impl fmt::Debug for Hooks<'_> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Hooks")
			.field("state.len()", &self.state.borrow().len())
			.field("effects.len()", &self.effects.borrow().len())
			.finish()
	}
}

/// Writes one state slot and re-renders the owning component.
///
/// Holds only a weak reference: once the component is gone, setting is a no-op.
pub struct Setter<T> {
	owner: Weak<dyn Owner>,
	index: usize,
	_value: PhantomData<fn(T)>,
}
impl<T: 'static> Setter<T> {
	/// Stores `value` and re-renders, even if `value` equals the current state.
	pub fn set(&self, value: T) {
		match self.owner.upgrade() {
			Some(owner) => {
				owner.write_state(self.index, Box::new(value));
				owner.request_update();
			}
			None => debug!(index = self.index, "Ignoring state update for a dropped component."),
		}
	}
}
impl<T> Clone for Setter<T> {
	fn clone(&self) -> Self {
		Self {
			owner: self.owner.clone(),
			index: self.index,
			_value: PhantomData,
		}
	}
}
impl<T> fmt::Debug for Setter<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Setter").field("index", &self.index).finish()
	}
}

/// Configures a [`Component`] before its initial render.
pub struct ComponentBuilder<H: Host> {
	host: H,
	mount_point: H::Artifact,
	scheduler: Rc<dyn Scheduler>,
	identity: Option<ComponentId>,
	adopted: Option<Node<H::Artifact>>,
}
impl<H: Host + 'static> ComponentBuilder<H> {
	#[must_use]
	pub fn identity(mut self, identity: impl Into<ComponentId>) -> Self {
		self.identity = Some(identity.into());
		self
	}

	/// Uses an already materialized tree under the mount point as the current tree,
	/// so that the initial render updates it instead of appending a new one.
	#[must_use]
	pub fn adopt(mut self, tree: Node<H::Artifact>) -> Self {
		if !tree.is_materialized() {
			warn!("Adopting a tree without artifacts. The initial render will append instead.");
		}
		self.adopted = Some(tree);
		self
	}

	/// Creates the component and synchronously performs its initial render.
	pub fn mount<P: 'static>(self, properties: P, render: impl FnMut(&P, &mut Hooks<'_>) -> Node<H::Artifact> + 'static) -> Component<P, H> {
		let Self {
			host,
			mount_point,
			scheduler,
			identity,
			adopted,
		} = self;
		let identity = identity.unwrap_or_else(ComponentId::generate);
		debug!(%identity, "Mounting component.");

		let inner = Rc::new_cyclic(|this| Inner {
			this: this.clone(),
			identity,
			properties,
			mount_point,
			host,
			scheduler,
			render: RefCell::new(Box::new(render)),
			tree: RefCell::new(adopted),
			state: RefCell::default(),
			effects: RefCell::default(),
			phase: Cell::new(Phase::Idle),
		});
		inner.update();
		Component { inner }
	}
}

/// A mounted component instance. Clones are handles to the same instance.
pub struct Component<P, H: Host> {
	inner: Rc<Inner<P, H>>,
}
impl<H: Host + 'static> Component<(), H> {
	/// Starts configuring a component that renders into `mount_point`, with effect checks deferred through `scheduler`.
	pub fn builder(host: H, mount_point: H::Artifact, scheduler: Rc<dyn Scheduler>) -> ComponentBuilder<H> {
		ComponentBuilder {
			host,
			mount_point,
			scheduler,
			identity: None,
			adopted: None,
		}
	}
}
impl<P: 'static, H: Host + 'static> Component<P, H> {
	/// Shorthand for [`Component::builder`] followed by [`ComponentBuilder::mount`].
	pub fn mount(host: H, mount_point: H::Artifact, scheduler: Rc<dyn Scheduler>, properties: P, render: impl FnMut(&P, &mut Hooks<'_>) -> Node<H::Artifact> + 'static) -> Self {
		Component::builder(host, mount_point, scheduler).mount(properties, render)
	}

	#[must_use]
	pub fn identity(&self) -> &ComponentId {
		&self.inner.identity
	}

	#[must_use]
	pub fn properties(&self) -> &P {
		&self.inner.properties
	}

	#[must_use]
	pub fn mount_point(&self) -> &H::Artifact {
		&self.inner.mount_point
	}

	#[must_use]
	pub fn host(&self) -> &H {
		&self.inner.host
	}

	/// The last reconciled tree. Don't hold on to this across updates.
	#[must_use]
	pub fn tree(&self) -> Ref<'_, Option<Node<H::Artifact>>> {
		self.inner.tree.borrow()
	}

	#[must_use]
	pub fn is_mounted(&self) -> bool {
		self.inner.phase.get() != Phase::Unmounted
	}

	/// Runs a full render cycle now.
	pub fn update(&self) {
		self.inner.update()
	}

	/// Runs every stored effect cleanup, removes the tree from the mount point and stops all further updates.
	///
	/// Effect checks that are already scheduled do nothing once they run.
	#[instrument(skip(self), fields(identity = %self.inner.identity))]
	pub fn unmount(&self) {
		let inner = &self.inner;
		if inner.phase.get() == Phase::Unmounted {
			return debug!("Already unmounted.");
		}
		inner.phase.set(Phase::Unmounted);

		let cleanups = inner.effects.borrow_mut().take_cleanups();
		trace!("Running {} cleanup(s).", cleanups.len());
		for cleanup in cleanups {
			cleanup()
		}

		let tree = inner.tree.borrow_mut().take();
		let removed = patch(&inner.host, &inner.mount_point, tree, None);
		debug_assert!(removed.is_none());
	}
}
impl<P, H: Host> Clone for Component<P, H> {
	fn clone(&self) -> Self {
		Self { inner: self.inner.clone() }
	}
}
impl<P, H: Host> fmt::Debug for Component<P, H> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Component")
			.field("identity", &self.inner.identity)
			.field("mount_point", &self.inner.mount_point)
			.field("phase", &self.inner.phase.get())
			.finish_non_exhaustive()
	}
}
