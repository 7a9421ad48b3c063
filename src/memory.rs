//! A headless [`Host`] that keeps artifacts in memory and records every mutation.
//!
//! Useful for rendering off-screen and for observing exactly what reconciliation does.

use crate::{
	host::Host,
	node::{AttrValue, Handler},
};
use core::{cell::Cell, cell::RefCell, fmt, fmt::Write as _};
use std::{collections::BTreeMap, rc::Rc};
use tracing::{trace, warn};

/// One host call, as recorded by [`MemoryHost`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
	CreateElement(String),
	CreateText(String),
	CreateMarkup(String),
	SetText(String),
	SetMarkup(String),
	SetClass(String),
	SetProperty(String),
	BindHandler(String),
	AppendChild,
	RemoveChild,
	ReplaceChild,
}

/// The event value passed to handlers by [`MemoryArtifact::dispatch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryEvent {
	pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemoryKind {
	Element(String),
	Text,
	/// Holds raw markup as its content.
	MarkupContainer,
}

struct MemoryNode {
	kind: MemoryKind,
	content: String,
	class: Option<String>,
	properties: BTreeMap<String, AttrValue>,
	handlers: BTreeMap<String, Handler>,
	children: Vec<MemoryArtifact>,
}

/// A shared handle to one in-memory artifact. Clones refer to the same artifact.
#[derive(Clone)]
pub struct MemoryArtifact(Rc<RefCell<MemoryNode>>);
impl MemoryArtifact {
	fn new(kind: MemoryKind, content: &str) -> Self {
		Self(Rc::new(RefCell::new(MemoryNode {
			kind,
			content: content.to_owned(),
			class: None,
			properties: BTreeMap::new(),
			handlers: BTreeMap::new(),
			children: Vec::new(),
		})))
	}

	/// A detached element, for example to serve as a mount point.
	#[must_use]
	pub fn element(tag: &str) -> Self {
		Self::new(MemoryKind::Element(tag.to_owned()), "")
	}

	#[must_use]
	pub fn kind(&self) -> MemoryKind {
		self.0.borrow().kind.clone()
	}

	#[must_use]
	pub fn tag(&self) -> Option<String> {
		match &self.0.borrow().kind {
			MemoryKind::Element(tag) => Some(tag.clone()),
			MemoryKind::Text | MemoryKind::MarkupContainer => None,
		}
	}

	/// Text or markup content. Empty for elements.
	#[must_use]
	pub fn content(&self) -> String {
		self.0.borrow().content.clone()
	}

	#[must_use]
	pub fn class(&self) -> Option<String> {
		self.0.borrow().class.clone()
	}

	#[must_use]
	pub fn property(&self, name: &str) -> Option<AttrValue> {
		self.0.borrow().properties.get(name).cloned()
	}

	#[must_use]
	pub fn handler(&self, event: &str) -> Option<Handler> {
		self.0.borrow().handlers.get(event).cloned()
	}

	#[must_use]
	pub fn children(&self) -> Vec<MemoryArtifact> {
		self.0.borrow().children.clone()
	}

	#[must_use]
	pub fn child(&self, index: usize) -> Option<MemoryArtifact> {
		self.0.borrow().children.get(index).cloned()
	}

	#[must_use]
	pub fn ptr_eq(&self, other: &Self) -> bool {
		Rc::ptr_eq(&self.0, &other.0)
	}

	/// Calls the handler bound for `event`, if any. Returns whether there was one.
	pub fn dispatch(&self, event: &str) -> bool {
		// Cloned out first: the handler may well mutate this artifact.
		let handler = self.handler(event);
		match handler {
			Some(handler) => {
				handler.call(&MemoryEvent { name: event.to_owned() });
				true
			}
			None => false,
		}
	}

	/// Serializes the subtree, with properties in name order. Handlers are omitted.
	#[must_use]
	pub fn to_markup(&self) -> String {
		let mut markup = String::new();
		self.write_markup(&mut markup);
		markup
	}

	fn write_markup(&self, markup: &mut String) {
		let node = self.0.borrow();
		match &node.kind {
			MemoryKind::Text => markup.push_str(&node.content),
			MemoryKind::MarkupContainer => {
				let _ = write!(markup, "<div>{}</div>", node.content);
			}
			MemoryKind::Element(tag) => {
				let _ = write!(markup, "<{}", tag);
				if let Some(class) = &node.class {
					let _ = write!(markup, " class=\"{}\"", class);
				}
				for (name, value) in &node.properties {
					let _ = write!(markup, " {}=\"{}\"", name, value);
				}
				markup.push('>');
				for child in &node.children {
					child.write_markup(markup);
				}
				let _ = write!(markup, "</{}>", tag);
			}
		}
	}
}
impl fmt::Debug for MemoryArtifact {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let node = self.0.borrow();
		f.debug_struct("MemoryArtifact")
			.field("kind", &node.kind)
			.field("children.len()", &node.children.len())
			.finish_non_exhaustive()
	}
}

/// Cheap to clone. Clones share one mutation log.
#[derive(Debug, Clone, Default)]
pub struct MemoryHost {
	mutations: Rc<RefCell<Vec<Mutation>>>,
	live_handlers: Rc<Cell<usize>>,
}
impl MemoryHost {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	#[must_use]
	pub fn mutations(&self) -> Vec<Mutation> {
		self.mutations.borrow().clone()
	}

	/// Returns and clears the mutation log.
	pub fn take_mutations(&self) -> Vec<Mutation> {
		self.mutations.take()
	}

	/// Handler references taken by [`Host::bind_handler`] and not yet released.
	#[must_use]
	pub fn live_handlers(&self) -> usize {
		self.live_handlers.get()
	}

	fn record(&self, mutation: Mutation) {
		trace!(?mutation);
		self.mutations.borrow_mut().push(mutation)
	}
}

impl Host for MemoryHost {
	type Artifact = MemoryArtifact;

	fn create_element(&self, tag: &str) -> MemoryArtifact {
		self.record(Mutation::CreateElement(tag.to_owned()));
		MemoryArtifact::element(tag)
	}

	fn create_text(&self, text: &str) -> MemoryArtifact {
		self.record(Mutation::CreateText(text.to_owned()));
		MemoryArtifact::new(MemoryKind::Text, text)
	}

	fn create_markup(&self, markup: &str) -> MemoryArtifact {
		self.record(Mutation::CreateMarkup(markup.to_owned()));
		MemoryArtifact::new(MemoryKind::MarkupContainer, markup)
	}

	fn set_text(&self, artifact: &MemoryArtifact, text: &str) {
		self.record(Mutation::SetText(text.to_owned()));
		artifact.0.borrow_mut().content = text.to_owned();
	}

	fn set_markup(&self, artifact: &MemoryArtifact, markup: &str) {
		self.record(Mutation::SetMarkup(markup.to_owned()));
		artifact.0.borrow_mut().content = markup.to_owned();
	}

	fn set_class(&self, artifact: &MemoryArtifact, class: &str) {
		self.record(Mutation::SetClass(class.to_owned()));
		artifact.0.borrow_mut().class = Some(class.to_owned());
	}

	fn set_property(&self, artifact: &MemoryArtifact, name: &str, value: &AttrValue) {
		self.record(Mutation::SetProperty(name.to_owned()));
		artifact.0.borrow_mut().properties.insert(name.to_owned(), value.clone());
	}

	fn bind_handler(&self, artifact: &MemoryArtifact, event: &str, handler: &Handler) {
		self.record(Mutation::BindHandler(event.to_owned()));
		self.live_handlers.set(self.live_handlers.get() + 1);
		artifact.0.borrow_mut().handlers.insert(event.to_owned(), handler.clone());
	}

	fn release_handler(&self, _handler: &Handler) {
		match self.live_handlers.get().checked_sub(1) {
			Some(live) => self.live_handlers.set(live),
			None => warn!("Released more handler references than were bound."),
		}
	}

	fn append_child(&self, parent: &MemoryArtifact, child: &MemoryArtifact) {
		self.record(Mutation::AppendChild);
		parent.0.borrow_mut().children.push(child.clone());
	}

	fn remove_child(&self, parent: &MemoryArtifact, child: &MemoryArtifact) {
		self.record(Mutation::RemoveChild);
		let mut parent = parent.0.borrow_mut();
		match parent.children.iter().position(|c| c.ptr_eq(child)) {
			Some(index) => {
				parent.children.remove(index);
			}
			None => warn!("Tried to remove an artifact that isn't a child of the given parent."),
		}
	}

	fn replace_child(&self, parent: &MemoryArtifact, new_child: &MemoryArtifact, old_child: &MemoryArtifact) {
		self.record(Mutation::ReplaceChild);
		let mut parent = parent.0.borrow_mut();
		match parent.children.iter().position(|c| c.ptr_eq(old_child)) {
			Some(index) => parent.children[index] = new_child.clone(),
			None => warn!("Tried to replace an artifact that isn't a child of the given parent."),
		}
	}
}
