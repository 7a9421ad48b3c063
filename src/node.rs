//! The tree representation that components render into and [`patch`](`crate::diff::patch`) reconciles.

use core::{any::Any, fmt};
use hashbrown::HashMap;
use std::rc::Rc;

/// Attribute names starting with this prefix are bound as event handlers.
pub const EVENT_PREFIX: &str = "on";

/// Maps onto the artifact's structural `class` attribute.
pub const CLASS_NAME: &str = "className";

/// Returns whether `name` addresses an event handler slot.
#[must_use]
pub fn is_event(name: &str) -> bool {
	name.starts_with(EVENT_PREFIX)
}

/// The event name a handler attribute binds, i.e. `"onClick"` → `"click"`.
#[must_use]
pub fn event_name(name: &str) -> String {
	name.strip_prefix(EVENT_PREFIX).unwrap_or(name).to_ascii_lowercase()
}

/// A shared event handler.
///
/// The host passes its native event (for example a [`web_sys::Event`] or a [`MemoryEvent`](`crate::memory::MemoryEvent`)) as `&dyn Any`.
///
/// Two handlers are equal only if they are clones of the same instance.
#[derive(Clone)]
pub struct Handler(Rc<dyn Fn(&dyn Any)>);
impl Handler {
	pub fn new(handler: impl Fn(&dyn Any) + 'static) -> Self {
		Self(Rc::new(handler))
	}

	pub fn call(&self, event: &dyn Any) {
		(self.0)(event)
	}

	#[must_use]
	pub fn ptr_eq(&self, other: &Self) -> bool {
		Rc::ptr_eq(&self.0, &other.0)
	}

	/// Identifies this handler (and its clones) for as long as any of them is alive.
	pub(crate) fn key(&self) -> usize {
		Rc::as_ptr(&self.0).cast::<()>() as usize
	}
}
impl fmt::Debug for Handler {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_tuple("Handler").field(&Rc::as_ptr(&self.0).cast::<()>()).finish()
	}
}
impl PartialEq for Handler {
	fn eq(&self, other: &Self) -> bool {
		self.ptr_eq(other)
	}
}

#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
	Text(String),
	Bool(bool),
	Handler(Handler),
}
impl AttrValue {
	#[must_use]
	pub fn as_handler(&self) -> Option<&Handler> {
		match self {
			Self::Handler(handler) => Some(handler),
			Self::Text(_) | Self::Bool(_) => None,
		}
	}
}
impl fmt::Display for AttrValue {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Text(text) => f.write_str(text),
			Self::Bool(value) => write!(f, "{}", value),
			Self::Handler(_) => f.write_str("[handler]"),
		}
	}
}
impl From<&str> for AttrValue {
	fn from(text: &str) -> Self {
		Self::Text(text.to_owned())
	}
}
impl From<String> for AttrValue {
	fn from(text: String) -> Self {
		Self::Text(text)
	}
}
impl From<bool> for AttrValue {
	fn from(value: bool) -> Self {
		Self::Bool(value)
	}
}
impl From<Handler> for AttrValue {
	fn from(handler: Handler) -> Self {
		Self::Handler(handler)
	}
}

/// An element's attributes and event handlers, by name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Attributes(HashMap<String, AttrValue>);
impl Attributes {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	#[must_use]
	pub fn with(mut self, name: impl Into<String>, value: impl Into<AttrValue>) -> Self {
		self.insert(name, value);
		self
	}

	pub fn insert(&mut self, name: impl Into<String>, value: impl Into<AttrValue>) -> Option<AttrValue> {
		self.0.insert(name.into(), value.into())
	}

	#[must_use]
	pub fn get(&self, name: &str) -> Option<&AttrValue> {
		self.0.get(name)
	}

	#[must_use]
	pub fn contains(&self, name: &str) -> bool {
		self.0.contains_key(name)
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, &AttrValue)> {
		self.0.iter().map(|(name, value)| (name.as_str(), value))
	}

	/// Iterates over the handlers bound through event attributes.
	pub fn handlers(&self) -> impl Iterator<Item = (&str, &Handler)> {
		self.iter().filter(|(name, _)| is_event(name)).filter_map(|(name, value)| value.as_handler().map(|handler| (name, handler)))
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.0.len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}
impl<N: Into<String>, V: Into<AttrValue>> FromIterator<(N, V)> for Attributes {
	fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
		Self(iter.into_iter().map(|(name, value)| (name.into(), value.into())).collect())
	}
}

#[derive(Debug)]
pub struct Element<A> {
	pub tag: String,
	pub attributes: Attributes,
	pub children: Vec<Node<A>>,
}

#[derive(Debug)]
pub enum NodeKind<A> {
	Element(Element<A>),
	Text(String),
	/// Markup that is materialized verbatim. It must already be sanitized.
	RawMarkup(String),
}

/// One piece of interface structure, plus the artifact it was materialized into (if any).
///
/// A node's kind (and an element's tag) never changes after construction.
/// Artifacts are exclusively owned: no two nodes ever refer to the same one.
#[derive(Debug)]
pub struct Node<A> {
	pub(crate) kind: NodeKind<A>,
	pub(crate) artifact: Option<A>,
}
impl<A> Node<A> {
	#[must_use]
	pub fn element(tag: impl Into<String>, attributes: Attributes, children: Vec<Node<A>>) -> Self {
		Self {
			kind: NodeKind::Element(Element {
				tag: tag.into(),
				attributes,
				children,
			}),
			artifact: None,
		}
	}

	#[must_use]
	pub fn text(text: impl Into<String>) -> Self {
		Self {
			kind: NodeKind::Text(text.into()),
			artifact: None,
		}
	}

	#[must_use]
	pub fn raw_markup(markup: impl Into<String>) -> Self {
		Self {
			kind: NodeKind::RawMarkup(markup.into()),
			artifact: None,
		}
	}

	pub(crate) fn with_artifact(mut self, artifact: A) -> Self {
		self.artifact = Some(artifact);
		self
	}

	#[must_use]
	pub fn kind(&self) -> &NodeKind<A> {
		&self.kind
	}

	#[must_use]
	pub fn tag(&self) -> Option<&str> {
		match &self.kind {
			NodeKind::Element(element) => Some(&element.tag),
			NodeKind::Text(_) | NodeKind::RawMarkup(_) => None,
		}
	}

	/// The payload of a text or raw markup node.
	#[must_use]
	pub fn payload(&self) -> Option<&str> {
		match &self.kind {
			NodeKind::Text(payload) | NodeKind::RawMarkup(payload) => Some(payload),
			NodeKind::Element(_) => None,
		}
	}

	#[must_use]
	pub fn attributes(&self) -> Option<&Attributes> {
		match &self.kind {
			NodeKind::Element(element) => Some(&element.attributes),
			NodeKind::Text(_) | NodeKind::RawMarkup(_) => None,
		}
	}

	/// An element's children. Empty for text and raw markup.
	#[must_use]
	pub fn children(&self) -> &[Node<A>] {
		match &self.kind {
			NodeKind::Element(element) => &element.children,
			NodeKind::Text(_) | NodeKind::RawMarkup(_) => &[],
		}
	}

	#[must_use]
	pub fn artifact(&self) -> Option<&A> {
		self.artifact.as_ref()
	}

	#[must_use]
	pub fn is_materialized(&self) -> bool {
		self.artifact.is_some()
	}

	/// Whether `other` can take over this node's artifact.
	#[must_use]
	pub fn same_kind(&self, other: &Self) -> bool {
		match (&self.kind, &other.kind) {
			(NodeKind::Element(a), NodeKind::Element(b)) => a.tag == b.tag,
			(NodeKind::Text(_), NodeKind::Text(_)) | (NodeKind::RawMarkup(_), NodeKind::RawMarkup(_)) => true,
			_ => false,
		}
	}

	/// A structural copy of this subtree without any artifacts.
	#[must_use]
	pub fn to_unmounted(&self) -> Self {
		match &self.kind {
			NodeKind::Element(element) => Self::element(
				element.tag.clone(),
				element.attributes.clone(),
				element.children.iter().map(Self::to_unmounted).collect(),
			),
			NodeKind::Text(text) => Self::text(text.clone()),
			NodeKind::RawMarkup(markup) => Self::raw_markup(markup.clone()),
		}
	}
}
