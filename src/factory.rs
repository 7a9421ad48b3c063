use crate::node::{Attributes, Node, NodeKind};
use core::fmt::Display;
use tracing::{instrument, warn};

/// Reserved tag: builds a [`NodeKind::Text`] node from the concatenated children.
pub const TEXT: &str = "#text";

/// Reserved tag: builds a [`NodeKind::RawMarkup`] node from the concatenated children.
pub const RAW_MARKUP: &str = "#html";

/// Anything that can appear in the child list of [`h`].
#[derive(Debug)]
pub enum Child<A> {
	Node(Node<A>),
	Many(Vec<Child<A>>),
	/// Becomes a text node.
	Value(String),
}
impl<A> Child<A> {
	/// Coerces any displayable value into a text child.
	pub fn display(value: impl Display) -> Self {
		Self::Value(value.to_string())
	}

	/// A child that contributes nothing.
	#[must_use]
	pub fn none() -> Self {
		Self::Many(Vec::new())
	}
}
impl<A> From<Node<A>> for Child<A> {
	fn from(node: Node<A>) -> Self {
		Self::Node(node)
	}
}
impl<A, T: Into<Child<A>>> From<Vec<T>> for Child<A> {
	fn from(children: Vec<T>) -> Self {
		Self::Many(children.into_iter().map(Into::into).collect())
	}
}
impl<A, T: Into<Child<A>>> From<Option<T>> for Child<A> {
	fn from(child: Option<T>) -> Self {
		child.map_or_else(Self::none, Into::into)
	}
}
impl<A> From<&str> for Child<A> {
	fn from(text: &str) -> Self {
		Self::Value(text.to_owned())
	}
}
impl<A> From<&String> for Child<A> {
	fn from(text: &String) -> Self {
		Self::Value(text.clone())
	}
}
impl<A> From<String> for Child<A> {
	fn from(text: String) -> Self {
		Self::Value(text)
	}
}

macro_rules! child_from_display {
	($($ty:ty),*$(,)?) => {$(
		impl<A> From<$ty> for Child<A> {
			fn from(value: $ty) -> Self {
				Self::display(value)
			}
		}
	)*};
}
child_from_display!(char, bool, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64);

/// Flattens nested child lists (to any depth) and turns plain values into text nodes.
pub fn normalize<A>(children: impl IntoIterator<Item = Child<A>>) -> Vec<Node<A>> {
	fn flatten_into<A>(child: Child<A>, nodes: &mut Vec<Node<A>>) {
		match child {
			Child::Node(node) => nodes.push(node),
			Child::Value(text) => nodes.push(Node::text(text)),
			Child::Many(children) => {
				for child in children {
					flatten_into(child, nodes)
				}
			}
		}
	}

	let mut nodes = Vec::new();
	for child in children {
		flatten_into(child, &mut nodes)
	}
	nodes
}

/// Builds a node from a tag (or one of the [`TEXT`]/[`RAW_MARKUP`] markers), attributes and children.
///
/// This is pure tree construction and never touches a host.
/// Markers ignore `attributes` and keep only the text of their children.
///
/// See also [`h!`](`crate::h!`) for the variadic form.
#[instrument(level = "trace", skip(attributes, children))]
pub fn h<A>(tag: &str, attributes: Attributes, children: impl IntoIterator<Item = Child<A>>) -> Node<A> {
	let children = normalize(children);
	match tag {
		TEXT => Node::text(concat_payloads(tag, children)),
		RAW_MARKUP => Node::raw_markup(concat_payloads(tag, children)),
		_ => Node::element(tag, attributes, children),
	}
}

fn concat_payloads<A>(marker: &str, children: Vec<Node<A>>) -> String {
	let mut payload = String::new();
	for child in children {
		match child.kind {
			NodeKind::Text(text) | NodeKind::RawMarkup(text) => payload.push_str(&text),
			NodeKind::Element(element) => warn!("Dropping <{}> inside {:?}: only text can be concatenated here.", element.tag, marker),
		}
	}
	payload
}

/// Variadic [`h`](`crate::factory::h`): `h!("p", Attributes::new(), "Count: ", count, items)`.
///
/// Every child goes through [`Child::from`](`crate::factory::Child`).
#[macro_export]
macro_rules! h {
	($tag:expr, $attributes:expr $(, $child:expr)* $(,)?) => {
		$crate::factory::h($tag, $attributes, ::std::vec![$($crate::factory::Child::from($child)),*])
	};
}
