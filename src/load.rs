//! Builds materialized [`Node`] trees from existing DOM, so components can adopt server-rendered markup.

use crate::node::{Attributes, Node, CLASS_NAME};
use tracing::{instrument, trace};
use wasm_bindgen::JsCast;
use web_sys::{Attr, Element, NamedNodeMap, NodeList, Text};

/// Loads every element and text child. Other nodes (comments, processing instructions…) are skipped.
#[instrument]
pub fn load_child_nodes(child_nodes: &NodeList) -> Vec<Node<web_sys::Node>> {
	(0..child_nodes.length()).filter_map(|i| child_nodes.item(i)).filter_map(|child| load_node(&child)).collect()
}

pub fn load_node(node: &web_sys::Node) -> Option<Node<web_sys::Node>> {
	if let Some(element) = node.dyn_ref::<Element>() {
		Some(load_element(element))
	} else if let Some(text) = node.dyn_ref::<Text>() {
		Some(Node::text(text.data()).with_artifact(node.clone()))
	} else {
		trace!("Skipping unrecognised child node: {:?}", node);
		None
	}
}

/// Tags are loaded by local name (lower case for HTML), matching how they are written in [`h`](`crate::factory::h`).
pub fn load_element(element: &Element) -> Node<web_sys::Node> {
	let node: &web_sys::Node = element.as_ref();
	Node::element(element.local_name(), load_attributes(&element.attributes()), load_child_nodes(&node.child_nodes())).with_artifact(node.clone())
}

/// Attribute values are loaded as text. `class` is loaded as [`CLASS_NAME`].
pub fn load_attributes(attributes: &NamedNodeMap) -> Attributes {
	(0..attributes.length()).filter_map(|i| attributes.item(i)).map(|attribute| load_attribute(&attribute)).collect()
}

pub fn load_attribute(attribute: &Attr) -> (String, String) {
	let name = attribute.local_name();
	let name = if name == "class" { CLASS_NAME.to_owned() } else { name };
	(name, attribute.value())
}
