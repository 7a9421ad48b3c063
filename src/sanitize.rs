//! Strips active content from untrusted markup before it is used as raw markup.
//!
//! Reconciliation itself never sanitizes: [`NodeKind::RawMarkup`](`crate::node::NodeKind::RawMarkup`) content is inserted verbatim.

use tracing::{instrument, trace, warn};
use wasm_bindgen::UnwrapThrowExt;
use web_sys::{Document, Element};

/// Elements that are removed along with their content.
pub const DISALLOWED_TAGS: [&str; 6] = ["script", "iframe", "object", "embed", "link", "style"];

/// Parses `input` into a detached container, removes [`DISALLOWED_TAGS`], event handler attributes and `javascript:` links,
/// and serializes the rest.
#[instrument(skip(document, input), fields(input_len = input.len()))]
pub fn sanitize_html(document: &Document, input: &str) -> String {
	let container = document.create_element("div").expect_throw("vdom-hooks: Failed to create sanitization container.");
	container.set_inner_html(input);

	for tag in DISALLOWED_TAGS {
		// Live collection: shrinks as elements are removed.
		let elements = container.get_elements_by_tag_name(tag);
		while let Some(element) = elements.item(0) {
			trace!(tag, "Removing disallowed element.");
			element.remove();
		}
	}

	remove_dangerous_attributes(&container);

	let markup = container.inner_html();
	if markup.is_empty() {
		container.text_content().unwrap_or_default()
	} else {
		markup
	}
}

fn remove_dangerous_attributes(element: &Element) {
	for name in element.get_attribute_names().iter().filter_map(|name| name.as_string()) {
		if name.to_ascii_lowercase().starts_with("on") {
			trace!(%name, "Removing event handler attribute.");
			if let Err(error) = element.remove_attribute(&name) {
				warn!("Failed to remove attribute {:?}: {:?}", name, error);
			}
		}
	}

	if let Some(href) = element.get_attribute("href") {
		if href.trim_start().to_ascii_lowercase().starts_with("javascript:") {
			trace!("Removing `javascript:` link.");
			if let Err(error) = element.remove_attribute("href") {
				warn!("Failed to remove href: {:?}", error);
			}
		}
	}

	let children = element.children();
	for i in 0..children.length() {
		if let Some(child) = children.item(i) {
			remove_dangerous_attributes(&child);
		}
	}
}
