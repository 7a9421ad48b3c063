use crate::{
	diff::DEFAULT_DEPTH_LIMIT,
	host::Host,
	node::{event_name, is_event, AttrValue, Node, NodeKind, CLASS_NAME},
};
use core::fmt;
use tracing::{error, instrument, trace_span, warn};

/// Materializes `node` (and its subtree) for the first time, recording each artifact on its node.
///
/// Returns the subtree's root artifact, which is not yet attached to any parent.
pub fn render<H: Host>(host: &H, node: &mut Node<H::Artifact>) -> H::Artifact {
	render_with_depth_limit(host, node, DEFAULT_DEPTH_LIMIT)
}

/// Like [`render`], but children below `depth_limit` levels are dropped from `node` instead of being materialized.
#[instrument(skip(host, node))]
pub fn render_with_depth_limit<H: Host>(host: &H, node: &mut Node<H::Artifact>, depth_limit: usize) -> H::Artifact {
	debug_assert!(node.artifact.is_none(), "Rendering a node that was already materialized");

	let artifact = match &mut node.kind {
		NodeKind::Text(text) => {
			let span = trace_span!("Creating text", text = %Payload(text));
			let _enter = span.enter();
			host.create_text(text)
		}
		NodeKind::RawMarkup(markup) => {
			let span = trace_span!("Creating raw markup container", markup = %Payload(markup));
			let _enter = span.enter();
			host.create_markup(markup)
		}
		NodeKind::Element(element) => {
			let span = trace_span!("Creating element", tag = %element.tag, "children.len()" = element.children.len());
			let _enter = span.enter();
			let artifact = host.create_element(&element.tag);
			for (name, value) in element.attributes.iter() {
				assign_attribute(host, &artifact, name, value);
			}
			if depth_limit <= 1 && !element.children.is_empty() {
				error!("Depth limit reached while creating <{}>. Dropping {} child node(s).", element.tag, element.children.len());
				element.children.clear();
			}
			for child in &mut element.children {
				let child_artifact = render_with_depth_limit(host, child, depth_limit - 1);
				host.append_child(&artifact, &child_artifact);
			}
			artifact
		}
	};

	node.artifact = Some(artifact.clone());
	artifact
}

/// Applies one attribute: handlers for event names, `class` for [`CLASS_NAME`], a direct property otherwise.
pub(crate) fn assign_attribute<H: Host>(host: &H, artifact: &H::Artifact, name: &str, value: &AttrValue) {
	if is_event(name) {
		match value {
			AttrValue::Handler(handler) => host.bind_handler(artifact, &event_name(name), handler),
			other => warn!("Ignoring non-handler value {} for event attribute {:?}.", other, name),
		}
	} else if name == CLASS_NAME {
		host.set_class(artifact, &value.to_string());
	} else {
		host.set_property(artifact, name, value);
	}
}

/// Log field for text content, which is only spelled out with the `dangerous-logging` feature.
pub(crate) struct Payload<'a>(pub &'a str);
impl fmt::Display for Payload<'_> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		if cfg!(feature = "dangerous-logging") {
			write!(f, "{:?}", self.0)
		} else {
			write!(f, "<{} bytes>", self.0.len())
		}
	}
}
