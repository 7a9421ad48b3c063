//! Positional reconciliation of [`Node`] trees against their materialized artifacts.
//!
//! Children are matched strictly by index. Inserting or removing a child in the middle of a list
//! therefore updates every later sibling in place (or replaces it, if its tag differs),
//! rather than recognising moved nodes.

use crate::{
	host::Host,
	node::{is_event, AttrValue, Element, Node, NodeKind},
	render::{assign_attribute, render_with_depth_limit, Payload},
};
use core::{cmp::max, mem};
use tracing::{error, instrument, trace, trace_span, warn};

/// How many node levels [`patch`] and [`render`](`crate::render::render`) descend at most.
pub const DEFAULT_DEPTH_LIMIT: usize = 512;

/// Brings the artifacts under `container` in line with `new`, given that they currently reflect `old`.
///
/// Returns the node that is now current, which is `new` with artifacts attached (or [`None`] if `new` was [`None`]).
/// Reconciliation is total: there is no input combination it refuses.
///
/// Descends at most [`DEFAULT_DEPTH_LIMIT`] levels. See [`patch_with_depth_limit`].
pub fn patch<H: Host>(host: &H, container: &H::Artifact, old: Option<Node<H::Artifact>>, new: Option<Node<H::Artifact>>) -> Option<Node<H::Artifact>> {
	patch_with_depth_limit(host, container, old, new, DEFAULT_DEPTH_LIMIT)
}

/// Like [`patch`], but only processes `depth_limit` node levels (the given nodes being the first).
///
/// Below the limit, existing children are kept as they are and new children are not materialized.
/// Reaching the limit is logged as an error.
#[instrument(skip(host, old, new))]
pub fn patch_with_depth_limit<H: Host>(
	host: &H,
	container: &H::Artifact,
	old: Option<Node<H::Artifact>>,
	new: Option<Node<H::Artifact>>,
	depth_limit: usize,
) -> Option<Node<H::Artifact>> {
	match (old, new) {
		(None, None) => None,

		(None, Some(mut new)) => {
			let span = trace_span!("Inserting");
			let _enter = span.enter();
			let artifact = render_with_depth_limit(host, &mut new, depth_limit);
			host.append_child(container, &artifact);
			Some(new)
		}

		(Some(old), None) => {
			let span = trace_span!("Removing");
			let _enter = span.enter();
			match &old.artifact {
				Some(artifact) => host.remove_child(container, artifact),
				None => warn!("Removing a node that was never materialized. Nothing to detach."),
			}
			release_handlers(host, &old);
			None
		}

		// Mismatching nodes: Destroy and rebuild.
		(Some(old), Some(mut new)) if !old.same_kind(&new) => {
			let span = trace_span!("Replacing mismatching", old_tag = ?old.tag(), new_tag = ?new.tag());
			let _enter = span.enter();
			let artifact = render_with_depth_limit(host, &mut new, depth_limit);
			match &old.artifact {
				Some(old_artifact) => host.replace_child(container, &artifact, old_artifact),
				None => {
					warn!("Replacing a node that was never materialized. Appending instead.");
					host.append_child(container, &artifact);
				}
			}
			release_handlers(host, &old);
			Some(new)
		}

		(Some(mut old), Some(mut new)) => {
			let artifact = match old.artifact.take() {
				Some(artifact) => artifact,
				None => {
					warn!("Updating a node that was never materialized. Switching to insertion.");
					return patch_with_depth_limit(host, container, None, Some(new), depth_limit);
				}
			};

			match (old.kind, &mut new.kind) {
				(NodeKind::Text(t_1), NodeKind::Text(t_2)) => {
					let span = trace_span!("Diffing text", t_1 = %Payload(&t_1), t_2 = %Payload(t_2));
					let _enter = span.enter();
					if t_1 != *t_2 {
						host.set_text(&artifact, t_2)
					}
				}
				(NodeKind::RawMarkup(m_1), NodeKind::RawMarkup(m_2)) => {
					let span = trace_span!("Diffing raw markup", m_1 = %Payload(&m_1), m_2 = %Payload(m_2));
					let _enter = span.enter();
					if m_1 != *m_2 {
						host.set_markup(&artifact, m_2)
					}
				}
				(NodeKind::Element(e_1), NodeKind::Element(e_2)) => {
					let span = trace_span!("Diffing element", tag = %e_2.tag);
					let _enter = span.enter();
					update_element(host, &artifact, e_1, e_2, depth_limit);
				}
				_ => unreachable!("`same_kind` was checked above"),
			}

			new.artifact = Some(artifact);
			Some(new)
		}
	}
}

/// Updates attributes, then children, of an element whose artifact is reused.
#[allow(clippy::similar_names)]
fn update_element<H: Host>(host: &H, artifact: &H::Artifact, e_1: Element<H::Artifact>, e_2: &mut Element<H::Artifact>, depth_limit: usize) {
	let Element {
		tag: _,
		attributes: a_1,
		children: c_1,
	} = e_1;

	// Handlers that stay bound on the artifact without being in `e_2`. The new node takes over their reference.
	let mut still_bound = Vec::new();

	for (name, value) in e_2.attributes.iter() {
		if is_event(name) {
			// Rebinding handlers has side effects, so it only happens on change.
			let previous = a_1.get(name);
			if previous == Some(value) {
				continue;
			}
			match (value, previous) {
				(AttrValue::Handler(_), previous) => {
					trace!(name, "Rebinding handler.");
					assign_attribute(host, artifact, name, value);
					if let Some(AttrValue::Handler(previous)) = previous {
						host.release_handler(previous)
					}
				}
				(_, Some(AttrValue::Handler(previous))) => {
					warn!("Ignoring non-handler value {} for event attribute {:?}. The previous handler stays bound.", value, name);
					still_bound.push((name.to_owned(), AttrValue::Handler(previous.clone())));
				}
				(_, _) => assign_attribute(host, artifact, name, value),
			}
		} else {
			assign_attribute(host, artifact, name, value);
		}
	}

	// Attributes missing from `e_2` are not cleared from the artifact.
	for (name, value) in a_1.iter() {
		if is_event(name) && !e_2.attributes.contains(name) {
			if let AttrValue::Handler(_) = value {
				trace!(name, "Keeping handler that is still bound on the artifact.");
				still_bound.push((name.to_owned(), value.clone()));
			}
		}
	}
	for (name, value) in still_bound {
		e_2.attributes.insert(name, value);
	}

	if depth_limit <= 1 {
		if !c_1.is_empty() || !e_2.children.is_empty() {
			error!("Depth limit reached while diffing <{}>. Keeping its current children.", e_2.tag);
		}
		e_2.children = c_1;
		return;
	}

	let c_2 = mem::take(&mut e_2.children);
	let span = trace_span!("Diffing children", "c_1.len()" = c_1.len(), "c_2.len()" = c_2.len());
	let _enter = span.enter();
	let max_len = max(c_1.len(), c_2.len());
	let mut c_1 = c_1.into_iter();
	let mut c_2 = c_2.into_iter();
	e_2.children = (0..max_len)
		.filter_map(|_| patch_with_depth_limit(host, artifact, c_1.next(), c_2.next(), depth_limit - 1))
		.collect();
}

/// Drops the host's references to every handler in a subtree that is leaving the artifact tree.
#[instrument(skip(host, node))]
pub(crate) fn release_handlers<H: Host>(host: &H, node: &Node<H::Artifact>) -> usize {
	match &node.kind {
		NodeKind::Text(_) | NodeKind::RawMarkup(_) => 0,
		NodeKind::Element(element) => {
			let mut count = 0;
			for (_, handler) in element.attributes.handlers() {
				host.release_handler(handler);
				count += 1;
			}
			count + element.children.iter().map(|child| release_handlers(host, child)).sum::<usize>()
		}
	}
}
