use crate::node::{AttrValue, Handler};
use core::fmt::Debug;

/// The concrete UI backend that nodes are materialized into.
///
/// Implementations must not fail from the caller's point of view:
/// log problems and carry on, so that reconciliation stays total.
pub trait Host {
	/// A handle to one concrete rendered object. Clones refer to the same object.
	type Artifact: Clone + Debug;

	fn create_element(&self, tag: &str) -> Self::Artifact;
	fn create_text(&self, text: &str) -> Self::Artifact;
	/// A container whose content is set verbatim from `markup`.
	fn create_markup(&self, markup: &str) -> Self::Artifact;

	fn set_text(&self, artifact: &Self::Artifact, text: &str);
	fn set_markup(&self, artifact: &Self::Artifact, markup: &str);

	fn set_class(&self, artifact: &Self::Artifact, class: &str);
	fn set_property(&self, artifact: &Self::Artifact, name: &str, value: &AttrValue);

	/// Replaces the `event` handler on `artifact`. Each call is one reference to `handler`.
	fn bind_handler(&self, artifact: &Self::Artifact, event: &str, handler: &Handler);

	/// Drops one reference previously taken by [`Host::bind_handler`].
	///
	/// Called after any replacement was bound, or after the artifact was detached.
	fn release_handler(&self, handler: &Handler) {
		let _ = handler;
	}

	fn append_child(&self, parent: &Self::Artifact, child: &Self::Artifact);
	fn remove_child(&self, parent: &Self::Artifact, child: &Self::Artifact);
	fn replace_child(&self, parent: &Self::Artifact, new_child: &Self::Artifact, old_child: &Self::Artifact);
}
