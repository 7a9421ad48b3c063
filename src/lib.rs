#![doc(html_root_url = "https://docs.rs/vdom-hooks/0.1.0")]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

#[cfg(doctest)]
pub mod readme {
	doc_comment::doctest!("../README.md");
}

pub mod action;
pub mod component;
pub mod diff;
pub mod factory;
pub mod host;
pub mod load;
pub mod memory;
pub mod node;
mod rc_hash_map;
pub mod render;
pub mod sanitize;
pub mod schedule;
mod slots;
pub mod web;

pub use component::{Component, ComponentBuilder, ComponentId, Hooks, Setter};
pub use diff::{patch, patch_with_depth_limit};
pub use factory::{h, Child, RAW_MARKUP, TEXT};
pub use host::Host;
pub use node::{AttrValue, Attributes, Handler, Node, NodeKind};
pub use render::render;
pub use schedule::{Scheduler, TaskQueue};
