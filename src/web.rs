//! The browser [`Host`]: artifacts are [`web_sys::Node`]s.

use crate::{
	action::{ActionClient, ActionError, ActionFuture, ActionResponse, Transport},
	component::{Component, ComponentId, Hooks},
	host::Host,
	node::{AttrValue, Handler, Node},
	rc_hash_map::RcHashMap,
	schedule::{Scheduler, Task},
};
use core::{cell::RefCell, fmt};
use js_sys::{Function, Reflect};
use serde::Serialize;
use serde_json::Value;
use std::rc::{Rc, Weak};
use tracing::{error, info, instrument, trace, trace_span, warn};
use wasm_bindgen::{closure::Closure, JsCast, JsValue, UnwrapThrowExt};
use wasm_bindgen_futures::{spawn_local, JsFuture};

type HandlerHandles = RcHashMap<usize, u16, (Handler, Function)>;

/// Materializes nodes into a [`web_sys::Document`].
///
/// # Event handlers
///
/// All bindings go through a single shared [`Closure`], bound once per distinct [`Handler`] to its registry key.
/// Handlers are reference-counted per [`WebHost`] (and its clones) and freed when their count drops to zero.
/// A handler that is running keeps itself alive until it returns, even if the re-render it triggers releases it.
///
/// Dropping the last clone of a [`WebHost`] makes listeners that are still attached to the DOM inert.
#[derive(Clone)]
pub struct WebHost {
	document: web_sys::Document,
	listeners: Rc<Listeners>,
}

struct Listeners {
	handles: Rc<RefCell<HandlerHandles>>,
	common_handler: Closure<dyn Fn(JsValue, web_sys::Event)>,
}

impl WebHost {
	#[must_use]
	#[instrument]
	pub fn new(document: web_sys::Document) -> Self {
		let handles = Rc::new(RefCell::new(HandlerHandles::new()));
		let registry: Weak<RefCell<HandlerHandles>> = Rc::downgrade(&handles);
		let common_handler = Closure::wrap(Box::new(move |key: JsValue, event: web_sys::Event| {
			let span = trace_span!("common_handler", key = ?&key, event_type = %event.type_());
			let _enter = span.enter();

			let handler = registry.upgrade().and_then(|handles| {
				#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
				let key = key.as_f64()? as usize;
				let handles = handles.borrow();
				handles.get(&key).map(|(handler, _)| handler.clone())
			});
			match handler {
				// The registry isn't borrowed here, so the handler may re-render freely.
				Some(handler) => handler.call(&event),
				None => warn!("Event fired for a released handler. Ignoring it."),
			}
		}) as Box<dyn Fn(JsValue, web_sys::Event)>);

		Self {
			document,
			listeners: Rc::new(Listeners { handles, common_handler }),
		}
	}

	/// Uses the current window's document.
	#[must_use]
	pub fn for_window() -> Self {
		let document = web_sys::window()
			.expect_throw("vdom-hooks: No global `window` found.")
			.document()
			.expect_throw("vdom-hooks: No document found for the current window.");
		Self::new(document)
	}

	#[must_use]
	pub fn document(&self) -> &web_sys::Document {
		&self.document
	}

	/// Number of distinct handlers that currently have a listener function.
	#[must_use]
	pub fn handler_count(&self) -> usize {
		self.listeners.handles.borrow().len()
	}

	fn get_or_create_listener(&self, handler: &Handler) -> Function {
		let mut handles = self.listeners.handles.borrow_mut();
		let common_handler: &Function = self.listeners.common_handler.as_ref().unchecked_ref();
		let (_, function) = handles
			.increment_or_insert_with(handler.key(), |&key| {
				#[allow(clippy::cast_precision_loss)]
				let function: Function = common_handler.bind1(&JsValue::UNDEFINED, &JsValue::from_f64(key as f64)).unchecked_into();
				(handler.clone(), function)
			})
			.expect_throw("Too many (more than 65k) active references to the same `Handler`");
		function.clone()
	}
}

impl fmt::Debug for WebHost {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("WebHost").field("handler_count", &self.handler_count()).finish_non_exhaustive()
	}
}

impl Host for WebHost {
	type Artifact = web_sys::Node;

	fn create_element(&self, tag: &str) -> web_sys::Node {
		match self.document.create_element(tag) {
			Ok(element) => element.into(),
			Err(error) => {
				error!("Failed to create element <{}>: {:?}. Inserting a placeholder comment instead.", tag, error);
				self.document.create_comment(tag).into()
			}
		}
	}

	fn create_text(&self, text: &str) -> web_sys::Node {
		self.document.create_text_node(text).into()
	}

	fn create_markup(&self, markup: &str) -> web_sys::Node {
		let container = self.create_element("div");
		self.set_markup(&container, markup);
		container
	}

	fn set_text(&self, artifact: &web_sys::Node, text: &str) {
		artifact.set_text_content(Some(text))
	}

	fn set_markup(&self, artifact: &web_sys::Node, markup: &str) {
		match artifact.dyn_ref::<web_sys::Element>() {
			Some(element) => element.set_inner_html(markup),
			None => error!("Expected to set markup on `web_sys::Element` but found {:?}.", artifact),
		}
	}

	fn set_class(&self, artifact: &web_sys::Node, class: &str) {
		match artifact.dyn_ref::<web_sys::Element>() {
			Some(element) => {
				if let Err(error) = element.set_attribute("class", class) {
					error!("Failed to set class {:?}: {:?}", class, error)
				}
			}
			None => error!("Expected to set class on `web_sys::Element` but found {:?}.", artifact),
		}
	}

	fn set_property(&self, artifact: &web_sys::Node, name: &str, value: &AttrValue) {
		let value = match value {
			AttrValue::Text(text) => JsValue::from_str(text),
			AttrValue::Bool(value) => JsValue::from_bool(*value),
			AttrValue::Handler(_) => return warn!("Ignoring handler assigned to non-event property {:?}.", name),
		};
		if let Err(error) = Reflect::set(artifact, &JsValue::from_str(name), &value) {
			error!("Failed to set property {:?}: {:?}", name, error)
		}
	}

	#[instrument(skip(handler))]
	fn bind_handler(&self, artifact: &web_sys::Node, event: &str, handler: &Handler) {
		let listener = self.get_or_create_listener(handler);
		if let Err(error) = Reflect::set(artifact, &JsValue::from_str(&format!("on{}", event)), &listener) {
			error!("Failed to bind handler for {:?}: {:?}", event, error)
		}
	}

	fn release_handler(&self, handler: &Handler) {
		let mut handles = self.listeners.handles.borrow_mut();
		match handles.weak_decrement(&handler.key()) {
			Ok(Some(_)) => (),
			Ok(None) => error!("Tried to release a handler that was never bound."),
			Err(_) => error!("Tried to release a handler more often than it was bound."),
		}
		let freed = handles.drain_weak().count();
		if freed != 0 {
			trace!("Freed {} listener function(s).", freed);
		}
	}

	fn append_child(&self, parent: &web_sys::Node, child: &web_sys::Node) {
		if let Err(error) = parent.append_child(child) {
			error!("Failed to append node: {:?}", error)
		}
	}

	fn remove_child(&self, parent: &web_sys::Node, child: &web_sys::Node) {
		if let Err(error) = parent.remove_child(child) {
			error!("Failed to remove node: {:?}", error)
		}
	}

	fn replace_child(&self, parent: &web_sys::Node, new_child: &web_sys::Node, old_child: &web_sys::Node) {
		if let Err(error) = parent.replace_child(new_child, old_child) {
			error!("Failed to replace node: {:?}", error)
		}
	}
}

/// Defers tasks with `requestAnimationFrame`.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnimationFrame;
impl Scheduler for AnimationFrame {
	fn schedule(&self, task: Task) {
		let callback = Closure::once_into_js(move || task());
		let window = match web_sys::window() {
			Some(window) => window,
			None => return error!("No global `window` to request an animation frame from. Dropping task."),
		};
		if let Err(error) = window.request_animation_frame(callback.unchecked_ref()) {
			error!("Failed to request animation frame: {:?}", error)
		}
	}
}

/// Mounts a component into `element` of the current document, with effects deferred to animation frames.
pub fn mount<P: 'static>(element: &web_sys::Element, properties: P, render: impl FnMut(&P, &mut Hooks<'_>) -> Node<web_sys::Node> + 'static) -> Component<P, WebHost> {
	let host = WebHost::for_window();
	info!("Mounting into <{}>.", element.tag_name());
	Component::mount(host, element.clone().into(), Rc::new(AnimationFrame), properties, render)
}

/// Sends server actions with `window.fetch`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FetchTransport;
impl Transport for FetchTransport {
	fn post_json(&self, path: &str, body: String) -> ActionFuture {
		let path = path.to_owned();
		Box::pin(async move { fetch_json(&path, &body).await.map_err(|error| ActionError::Network(js_error_message(&error))) })
	}
}

async fn fetch_json(path: &str, body: &str) -> Result<ActionResponse, JsValue> {
	let window = web_sys::window().ok_or_else(|| JsValue::from_str("No global `window` to fetch from."))?;

	let headers = web_sys::Headers::new()?;
	headers.set("Content-Type", "application/json")?;
	let init = web_sys::RequestInit::new();
	init.set_method("POST");
	init.set_headers(&headers);
	init.set_body(&JsValue::from_str(body));
	let request = web_sys::Request::new_with_str_and_init(path, &init)?;

	let response: web_sys::Response = JsFuture::from(window.fetch_with_request(&request)).await?.dyn_into()?;
	let body = JsFuture::from(response.text()?).await?.as_string().unwrap_or_default();
	Ok(ActionResponse { status: response.status(), body })
}

fn js_error_message(error: &JsValue) -> String {
	error
		.dyn_ref::<js_sys::Error>()
		.map(|error| String::from(error.message()))
		.or_else(|| error.as_string())
		.unwrap_or_else(|| format!("{:?}", error))
}

/// Runs [`ActionClient::call`] in the background. The render pipeline never waits for it.
pub fn spawn_action<T, S>(client: Rc<ActionClient<T>>, component: ComponentId, action: impl Into<String>, payload: S, callback: impl FnOnce(Value) + 'static)
where
	T: Transport + 'static,
	S: Serialize + 'static,
{
	let action = action.into();
	spawn_local(async move { client.call(&component, &action, &payload, callback).await })
}
