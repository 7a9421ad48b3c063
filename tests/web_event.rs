#![cfg(target_arch = "wasm32")]

use std::{cell::Cell, rc::Rc, sync::Once};
use vdom_hooks::{h, patch, web::WebHost, Attributes, Component, Handler, TaskQueue};
use wasm_bindgen::JsCast;
use wasm_bindgen_test::{wasm_bindgen_test, wasm_bindgen_test_configure};
use web_sys::{window, HtmlBodyElement, HtmlButtonElement};

wasm_bindgen_test_configure!(run_in_browser);

static LOG_INIT: Once = Once::new();

fn container() -> web_sys::Element {
	LOG_INIT.call_once(tracing_wasm::set_as_global_default);

	let document = window().unwrap().document().unwrap();
	let body = document.body().unwrap().dyn_into::<HtmlBodyElement>().unwrap();
	let container = document.create_element("div").unwrap();
	body.append_child(&container).unwrap();
	container
}

#[wasm_bindgen_test]
fn click() {
	let host = WebHost::for_window();
	let container = container();
	let parent: &web_sys::Node = container.as_ref();

	let click_count = Rc::new(Cell::new(0));
	let handler = Handler::new({
		let click_count = click_count.clone();
		move |event| {
			event.downcast_ref::<web_sys::Event>().expect("Expected `web_sys::Event` but received something else.");
			click_count.set(click_count.get() + 1);
		}
	});

	let tree = patch(&host, parent, None, Some(h!("button", Attributes::new().with("onClick", handler)))).unwrap();
	assert_eq!(click_count.get(), 0);
	assert_eq!(host.handler_count(), 1);

	let button: HtmlButtonElement = tree.artifact().unwrap().clone().dyn_into().unwrap();
	button.click();
	assert_eq!(click_count.get(), 1);

	assert!(patch(&host, parent, Some(tree), None).is_none());
	assert_eq!(host.handler_count(), 0);

	// Detached and released: the listener is inert now.
	button.click();
	assert_eq!(click_count.get(), 1);
	container.remove();
}

#[wasm_bindgen_test]
fn clicks_drive_component_state() {
	let host = WebHost::for_window();
	let container = container();
	let ticks = Rc::new(TaskQueue::new());

	let component = Component::mount(host.clone(), container.clone().into(), ticks.clone(), (), |_, hooks| {
		let (count, set_count) = hooks.use_state(0);
		h!("button", Attributes::new().with("onClick", Handler::new(move |_| set_count.set(count + 1))), count)
	});

	let button: HtmlButtonElement = container.first_element_child().unwrap().dyn_into().unwrap();
	button.click();
	button.click();
	ticks.run_pending();

	assert_eq!(container.inner_html(), "<button>2</button>");
	assert_eq!(host.handler_count(), 1);

	component.unmount();
	assert_eq!(container.inner_html(), "");
	assert_eq!(host.handler_count(), 0);
	container.remove();
}
