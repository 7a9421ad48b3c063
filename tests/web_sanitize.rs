#![cfg(target_arch = "wasm32")]

use vdom_hooks::sanitize::sanitize_html;
use wasm_bindgen_test::{wasm_bindgen_test, wasm_bindgen_test_configure};
use web_sys::window;

wasm_bindgen_test_configure!(run_in_browser);

fn sanitize(input: &str) -> String {
	sanitize_html(&window().unwrap().document().unwrap(), input)
}

#[wasm_bindgen_test]
fn plain_markup_is_kept() {
	assert_eq!(sanitize("<p>Hello <b>there</b></p>"), "<p>Hello <b>there</b></p>");
}

#[wasm_bindgen_test]
fn disallowed_elements_are_removed_with_content() {
	assert_eq!(sanitize("<p>a</p><script>alert(1)</script><iframe src=\"x\"></iframe><style>p{}</style>"), "<p>a</p>");
	assert_eq!(sanitize("<div><object><embed></object><span>b</span></div>"), "<div><span>b</span></div>");
}

#[wasm_bindgen_test]
fn event_handler_attributes_are_stripped() {
	assert_eq!(sanitize(r#"<img src="x.png" onerror="alert(1)"><a ONCLICK="x()">y</a>"#), r#"<img src="x.png"><a>y</a>"#);
}

#[wasm_bindgen_test]
fn javascript_links_are_stripped() {
	assert_eq!(sanitize(r#"<a href=" JavaScript:alert(1)">x</a><a href="/ok">y</a>"#), r#"<a>x</a><a href="/ok">y</a>"#);
}

#[wasm_bindgen_test]
fn plain_text_passes_through() {
	assert_eq!(sanitize("just text"), "just text");
	assert_eq!(sanitize(""), "");
}
