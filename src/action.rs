//! Server actions: JSON requests addressed by component identity and action identifier.
//!
//! Actions never feed errors into the render pipeline. [`ActionClient::call`] reports any failure
//! to its callback as `{"error": "<message>"}`.

use crate::component::ComponentId;
use core::{future::Future, pin::Pin};
use serde::Serialize;
use serde_json::{json, Value};
use std::rc::Rc;
use thiserror::Error;
use tracing::{debug, instrument, warn};

pub const DEFAULT_PREFIX: &str = "/server_";

#[derive(Debug, Error)]
pub enum ActionError {
	/// The request could not be completed.
	#[error("{0}")]
	Network(String),

	#[error("Server returned {status}")]
	Status { status: u16, body: String },

	#[error("Failed to serialize payload: {0}")]
	Serialization(#[source] serde_json::Error),

	#[error("Failed to parse response: {0}")]
	Deserialization(#[source] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionResponse {
	pub status: u16,
	pub body: String,
}
impl ActionResponse {
	#[must_use]
	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}
}

pub type ActionFuture = Pin<Box<dyn Future<Output = Result<ActionResponse, ActionError>>>>;

/// Sends one JSON `POST` request.
pub trait Transport {
	fn post_json(&self, path: &str, body: String) -> ActionFuture;
}
impl<T: Transport + ?Sized> Transport for Rc<T> {
	fn post_json(&self, path: &str, body: String) -> ActionFuture {
		(**self).post_json(path, body)
	}
}

#[derive(Debug, Clone)]
pub struct ActionClient<T> {
	transport: T,
	prefix: String,
}
impl<T: Transport> ActionClient<T> {
	pub fn new(transport: T) -> Self {
		Self {
			transport,
			prefix: DEFAULT_PREFIX.to_owned(),
		}
	}

	/// Replaces the path prefix (default [`DEFAULT_PREFIX`]). A trailing `/` is ignored.
	#[must_use]
	pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
		let mut prefix = prefix.into();
		while prefix.ends_with('/') {
			prefix.pop();
		}
		self.prefix = prefix;
		self
	}

	pub fn transport(&self) -> &T {
		&self.transport
	}

	#[must_use]
	pub fn path(&self, component: &ComponentId, action: &str) -> String {
		format!("{}/{}/{}", self.prefix, component, action)
	}

	/// Sends `payload` to the action and parses the JSON response.
	///
	/// # Errors
	///
	/// Fails on serialization or transport errors, a non-2xx status, or a response body that isn't JSON.
	#[instrument(skip(self, payload))]
	pub async fn request<S: Serialize + ?Sized>(&self, component: &ComponentId, action: &str, payload: &S) -> Result<Value, ActionError> {
		let body = serde_json::to_string(payload).map_err(ActionError::Serialization)?;
		let response = self.transport.post_json(&self.path(component, action), body).await?;
		if !response.is_success() {
			return Err(ActionError::Status {
				status: response.status,
				body: response.body,
			});
		}
		let result = serde_json::from_str(&response.body).map_err(ActionError::Deserialization)?;
		debug!("Server response for {:?}: {}", action, result);
		Ok(result)
	}

	/// Like [`ActionClient::request`], but delivers the result (or `{"error": "<message>"}`) to `callback` instead of failing.
	pub async fn call<S: Serialize + ?Sized>(&self, component: &ComponentId, action: &str, payload: &S, callback: impl FnOnce(Value)) {
		let result = match self.request(component, action, payload).await {
			Ok(result) => result,
			Err(error) => {
				warn!("Action {:?} of component {} failed: {}", action, component, error);
				json!({ "error": error.to_string() })
			}
		};
		callback(result)
	}
}
