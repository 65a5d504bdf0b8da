//! `system_messages` envelope handling.
//!
//! Action endpoints (and, optionally, any endpoint) may answer with
//!
//! ```json
//! { "system_messages": { "error": ["..."], "success": ["..."] } }
//! ```
//!
//! Each list may also be a single string or be missing. The envelope is
//! forwarded to a [`Notifier`] before the caller's own success hook runs.

use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::{debug, error, info};

use crate::callback::{Callback, SuccessHandler};
use crate::error::{AjaxError, AjaxResult};
use crate::transport::Response;

/// Member carrying the envelope.
pub const ENVELOPE_KEY: &str = "system_messages";

/// Messages the server asks the page to surface.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SystemMessages {
	/// Error messages.
	#[serde(default, deserialize_with = "one_or_many")]
	pub error: Vec<String>,
	/// Success messages.
	#[serde(default, deserialize_with = "one_or_many")]
	pub success: Vec<String>,
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
	D: Deserializer<'de>,
{
	#[derive(Deserialize)]
	#[serde(untagged)]
	enum OneOrMany {
		One(String),
		Many(Vec<String>),
	}

	Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
		None => Vec::new(),
		Some(OneOrMany::One(message)) => vec![message],
		Some(OneOrMany::Many(messages)) => messages,
	})
}

impl SystemMessages {
	/// Reads the envelope from a parsed response document.
	///
	/// Returns `None` when the document has no (usable) envelope.
	pub fn from_json(document: &Value) -> Option<Self> {
		let envelope = document.get(ENVELOPE_KEY)?;
		Self::deserialize(envelope).ok()
	}

	/// Parses raw response text and reads its envelope.
	pub fn from_raw(raw: &str) -> AjaxResult<Option<Self>> {
		let document: Value = serde_json::from_str(raw)
			.map_err(|e| AjaxError::MalformedResponse(e.to_string()))?;
		Ok(Self::from_json(&document))
	}

	/// Whether both lists are empty.
	pub fn is_empty(&self) -> bool {
		self.error.is_empty() && self.success.is_empty()
	}

	/// Hands the messages to `notifier`, errors first. Empty lists are skipped.
	pub fn forward(&self, notifier: &dyn Notifier) {
		if !self.error.is_empty() {
			notifier.register_error(&self.error);
		}
		if !self.success.is_empty() {
			notifier.system_message(&self.success);
		}
	}
}

/// Page-wide message display.
pub trait Notifier: Send + Sync {
	/// Shows error messages.
	fn register_error(&self, messages: &[String]);

	/// Shows success messages.
	fn system_message(&self, messages: &[String]);
}

/// Notifier that only logs, used when the host installs none.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
	fn register_error(&self, messages: &[String]) {
		for message in messages {
			error!(message = %message, "system error message");
		}
	}

	fn system_message(&self, messages: &[String]) {
		for message in messages {
			info!(message = %message, "system message");
		}
	}
}

/// Wraps `hook` so the response's envelope reaches `notifier` first.
///
/// The wrapped hook receives the response exactly as it was passed in.
/// Without a hook the returned handler only forwards messages.
pub fn with_system_messages(
	notifier: Arc<dyn Notifier>,
	hook: Option<SuccessHandler>,
) -> SuccessHandler {
	Callback::new(move |response: Response| {
		let messages = match response.body.as_json() {
			Some(document) => SystemMessages::from_json(document),
			None => inspect_text(&response.raw),
		};
		if let Some(messages) = messages {
			messages.forward(notifier.as_ref());
		}
		if let Some(hook) = &hook {
			hook.call(response);
		}
	})
}

/// Looks for an envelope in a raw body and forwards it.
///
/// Bodies that are not JSON (fragments, plain text) are ignored.
pub fn inspect_raw(notifier: &dyn Notifier, raw: &str) {
	if let Some(messages) = inspect_text(raw) {
		messages.forward(notifier);
	}
}

fn inspect_text(raw: &str) -> Option<SystemMessages> {
	match SystemMessages::from_raw(raw) {
		Ok(messages) => messages,
		Err(e) => {
			debug!(error = %e, "not a JSON response, skipping system messages");
			None
		}
	}
}
