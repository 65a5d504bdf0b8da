//! Error types for request dispatch.
//!
//! Two families exist and they never mix:
//!
//! - [`AjaxError`] is returned synchronously by the dispatch verbs. When a verb
//!   returns one, no request was issued.
//! - [`TransportError`] describes a failed exchange. It only ever reaches the
//!   caller through the `error` hook (or [`PendingRequest::wait`](crate::PendingRequest::wait)).

use thiserror::Error;

/// Synchronous failures raised before a request is handed to the transport.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AjaxError {
	/// A required argument was missing, empty or of the wrong shape.
	#[error("Invalid argument: {0}")]
	InvalidArgument(String),

	/// The body could not be read as JSON while looking for system messages.
	#[error("Malformed response: {0}")]
	MalformedResponse(String),

	/// The application root or another configuration value is unusable.
	#[error("Configuration error: {0}")]
	Config(String),

	/// An element the UI binding relies on was not found.
	#[error("Element not found: {0}")]
	MissingElement(String),

	/// An element exists but lacks the attribute the UI binding reads.
	#[error("Element {element} has no `{attribute}` attribute")]
	MissingAttribute {
		/// Element handle that was inspected.
		element: String,
		/// Attribute that was expected.
		attribute: String,
	},

	/// An identifier pattern did not match its source string.
	#[error("No identifier matching `{pattern}` in {input:?}")]
	MissingIdentifier {
		/// Pattern the identifier was expected to match.
		pattern: String,
		/// String that was searched.
		input: String,
	},

	/// A verb was called outside of a tokio runtime.
	#[error("No async runtime available to dispatch the request")]
	NoRuntime,
}

impl AjaxError {
	/// Create an invalid argument error
	pub fn invalid_argument(msg: impl Into<String>) -> Self {
		Self::InvalidArgument(msg.into())
	}

	/// Create a configuration error
	pub fn config(msg: impl Into<String>) -> Self {
		Self::Config(msg.into())
	}
}

/// Result alias for synchronous dispatch operations.
pub type AjaxResult<T> = Result<T, AjaxError>;

/// Failure of an issued request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
	/// Connection failed, timed out, or the request task went away.
	#[error("Network error: {0}")]
	Network(String),

	/// The server answered with a non-success status.
	#[error("Server error ({status}): {message}")]
	Status {
		/// HTTP status code
		status: u16,
		/// Reason phrase or short description
		message: String,
		/// Raw response body
		body: String,
	},

	/// JSON was expected but the body did not parse.
	#[error("Parse error: {0}")]
	Parse(String),
}

impl TransportError {
	/// Create a network error
	pub fn network(msg: impl Into<String>) -> Self {
		Self::Network(msg.into())
	}

	/// Create a status error
	pub fn status(status: u16, message: impl Into<String>, body: impl Into<String>) -> Self {
		Self::Status {
			status,
			message: message.into(),
			body: body.into(),
		}
	}

	/// Returns the HTTP status carried by this error, if any.
	pub fn status_code(&self) -> Option<u16> {
		match self {
			Self::Status { status, .. } => Some(*status),
			_ => None,
		}
	}
}
