//! Transport seam.
//!
//! The dispatcher never talks to the network itself. It hands a fully
//! resolved [`TransportRequest`] to a [`Transport`] implementation and turns
//! the returned [`TransportResponse`] into a [`Response`] for the hooks.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::error::{AjaxError, TransportError};

/// HTTP verb used for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Method {
	/// `GET`, data travels in the query string.
	#[default]
	Get,
	/// `POST`, data travels in the body.
	Post,
}

impl Method {
	/// Lowercase verb name.
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Get => "get",
			Self::Post => "post",
		}
	}
}

impl fmt::Display for Method {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for Method {
	type Err = AjaxError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_ascii_lowercase().as_str() {
			"get" => Ok(Self::Get),
			"post" => Ok(Self::Post),
			other => Err(AjaxError::invalid_argument(format!(
				"unsupported request method {other:?}"
			))),
		}
	}
}

/// How the response body should be interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
	/// Parse the body as JSON; a parse failure is a transport error.
	Json,
	/// Markup, passed through verbatim.
	Html,
	/// Plain text, passed through verbatim.
	Text,
}

impl DataType {
	/// Name used on the wire and in API endpoint paths.
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Json => "json",
			Self::Html => "html",
			Self::Text => "text",
		}
	}

	/// `Accept` header value for this data type.
	pub fn accept(&self) -> &'static str {
		match self {
			Self::Json => "application/json, text/javascript, */*; q=0.01",
			Self::Html => "text/html, */*; q=0.01",
			Self::Text => "text/plain, */*; q=0.01",
		}
	}
}

impl fmt::Display for DataType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for DataType {
	type Err = AjaxError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_ascii_lowercase().as_str() {
			"json" => Ok(Self::Json),
			"html" => Ok(Self::Html),
			"text" => Ok(Self::Text),
			other => Err(AjaxError::invalid_argument(format!(
				"unsupported dataType {other:?}"
			))),
		}
	}
}

/// A request ready for the network: absolute URL, fixed verb, payload map.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportRequest {
	/// Absolute request URL.
	pub url: String,
	/// HTTP verb.
	pub method: Method,
	/// Payload, sent as query (GET) or body (POST).
	pub data: Map<String, Value>,
	/// Expected response type, `None` to let the content type decide.
	pub data_type: Option<DataType>,
	/// Further options the caller passed (e.g. `timeout`, `headers`).
	pub extra: Map<String, Value>,
}

/// What the transport got back from a successful exchange.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TransportResponse {
	/// HTTP status code.
	pub status: u16,
	/// Reason phrase.
	pub status_text: String,
	/// `Content-Type` header, if present.
	pub content_type: Option<String>,
	/// Raw body text.
	pub body: String,
}

impl TransportResponse {
	/// A `200 OK` response with the given content type and body.
	pub fn ok(content_type: impl Into<String>, body: impl Into<String>) -> Self {
		Self {
			status: 200,
			status_text: "OK".to_string(),
			content_type: Some(content_type.into()),
			body: body.into(),
		}
	}

	/// A `200 OK` JSON response.
	pub fn json(value: &Value) -> Self {
		Self::ok("application/json", value.to_string())
	}

	/// A `200 OK` markup response.
	pub fn html(markup: impl Into<String>) -> Self {
		Self::ok("text/html; charset=utf-8", markup)
	}
}

/// Interpreted response body.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
	/// Parsed JSON document.
	Json(Value),
	/// Body kept as text (markup or plain text).
	Text(String),
}

impl ResponseBody {
	/// The parsed JSON, if the body was JSON.
	pub fn as_json(&self) -> Option<&Value> {
		match self {
			Self::Json(value) => Some(value),
			Self::Text(_) => None,
		}
	}

	/// The text, if the body was kept as text.
	pub fn as_text(&self) -> Option<&str> {
		match self {
			Self::Json(_) => None,
			Self::Text(text) => Some(text),
		}
	}
}

/// The argument every success hook receives.
///
/// Hooks composed by the dispatcher pass this value on unchanged, so a
/// caller's hook sees exactly what the transport produced.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
	/// URL the request was sent to.
	pub url: String,
	/// HTTP status code.
	pub status: u16,
	/// Reason phrase.
	pub status_text: String,
	/// Body interpreted according to the data type.
	pub body: ResponseBody,
	/// Raw body text.
	pub raw: String,
}

impl Response {
	/// Interprets a transport response for the requested data type.
	///
	/// With no explicit data type, a JSON content type selects JSON parsing.
	pub fn interpret(
		url: impl Into<String>,
		data_type: Option<DataType>,
		response: TransportResponse,
	) -> Result<Self, TransportError> {
		let wants_json = match data_type {
			Some(DataType::Json) => true,
			Some(_) => false,
			None => response
				.content_type
				.as_deref()
				.is_some_and(|ct| ct.to_ascii_lowercase().contains("json")),
		};

		let body = if wants_json {
			let value = serde_json::from_str(&response.body)
				.map_err(|e| TransportError::Parse(e.to_string()))?;
			ResponseBody::Json(value)
		} else {
			ResponseBody::Text(response.body.clone())
		};

		Ok(Self {
			url: url.into(),
			status: response.status,
			status_text: response.status_text,
			body,
			raw: response.body,
		})
	}
}

/// Performs the network exchange for a resolved request.
///
/// Implementations report HTTP-level failures (non-success status) as
/// [`TransportError::Status`] and connection problems as
/// [`TransportError::Network`]. Body interpretation is left to the dispatcher.
#[async_trait]
pub trait Transport: Send + Sync {
	/// Sends `request` and returns the raw response.
	async fn execute(&self, request: TransportRequest)
	-> Result<TransportResponse, TransportError>;
}
