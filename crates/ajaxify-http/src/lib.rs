//! Reqwest transport for ajaxify
//!
//! [`ReqwestTransport`] performs the exchanges the dispatcher hands it:
//!
//! - GET requests carry the payload in the query string.
//! - POST requests send it as `application/x-www-form-urlencoded`.
//! - Every request is marked with `X-Requested-With: XMLHttpRequest` so the
//!   server answers with fragments and JSON rather than full pages.
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use ajaxify_core::{Ajax, AjaxConfig, SecurityToken};
//! use ajaxify_http::ReqwestTransport;
//!
//! # fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let ajax = Ajax::builder(AjaxConfig::new("https://community.example.org/")?)
//! 	.transport(Arc::new(ReqwestTransport::new()))
//! 	.static_token(SecurityToken::new(1700000000, "abc"))
//! 	.build()?;
//! # Ok(())
//! # }
//! ```

pub mod encode;

use std::time::Duration;

use ajaxify_core::{Method, Transport, TransportError, TransportRequest, TransportResponse};
use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde_json::Value;
use tracing::debug;

pub use encode::encode_pairs;

/// Header marking asynchronous requests.
pub const REQUESTED_WITH: &str = "X-Requested-With";

/// [`Transport`] backed by a [`reqwest::Client`].
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
	client: reqwest::Client,
}

impl ReqwestTransport {
	/// Creates a transport with a default client.
	pub fn new() -> Self {
		Self::default()
	}

	/// Creates a transport over a configured client (cookies, proxies, TLS).
	pub fn with_client(client: reqwest::Client) -> Self {
		Self { client }
	}

	fn build(&self, request: &TransportRequest) -> reqwest::RequestBuilder {
		let pairs = encode_pairs(&request.data);
		let mut builder = match request.method {
			Method::Get => self.client.get(&request.url).query(&pairs),
			Method::Post => self.client.post(&request.url).form(&pairs),
		};

		let accept = request.data_type.map_or("*/*", |data_type| data_type.accept());
		builder = builder
			.header(REQUESTED_WITH, "XMLHttpRequest")
			.header(ACCEPT, accept);

		if let Some(ms) = request.extra.get("timeout").and_then(Value::as_u64) {
			builder = builder.timeout(Duration::from_millis(ms));
		}
		if let Some(Value::Object(headers)) = request.extra.get("headers") {
			for (name, value) in headers {
				if let Some(value) = value.as_str() {
					builder = builder.header(name.as_str(), value);
				}
			}
		}

		builder
	}
}

#[async_trait]
impl Transport for ReqwestTransport {
	async fn execute(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
		debug!(method = %request.method, url = %request.url, "sending request");

		let response = self
			.build(&request)
			.send()
			.await
			.map_err(|e| TransportError::network(e.to_string()))?;

		let status = response.status();
		let status_text = status.canonical_reason().unwrap_or_default().to_string();
		let content_type = response
			.headers()
			.get(CONTENT_TYPE)
			.and_then(|value| value.to_str().ok())
			.map(str::to_string);
		let body = response
			.text()
			.await
			.map_err(|e| TransportError::network(e.to_string()))?;

		if !status.is_success() {
			return Err(TransportError::status(status.as_u16(), status_text, body));
		}

		Ok(TransportResponse {
			status: status.as_u16(),
			status_text,
			content_type,
			body,
		})
	}
}
