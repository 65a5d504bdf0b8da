//! Request dispatch verbs.
//!
//! [`Ajax`] owns the collaborators (transport, token source, notifier) and
//! exposes the verb family. Each verb normalizes its arguments, layers its
//! own policy on top, then spawns the exchange on the current tokio runtime
//! and returns a [`PendingRequest`] right away.
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use ajaxify_core::{Ajax, AjaxConfig, CallOptions, SecurityToken};
//! use ajaxify_core::testing::MockTransport;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let ajax = Ajax::builder(AjaxConfig::new("http://site.test/")?)
//! 	.transport(Arc::new(MockTransport::new()))
//! 	.static_token(SecurityToken::new(1700000000, "abc"))
//! 	.build()?;
//!
//! let pending = ajax.action(("likes/add", CallOptions::new().with("guid", 42)))?;
//! let response = pending.wait().await?;
//! println!("{}", response.raw);
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::config::AjaxConfig;
use crate::error::{AjaxError, AjaxResult, TransportError};
use crate::messages::{Notifier, TracingNotifier, inspect_raw, with_system_messages};
use crate::options::{CallArguments, RequestOptions, normalize};
use crate::token::{SecurityToken, StaticTokenSource, TokenSource};
use crate::transport::{DataType, Method, Response, Transport, TransportRequest};
use crate::url::{UrlResolver, is_absolute};

/// Path prefix of action endpoints.
pub const ACTION_PREFIX: &str = "action/";

/// Path prefix of API endpoints; the data type follows.
pub const API_PREFIX: &str = "services/api/rest/";

/// Whether the global response inspection applies to a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Inspection {
	Global,
	/// The success hook already forwards system messages.
	Decorated,
}

struct AjaxInner {
	config: AjaxConfig,
	resolver: UrlResolver,
	transport: Arc<dyn Transport>,
	tokens: Arc<dyn TokenSource>,
	notifier: Arc<dyn Notifier>,
}

/// The request dispatcher. Cheap to clone; clones share collaborators.
#[derive(Clone)]
pub struct Ajax {
	inner: Arc<AjaxInner>,
}

impl std::fmt::Debug for Ajax {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Ajax")
			.field("root", &self.inner.resolver.root())
			.field("inspect_all_responses", &self.inner.config.inspect_all_responses)
			.finish_non_exhaustive()
	}
}

/// Builder for [`Ajax`].
pub struct AjaxBuilder {
	config: AjaxConfig,
	transport: Option<Arc<dyn Transport>>,
	tokens: Option<Arc<dyn TokenSource>>,
	notifier: Option<Arc<dyn Notifier>>,
}

impl AjaxBuilder {
	/// Sets the transport.
	pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
		self.transport = Some(transport);
		self
	}

	/// Sets the token source used by [`Ajax::action`].
	pub fn tokens(mut self, tokens: Arc<dyn TokenSource>) -> Self {
		self.tokens = Some(tokens);
		self
	}

	/// Uses a page-issued token under the configured field names.
	pub fn static_token(self, token: SecurityToken) -> Self {
		let fields = self.config.token_fields.clone();
		self.tokens(Arc::new(StaticTokenSource::with_fields(token, fields)))
	}

	/// Sets the notifier receiving system messages.
	///
	/// Defaults to [`TracingNotifier`].
	pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
		self.notifier = Some(notifier);
		self
	}

	/// Builds the dispatcher.
	///
	/// # Errors
	///
	/// Returns [`AjaxError::Config`] when no transport or token source was set.
	pub fn build(self) -> AjaxResult<Ajax> {
		let transport = self
			.transport
			.ok_or_else(|| AjaxError::config("a transport is required"))?;
		let tokens = self
			.tokens
			.ok_or_else(|| AjaxError::config("a token source is required"))?;
		let notifier = self
			.notifier
			.unwrap_or_else(|| Arc::new(TracingNotifier));

		Ok(Ajax {
			inner: Arc::new(AjaxInner {
				resolver: UrlResolver::new(&self.config),
				config: self.config,
				transport,
				tokens,
				notifier,
			}),
		})
	}
}

impl Ajax {
	/// Starts building a dispatcher for `config`.
	pub fn builder(config: AjaxConfig) -> AjaxBuilder {
		AjaxBuilder {
			config,
			transport: None,
			tokens: None,
			notifier: None,
		}
	}

	/// The configuration this dispatcher was built with.
	pub fn config(&self) -> &AjaxConfig {
		&self.inner.config
	}

	/// The URL resolver for the configured root.
	pub fn resolver(&self) -> &UrlResolver {
		&self.inner.resolver
	}

	/// The notifier receiving system messages.
	pub fn notifier(&self) -> &Arc<dyn Notifier> {
		&self.inner.notifier
	}

	/// Dispatches a request with the verb from the options (GET by default).
	pub fn request(&self, args: impl Into<CallArguments>) -> AjaxResult<PendingRequest> {
		let options = normalize(args.into())?;
		self.send(options, Inspection::Global)
	}

	/// Dispatches a GET request.
	pub fn get(&self, args: impl Into<CallArguments>) -> AjaxResult<PendingRequest> {
		let mut options = normalize(args.into())?;
		options.method = Some(Method::Get);
		self.send(options, Inspection::Global)
	}

	/// Dispatches a GET request expecting JSON.
	pub fn get_json(&self, args: impl Into<CallArguments>) -> AjaxResult<PendingRequest> {
		let mut options = normalize(args.into())?;
		options.method = Some(Method::Get);
		options.data_type = Some(DataType::Json);
		self.send(options, Inspection::Global)
	}

	/// Dispatches a POST request.
	pub fn post(&self, args: impl Into<CallArguments>) -> AjaxResult<PendingRequest> {
		let mut options = normalize(args.into())?;
		options.method = Some(Method::Post);
		self.send(options, Inspection::Global)
	}

	/// Dispatches a signed action.
	///
	/// The target may be a bare action name (`likes/add`), a relative action
	/// path (`action/likes/add`) or an absolute action URL under the root.
	/// A fresh security token is merged into the payload, the response is
	/// read as JSON and its `system_messages` are forwarded to the notifier
	/// before the caller's `success` hook runs.
	///
	/// # Errors
	///
	/// [`AjaxError::InvalidArgument`] when the target is missing, empty or
	/// not a string.
	pub fn action(&self, args: impl Into<CallArguments>) -> AjaxResult<PendingRequest> {
		let (target, bag) = args.into().into_parts();
		let target = match target {
			Some(target) if !target.is_empty() => target,
			None if !bag.is_empty() => {
				return Err(AjaxError::invalid_argument("action must be a string"));
			}
			_ => return Err(AjaxError::invalid_argument("action must be specified")),
		};

		let relative = self.inner.resolver.strip_root(&target);
		let url = if is_action_path(relative) {
			relative.to_string()
		} else {
			format!("{ACTION_PREFIX}{relative}")
		};

		let mut options = normalize((url, bag).into())?;
		options.data = self.inner.tokens.mint(std::mem::take(&mut options.data));
		options.data_type = Some(DataType::Json);
		options.success = Some(with_system_messages(
			Arc::clone(&self.inner.notifier),
			options.success.take(),
		));
		options.method = Some(Method::Post);
		self.send(options, Inspection::Decorated)
	}

	/// Calls a web-services API method.
	///
	/// The target names the API method. The request goes to
	/// `services/api/rest/<dataType>/` (JSON unless the options say
	/// otherwise) with `method` stamped into the payload.
	///
	/// # Errors
	///
	/// [`AjaxError::InvalidArgument`] when the method name is missing or empty.
	pub fn api(&self, args: impl Into<CallArguments>) -> AjaxResult<PendingRequest> {
		let args = args.into();
		let method = match args.target() {
			Some(method) if !method.is_empty() => method.to_string(),
			_ => return Err(AjaxError::invalid_argument("API method must be a non-empty string")),
		};

		let mut options = normalize(args)?;
		let data_type = *options.data_type.get_or_insert(DataType::Json);
		options.url = Some(format!("{API_PREFIX}{data_type}/"));
		options.data.insert("method".to_string(), method.into());
		self.send(options, Inspection::Global)
	}

	fn send(&self, options: RequestOptions, inspection: Inspection) -> AjaxResult<PendingRequest> {
		let runtime = Handle::try_current().map_err(|_| AjaxError::NoRuntime)?;

		let RequestOptions {
			url,
			data,
			method,
			data_type,
			success,
			error,
			extra,
			..
		} = options;
		let url = self.inner.resolver.resolve(url.as_deref().unwrap_or_default());
		let method = method.unwrap_or_default();
		let request = TransportRequest {
			url: url.clone(),
			method,
			data,
			data_type,
			extra,
		};

		debug!(%method, %url, "dispatching request");

		let transport = Arc::clone(&self.inner.transport);
		let notifier = Arc::clone(&self.inner.notifier);
		let inspect_all =
			inspection == Inspection::Global && self.inner.config.inspect_all_responses;
		let response_url = url.clone();

		let handle = runtime.spawn(async move {
			let outcome = match transport.execute(request).await {
				Ok(raw) => Response::interpret(response_url.as_str(), data_type, raw),
				Err(e) => Err(e),
			};

			match &outcome {
				Ok(response) => {
					if let Some(hook) = &success {
						hook.call(response.clone());
					}
					if inspect_all {
						inspect_raw(notifier.as_ref(), &response.raw);
					}
				}
				Err(e) => match &error {
					Some(hook) => hook.call(e.clone()),
					None => warn!(error = %e, url = %response_url, "request failed"),
				},
			}

			outcome
		});

		Ok(PendingRequest {
			url,
			method,
			handle,
		})
	}
}

/// Whether a root-relative action target already names the action endpoint.
///
/// Foreign absolute URLs are sent as given.
fn is_action_path(relative: &str) -> bool {
	relative.starts_with(ACTION_PREFIX)
		|| relative
			.strip_prefix('/')
			.is_some_and(|rest| rest.starts_with(ACTION_PREFIX))
		|| is_absolute(relative)
}

/// Handle to an issued request.
///
/// Hooks run whether or not the handle is awaited; dropping it does not
/// cancel the request.
#[derive(Debug)]
pub struct PendingRequest {
	url: String,
	method: Method,
	handle: JoinHandle<Result<Response, TransportError>>,
}

impl PendingRequest {
	/// Resolved URL the request was sent to.
	pub fn url(&self) -> &str {
		&self.url
	}

	/// HTTP verb used.
	pub fn method(&self) -> Method {
		self.method
	}

	/// Whether the exchange and its hooks have completed.
	pub fn is_finished(&self) -> bool {
		self.handle.is_finished()
	}

	/// Waits for the exchange and its hooks to complete.
	pub async fn wait(self) -> Result<Response, TransportError> {
		self.handle
			.await
			.map_err(|e| TransportError::network(format!("request task failed: {e}")))?
	}
}
