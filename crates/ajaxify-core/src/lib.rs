//! Ajaxify core - request dispatch for server-rendered pages
//!
//! Turns loosely shaped call arguments into well-formed requests, signs
//! state-changing actions with anti-forgery tokens, and re-renders page
//! fragments from server-produced markup.
//!
//! ## Architecture
//!
//! - [`options`]: call-argument normalization (what is URL, payload, hook)
//! - [`url`]: application-relative URL resolution
//! - [`dispatch`]: the verb family (`get`, `post`, `action`, `api`, ...)
//! - [`token`]: anti-forgery token sources
//! - [`messages`]: `system_messages` envelope and the notifier seam
//! - [`fragment`]: partial-view loading, refresh and polling
//! - [`bindings`]: like/delete menu-item handlers and their registration
//! - [`transport`] and [`dom`]: host-supplied collaborator seams
//! - [`testing`]: recording doubles for every seam
//!
//! Every verb returns immediately with a [`PendingRequest`]; hooks run later
//! on the tokio runtime the verb was called from.
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use ajaxify_core::{Ajax, AjaxConfig, CallOptions, FragmentLoader, SecurityToken};
//! use ajaxify_core::testing::{MockDom, MockTransport};
//! use serde_json::json;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let ajax = Ajax::builder(AjaxConfig::from_env()?)
//! 	.transport(Arc::new(MockTransport::new()))
//! 	.static_token(SecurityToken::new(1700000000, "abc"))
//! 	.build()?;
//!
//! ajax.action(("friend/add", CallOptions::new().with("friend", 7)))?;
//!
//! let views = FragmentLoader::new(ajax.clone(), Arc::new(MockDom::new()));
//! views.load_view((
//! 	"likes/display",
//! 	CallOptions::new().data(json!({"guid": 42})).target("#likes-42"),
//! ))?;
//! # Ok(())
//! # }
//! ```

pub mod bindings;
pub mod callback;
pub mod config;
pub mod dispatch;
pub mod dom;
pub mod error;
pub mod fragment;
pub mod messages;
pub mod options;
pub mod testing;
pub mod token;
pub mod transport;
pub mod url;

pub use bindings::{ActionDispatcher, UiRegistry};
pub use callback::{Callback, ElementHandler, ErrorHandler, SuccessHandler};
pub use config::{AjaxConfig, TokenFields};
pub use dispatch::{Ajax, AjaxBuilder, PendingRequest};
pub use dom::{Dom, Element, Manipulation};
pub use error::{AjaxError, AjaxResult, TransportError};
pub use fragment::{FragmentLoader, PollHandle};
pub use messages::{Notifier, SystemMessages, TracingNotifier, with_system_messages};
pub use options::{CallArguments, CallOptions, OptionValue, RequestOptions, normalize};
pub use token::{HmacTokenSource, SecurityToken, StaticTokenSource, TokenSource};
pub use transport::{
	DataType, Method, Response, ResponseBody, Transport, TransportRequest, TransportResponse,
};
pub use url::UrlResolver;
