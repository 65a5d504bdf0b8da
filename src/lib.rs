//! # Ajaxify
//!
//! Client-side request dispatch for server-rendered web applications.
//!
//! Ajaxify normalizes the loosely shaped arguments of the classic ajax verbs
//! into one request model, signs state-changing actions with anti-forgery
//! tokens, surfaces the server's `system_messages`, and re-renders page
//! fragments without a full navigation.
//!
//! ## Crates
//!
//! - `ajaxify-core`: normalization, dispatch verbs, fragments, bindings
//!   (re-exported at the root of this crate)
//! - `ajaxify-http`: the reqwest transport, available as [`http`]
//!
//! ## Feature Flags
//!
//! - `http` (default) - reqwest-backed [`Transport`]
//!
//! ## Quick Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use ajaxify::{Ajax, AjaxConfig, CallOptions, SecurityToken};
//! use ajaxify::http::ReqwestTransport;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! 	let ajax = Ajax::builder(AjaxConfig::from_env()?)
//! 		.transport(Arc::new(ReqwestTransport::new()))
//! 		.static_token(SecurityToken::new(1700000000, "page-token"))
//! 		.build()?;
//!
//! 	let liked = ajax
//! 		.action(("likes/add", CallOptions::new().with("guid", 42)))?
//! 		.wait()
//! 		.await?;
//! 	println!("{}", liked.raw);
//! 	Ok(())
//! }
//! ```

pub use ajaxify_core::*;

#[cfg(feature = "http")]
pub use ajaxify_http as http;
