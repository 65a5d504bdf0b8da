//! Test doubles for the collaborator seams.
//!
//! Every double records what it was asked to do so tests can assert on the
//! exact requests, insertions and notifications a call produced.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{Map, Value, json};

use crate::bindings::UiRegistry;
use crate::callback::ElementHandler;
use crate::config::TokenFields;
use crate::dom::{Dom, Element, Manipulation};
use crate::error::TransportError;
use crate::messages::Notifier;
use crate::token::{SecurityToken, TokenSource};
use crate::transport::{Transport, TransportRequest, TransportResponse};

type Outcome = Result<TransportResponse, TransportError>;

/// Transport answering from canned routes.
///
/// A route matches when its pattern is a substring of the request URL; the
/// most recently added matching route wins. Unmatched requests get the
/// default response (`{}` as JSON unless changed).
#[derive(Debug)]
pub struct MockTransport {
	requests: Mutex<Vec<TransportRequest>>,
	routes: Mutex<Vec<(String, Outcome)>>,
	default: Mutex<Outcome>,
}

impl Default for MockTransport {
	fn default() -> Self {
		Self {
			requests: Mutex::new(Vec::new()),
			routes: Mutex::new(Vec::new()),
			default: Mutex::new(Ok(TransportResponse::json(&json!({})))),
		}
	}
}

impl MockTransport {
	/// Creates a transport answering `{}` to everything.
	pub fn new() -> Self {
		Self::default()
	}

	/// Answers requests whose URL contains `pattern` with `response`.
	pub fn respond(&self, pattern: impl Into<String>, response: TransportResponse) {
		self.routes.lock().push((pattern.into(), Ok(response)));
	}

	/// Fails requests whose URL contains `pattern` with `error`.
	pub fn fail(&self, pattern: impl Into<String>, error: TransportError) {
		self.routes.lock().push((pattern.into(), Err(error)));
	}

	/// Replaces the answer for unmatched requests.
	pub fn set_default(&self, outcome: Outcome) {
		*self.default.lock() = outcome;
	}

	/// Requests seen so far, in order.
	pub fn requests(&self) -> Vec<TransportRequest> {
		self.requests.lock().clone()
	}

	/// Number of requests seen so far.
	pub fn request_count(&self) -> usize {
		self.requests.lock().len()
	}

	/// The most recent request.
	pub fn last_request(&self) -> Option<TransportRequest> {
		self.requests.lock().last().cloned()
	}
}

#[async_trait]
impl Transport for MockTransport {
	async fn execute(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
		let outcome = self
			.routes
			.lock()
			.iter()
			.rev()
			.find(|(pattern, _)| request.url.contains(pattern.as_str()))
			.map(|(_, outcome)| outcome.clone())
			.unwrap_or_else(|| self.default.lock().clone());
		self.requests.lock().push(request);
		outcome
	}
}

/// One markup placement performed through [`Dom::insert`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Insertion {
	/// Element written into.
	pub target: Element,
	/// Markup placed.
	pub markup: String,
	/// Placement mode.
	pub manipulation: Manipulation,
}

/// In-memory page.
///
/// Structure (attributes, descendants, ancestors, extractable fragments) is
/// declared up front with the `with_*` builders; writes are recorded.
#[derive(Debug, Default)]
pub struct MockDom {
	location: Mutex<String>,
	attributes: HashMap<(Element, String), String>,
	descendants: HashMap<(Element, String), Element>,
	ancestors: HashMap<(Element, String), Element>,
	fragments: HashMap<String, String>,
	inserts: Mutex<Vec<Insertion>>,
	hidden: Mutex<Vec<Element>>,
	extracted_from: Mutex<Vec<String>>,
}

impl MockDom {
	/// Creates an empty page.
	pub fn new() -> Self {
		Self::default()
	}

	/// Sets the current page URL.
	pub fn with_location(self, location: impl Into<String>) -> Self {
		*self.location.lock() = location.into();
		self
	}

	/// Declares an attribute value.
	pub fn with_attribute(
		mut self,
		element: impl Into<Element>,
		name: &str,
		value: impl Into<String>,
	) -> Self {
		self.attributes
			.insert((element.into(), name.to_string()), value.into());
		self
	}

	/// Declares the descendant of `element` matching `selector`.
	pub fn with_descendant(
		mut self,
		element: impl Into<Element>,
		selector: &str,
		found: impl Into<Element>,
	) -> Self {
		self.descendants
			.insert((element.into(), selector.to_string()), found.into());
		self
	}

	/// Declares the ancestor of `element` matching `selector`.
	pub fn with_ancestor(
		mut self,
		element: impl Into<Element>,
		selector: &str,
		found: impl Into<Element>,
	) -> Self {
		self.ancestors
			.insert((element.into(), selector.to_string()), found.into());
		self
	}

	/// Declares what extracting `selector` from fetched markup yields.
	pub fn with_fragment(mut self, selector: &str, inner: impl Into<String>) -> Self {
		self.fragments.insert(selector.to_string(), inner.into());
		self
	}

	/// Changes the current page URL.
	pub fn set_location(&self, location: impl Into<String>) {
		*self.location.lock() = location.into();
	}

	/// Insertions performed so far.
	pub fn inserts(&self) -> Vec<Insertion> {
		self.inserts.lock().clone()
	}

	/// Elements hidden so far.
	pub fn hidden(&self) -> Vec<Element> {
		self.hidden.lock().clone()
	}

	/// Markup passed to [`Dom::extract`] so far.
	pub fn extracted_from(&self) -> Vec<String> {
		self.extracted_from.lock().clone()
	}
}

impl Dom for MockDom {
	fn location(&self) -> String {
		self.location.lock().clone()
	}

	fn attribute(&self, element: &Element, name: &str) -> Option<String> {
		self.attributes
			.get(&(element.clone(), name.to_string()))
			.cloned()
	}

	fn find(&self, element: &Element, selector: &str) -> Option<Element> {
		self.descendants
			.get(&(element.clone(), selector.to_string()))
			.cloned()
	}

	fn closest(&self, element: &Element, selector: &str) -> Option<Element> {
		self.ancestors
			.get(&(element.clone(), selector.to_string()))
			.cloned()
	}

	fn insert(&self, target: &Element, markup: &str, manipulation: Manipulation) {
		self.inserts.lock().push(Insertion {
			target: target.clone(),
			markup: markup.to_string(),
			manipulation,
		});
	}

	fn hide(&self, element: &Element) {
		self.hidden.lock().push(element.clone());
	}

	fn extract(&self, markup: &str, selector: &str) -> Option<String> {
		self.extracted_from.lock().push(markup.to_string());
		self.fragments.get(selector).cloned()
	}
}

/// Notifier keeping every message it is handed.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
	errors: Mutex<Vec<String>>,
	successes: Mutex<Vec<String>>,
}

impl RecordingNotifier {
	/// Creates an empty recorder.
	pub fn new() -> Self {
		Self::default()
	}

	/// Error messages received.
	pub fn errors(&self) -> Vec<String> {
		self.errors.lock().clone()
	}

	/// Success messages received.
	pub fn successes(&self) -> Vec<String> {
		self.successes.lock().clone()
	}
}

impl Notifier for RecordingNotifier {
	fn register_error(&self, messages: &[String]) {
		self.errors.lock().extend_from_slice(messages);
	}

	fn system_message(&self, messages: &[String]) {
		self.successes.lock().extend_from_slice(messages);
	}
}

/// Token source merging a fixed pair and counting mints.
#[derive(Debug)]
pub struct FixedTokenSource {
	token: SecurityToken,
	fields: TokenFields,
	mints: AtomicUsize,
}

impl FixedTokenSource {
	/// Creates a source always merging `token`.
	pub fn new(token: SecurityToken) -> Self {
		Self::with_fields(token, TokenFields::default())
	}

	/// Creates a source merging `token` under custom field names.
	pub fn with_fields(token: SecurityToken, fields: TokenFields) -> Self {
		Self {
			token,
			fields,
			mints: AtomicUsize::new(0),
		}
	}

	/// The merged token.
	pub fn token(&self) -> &SecurityToken {
		&self.token
	}

	/// Number of times [`TokenSource::mint`] ran.
	pub fn mint_count(&self) -> usize {
		self.mints.load(Ordering::SeqCst)
	}
}

impl Default for FixedTokenSource {
	fn default() -> Self {
		Self::new(SecurityToken::new(1700000000, "test-token"))
	}
}

impl TokenSource for FixedTokenSource {
	fn mint(&self, data: Map<String, Value>) -> Map<String, Value> {
		self.mints.fetch_add(1, Ordering::SeqCst);
		self.token.merge_into(&self.fields, data)
	}
}

/// UI registry that lets tests fire clicks.
#[derive(Debug, Default)]
pub struct MockUi {
	handlers: HashMap<String, ElementHandler>,
}

impl MockUi {
	/// Creates a registry with no handlers.
	pub fn new() -> Self {
		Self::default()
	}

	/// Selectors that received a click handler.
	pub fn selectors(&self) -> Vec<&str> {
		let mut selectors: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
		selectors.sort_unstable();
		selectors
	}

	/// Fires a click on `element` for `selector`; `false` if nothing is wired.
	pub fn click(&self, selector: &str, element: impl Into<Element>) -> bool {
		match self.handlers.get(selector) {
			Some(handler) => {
				handler.call(element.into());
				true
			}
			None => false,
		}
	}
}

impl UiRegistry for MockUi {
	fn on_click(&mut self, selector: &str, handler: ElementHandler) {
		self.handlers.insert(selector.to_string(), handler);
	}
}
