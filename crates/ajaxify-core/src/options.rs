//! Call-argument normalization.
//!
//! Every dispatch verb accepts loosely shaped input and turns it into one
//! [`RequestOptions`] before anything else happens. The input shapes are
//! modelled explicitly:
//!
//! - [`CallArguments`] is either a target string with an optional bag, or a
//!   bag alone (whose `url` member then stands in for the target).
//! - [`CallOptions`] is the bag: an ordered map of member name to
//!   [`OptionValue`], where a member is either a JSON value or a hook.
//!
//! ## Precedence
//!
//! 1. A string target is the URL; otherwise the bag's `url` member is.
//! 2. A bag with a truthy `data` member is an options bag.
//! 3. Otherwise a bag holding any hook is an options bag.
//! 4. Any other bag is a *data-only* bag and becomes `{ data: <bag> }`.
//! 5. The URL from step 1, when non-empty, overrides the result's `url`.
//!
//! A data-only bag that carries a `url` member (bag-only call) has it promoted
//! to the request URL *and* keeps it inside `data`.
//!
//! ## Example
//!
//! ```
//! use ajaxify_core::options::{normalize, CallOptions};
//! use serde_json::json;
//!
//! // Flat payload shortcut
//! let options = normalize(("friend/add", CallOptions::new().with("friend", 7)).into()).unwrap();
//! assert_eq!(options.url.as_deref(), Some("friend/add"));
//! assert_eq!(options.data.get("friend"), Some(&json!(7)));
//! ```

use indexmap::IndexMap;
use serde_json::{Map, Value};
use tracing::warn;

use crate::callback::{Callback, ErrorHandler, SuccessHandler};
use crate::dom::{Element, Manipulation};
use crate::error::{AjaxError, AjaxResult, TransportError};
use crate::transport::{DataType, Method, Response};

/// One member of an option bag.
#[derive(Debug, Clone)]
pub enum OptionValue {
	/// Plain JSON value.
	Value(Value),
	/// Completion hook for successful responses.
	Success(SuccessHandler),
	/// Completion hook for failures.
	Error(ErrorHandler),
}

impl OptionValue {
	/// Whether this member is a hook rather than a value.
	pub fn is_callback(&self) -> bool {
		!matches!(self, Self::Value(_))
	}

	/// The JSON value, if this member is one.
	pub fn as_value(&self) -> Option<&Value> {
		match self {
			Self::Value(value) => Some(value),
			_ => None,
		}
	}
}

impl From<Value> for OptionValue {
	fn from(value: Value) -> Self {
		Self::Value(value)
	}
}

/// Raw option bag as passed by a caller.
#[derive(Debug, Clone, Default)]
pub struct CallOptions {
	members: IndexMap<String, OptionValue>,
}

impl CallOptions {
	/// Creates an empty bag.
	pub fn new() -> Self {
		Self::default()
	}

	/// Sets member `key` to a JSON value.
	pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
		self.members
			.insert(key.into(), OptionValue::Value(value.into()));
		self
	}

	/// Sets the `data` member.
	pub fn data(self, data: impl Into<Value>) -> Self {
		self.with("data", data)
	}

	/// Sets the `url` member.
	pub fn url(self, url: impl Into<String>) -> Self {
		self.with("url", url.into())
	}

	/// Sets the `type` member.
	pub fn method(self, method: Method) -> Self {
		self.with("type", method.as_str())
	}

	/// Sets the `dataType` member.
	pub fn data_type(self, data_type: DataType) -> Self {
		self.with("dataType", data_type.as_str())
	}

	/// Sets the `target` member used by the fragment loader.
	pub fn target(self, target: impl Into<Element>) -> Self {
		self.with("target", target.into().as_str())
	}

	/// Sets the `manipulationMethod` member used by the fragment loader.
	pub fn manipulation(self, manipulation: Manipulation) -> Self {
		self.with("manipulationMethod", manipulation.as_str())
	}

	/// Sets the `success` hook.
	pub fn success<F>(self, f: F) -> Self
	where
		F: Fn(Response) + Send + Sync + 'static,
	{
		self.success_handler(Callback::new(f))
	}

	/// Sets the `success` hook from an existing handler.
	pub fn success_handler(mut self, handler: SuccessHandler) -> Self {
		self.members
			.insert("success".to_string(), OptionValue::Success(handler));
		self
	}

	/// Sets the `error` hook.
	pub fn error<F>(self, f: F) -> Self
	where
		F: Fn(TransportError) + Send + Sync + 'static,
	{
		self.error_handler(Callback::new(f))
	}

	/// Sets the `error` hook from an existing handler.
	pub fn error_handler(mut self, handler: ErrorHandler) -> Self {
		self.members
			.insert("error".to_string(), OptionValue::Error(handler));
		self
	}

	/// Inserts a member, returning the previous one.
	pub fn insert(&mut self, key: impl Into<String>, value: OptionValue) -> Option<OptionValue> {
		self.members.insert(key.into(), value)
	}

	/// Removes a member, keeping the order of the rest.
	pub fn remove(&mut self, key: &str) -> Option<OptionValue> {
		self.members.shift_remove(key)
	}

	/// Returns a member.
	pub fn get(&self, key: &str) -> Option<&OptionValue> {
		self.members.get(key)
	}

	/// Returns a member's JSON value.
	pub fn get_value(&self, key: &str) -> Option<&Value> {
		self.get(key).and_then(OptionValue::as_value)
	}

	/// Whether member `key` exists.
	pub fn contains_key(&self, key: &str) -> bool {
		self.members.contains_key(key)
	}

	/// Number of members.
	pub fn len(&self) -> usize {
		self.members.len()
	}

	/// Whether the bag has no members.
	pub fn is_empty(&self) -> bool {
		self.members.is_empty()
	}

	/// Iterates members in insertion order.
	pub fn iter(&self) -> impl Iterator<Item = (&str, &OptionValue)> {
		self.members.iter().map(|(k, v)| (k.as_str(), v))
	}

	/// Whether this bag is a bare payload rather than an options bag.
	pub fn is_data_only(&self) -> bool {
		if self.contains_key("data") {
			return false;
		}
		!self.members.values().any(OptionValue::is_callback)
	}

	/// Builds a bag from a JSON object.
	pub fn from_json(value: Value) -> AjaxResult<Self> {
		match value {
			Value::Object(map) => Ok(map.into()),
			Value::Null => Ok(Self::new()),
			other => Err(AjaxError::invalid_argument(format!(
				"options must be an object, got {other}"
			))),
		}
	}
}

impl From<Map<String, Value>> for CallOptions {
	fn from(map: Map<String, Value>) -> Self {
		Self {
			members: map
				.into_iter()
				.map(|(k, v)| (k, OptionValue::Value(v)))
				.collect(),
		}
	}
}

/// The raw `(target, options)` or `(options)` input of a dispatch call.
#[derive(Debug, Clone)]
pub enum CallArguments {
	/// A target string, optionally followed by a bag.
	Target {
		/// URL, action name, API method or view name.
		target: String,
		/// Options or payload.
		options: Option<CallOptions>,
	},
	/// A bag alone; its `url` member, if any, is the target.
	Options(CallOptions),
}

impl CallArguments {
	/// The explicit target string, if one was given.
	pub fn target(&self) -> Option<&str> {
		match self {
			Self::Target { target, .. } => Some(target),
			Self::Options(_) => None,
		}
	}

	/// Splits into the target string and the bag (empty when absent).
	pub fn into_parts(self) -> (Option<String>, CallOptions) {
		match self {
			Self::Target { target, options } => (Some(target), options.unwrap_or_default()),
			Self::Options(options) => (None, options),
		}
	}
}

impl From<&str> for CallArguments {
	fn from(target: &str) -> Self {
		Self::Target {
			target: target.to_string(),
			options: None,
		}
	}
}

impl From<String> for CallArguments {
	fn from(target: String) -> Self {
		Self::Target {
			target,
			options: None,
		}
	}
}

impl From<&String> for CallArguments {
	fn from(target: &String) -> Self {
		Self::from(target.as_str())
	}
}

impl From<(&str, CallOptions)> for CallArguments {
	fn from((target, options): (&str, CallOptions)) -> Self {
		Self::Target {
			target: target.to_string(),
			options: Some(options),
		}
	}
}

impl From<(String, CallOptions)> for CallArguments {
	fn from((target, options): (String, CallOptions)) -> Self {
		Self::Target {
			target,
			options: Some(options),
		}
	}
}

/// A bare hook in the options position is shorthand for `{ success: hook }`.
impl From<(&str, SuccessHandler)> for CallArguments {
	fn from((target, hook): (&str, SuccessHandler)) -> Self {
		Self::from((target, CallOptions::new().success_handler(hook)))
	}
}

impl From<CallOptions> for CallArguments {
	fn from(options: CallOptions) -> Self {
		Self::Options(options)
	}
}

/// `None` models a missing target: an empty bag with no URL.
impl From<Option<&str>> for CallArguments {
	fn from(target: Option<&str>) -> Self {
		match target {
			Some(target) => target.into(),
			None => Self::Options(CallOptions::new()),
		}
	}
}

impl From<Option<String>> for CallArguments {
	fn from(target: Option<String>) -> Self {
		match target {
			Some(target) => target.into(),
			None => Self::Options(CallOptions::new()),
		}
	}
}

/// Canonical request options produced by [`normalize`].
///
/// `url` is still unresolved here; the dispatcher resolves it against the
/// application root right before handing the request to the transport.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
	/// Request URL as given (relative or absolute).
	pub url: Option<String>,
	/// Payload, always present.
	pub data: Map<String, Value>,
	/// HTTP verb, defaulted by the verb that dispatches.
	pub method: Option<Method>,
	/// Expected response interpretation.
	pub data_type: Option<DataType>,
	/// Success hook.
	pub success: Option<SuccessHandler>,
	/// Error hook.
	pub error: Option<ErrorHandler>,
	/// Fragment target element.
	pub target: Option<Element>,
	/// Fragment insertion mode.
	pub manipulation: Option<Manipulation>,
	/// Remaining members, forwarded to the transport untouched.
	pub extra: Map<String, Value>,
}

impl RequestOptions {
	/// Interprets an options bag member by member.
	fn from_bag(bag: CallOptions) -> AjaxResult<Self> {
		let mut options = Self::default();

		for (key, member) in bag.members {
			match (key.as_str(), member) {
				("success", OptionValue::Success(handler)) => options.success = Some(handler),
				("error", OptionValue::Error(handler)) => options.error = Some(handler),
				(_, OptionValue::Success(_) | OptionValue::Error(_)) => {
					warn!(member = %key, "ignoring unsupported callback member");
				}
				(_, OptionValue::Value(Value::Null)) => {}
				("success" | "error", OptionValue::Value(_)) => {
					return Err(AjaxError::invalid_argument(format!(
						"`{key}` must be a callback"
					)));
				}
				("url", OptionValue::Value(value)) => options.url = Some(expect_string("url", value)?),
				("data", OptionValue::Value(value)) => options.data = expect_object(value)?,
				("type" | "method", OptionValue::Value(value)) => {
					options.method = Some(expect_string(&key, value)?.parse()?);
				}
				("dataType", OptionValue::Value(value)) => {
					options.data_type = Some(expect_string("dataType", value)?.parse()?);
				}
				("target", OptionValue::Value(value)) => {
					options.target = Some(Element::new(expect_string("target", value)?));
				}
				("manipulationMethod", OptionValue::Value(value)) => {
					options.manipulation = Some(expect_string("manipulationMethod", value)?.parse()?);
				}
				(_, OptionValue::Value(value)) => {
					options.extra.insert(key.clone(), value);
				}
			}
		}

		Ok(options)
	}

	/// Wraps a data-only bag as the payload.
	fn from_data(bag: CallOptions) -> Self {
		let data = bag
			.members
			.into_iter()
			.filter_map(|(k, v)| match v {
				OptionValue::Value(value) => Some((k, value)),
				_ => None,
			})
			.collect();
		Self {
			data,
			..Self::default()
		}
	}
}

/// Resolves raw call arguments into canonical request options.
pub fn normalize(args: CallArguments) -> AjaxResult<RequestOptions> {
	let (url, bag) = match args {
		CallArguments::Target { target, options } => (Some(target), options.unwrap_or_default()),
		CallArguments::Options(bag) => {
			let url = match bag.get("url") {
				None | Some(OptionValue::Value(Value::Null)) => None,
				Some(OptionValue::Value(Value::String(url))) => Some(url.clone()),
				Some(_) => return Err(AjaxError::invalid_argument("`url` must be a string")),
			};
			(url, bag)
		}
	};

	let mut options = if bag.is_data_only() {
		RequestOptions::from_data(bag)
	} else {
		RequestOptions::from_bag(bag)?
	};

	if let Some(url) = url.filter(|u| !u.is_empty()) {
		options.url = Some(url);
	}

	Ok(options)
}

fn expect_string(key: &str, value: Value) -> AjaxResult<String> {
	match value {
		Value::String(s) => Ok(s),
		other => Err(AjaxError::invalid_argument(format!(
			"`{key}` must be a string, got {other}"
		))),
	}
}

fn expect_object(value: Value) -> AjaxResult<Map<String, Value>> {
	match value {
		Value::Object(map) => Ok(map),
		Value::Null => Ok(Map::new()),
		other => Err(AjaxError::invalid_argument(format!(
			"`data` must be an object, got {other}"
		))),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serde_json::json;

	fn payload() -> CallOptions {
		CallOptions::new().with("guid", 42).with("title", "hello")
	}

	#[rstest]
	fn test_data_only_bag_is_wrapped() {
		let options = normalize(("entity/delete", payload()).into()).unwrap();

		assert_eq!(options.url.as_deref(), Some("entity/delete"));
		assert_eq!(
			Value::Object(options.data),
			json!({"guid": 42, "title": "hello"})
		);
		assert!(options.success.is_none());
		assert!(options.extra.is_empty());
	}

	#[rstest]
	fn test_bag_with_data_is_not_rewrapped() {
		let bag = CallOptions::new()
			.data(json!({"id": 7}))
			.with("cache", false);
		let options = normalize(("river/getitem", bag).into()).unwrap();

		assert_eq!(Value::Object(options.data), json!({"id": 7}));
		assert_eq!(options.extra.get("cache"), Some(&json!(false)));
	}

	#[rstest]
	fn test_bag_with_callback_is_not_data_only() {
		let bag = CallOptions::new().with("timeout", 500).success(|_| {});
		assert!(!bag.is_data_only());

		let options = normalize(("foo", bag).into()).unwrap();
		assert!(options.success.is_some());
		assert!(options.data.is_empty());
		assert_eq!(options.extra.get("timeout"), Some(&json!(500)));
	}

	#[rstest]
	fn test_null_data_member_is_an_empty_payload() {
		let bag = CallOptions::new().with("data", Value::Null).with("x", 1);
		assert!(!bag.is_data_only());

		let options = normalize(("foo", bag).into()).unwrap();
		assert!(options.data.is_empty());
		assert_eq!(options.extra.get("x"), Some(&json!(1)));
	}

	#[rstest]
	#[case(json!(0))]
	#[case(json!(""))]
	#[case(json!(false))]
	fn test_scalar_data_member_is_rejected(#[case] data: Value) {
		let bag = CallOptions::new().with("data", data).with("x", 1);
		assert!(!bag.is_data_only());

		let err = normalize(("foo", bag).into()).unwrap_err();
		assert!(matches!(err, AjaxError::InvalidArgument(_)));
	}

	#[rstest]
	fn test_target_string_alone_gives_empty_data() {
		let options = normalize("blog/all".into()).unwrap();
		assert_eq!(options.url.as_deref(), Some("blog/all"));
		assert!(options.data.is_empty());
	}

	#[rstest]
	fn test_bag_only_call_reads_url_member() {
		let bag = CallOptions::new()
			.url("blog/all")
			.data(json!({"offset": 10}))
			.method(Method::Post)
			.data_type(DataType::Json);
		let options = normalize(bag.into()).unwrap();

		assert_eq!(options.url.as_deref(), Some("blog/all"));
		assert_eq!(options.method, Some(Method::Post));
		assert_eq!(options.data_type, Some(DataType::Json));
		assert_eq!(Value::Object(options.data), json!({"offset": 10}));
	}

	#[rstest]
	fn test_data_only_bag_url_is_promoted_and_kept() {
		let bag = CallOptions::new().url("blog/all").with("offset", 10);
		let options = normalize(bag.into()).unwrap();

		assert_eq!(options.url.as_deref(), Some("blog/all"));
		assert_eq!(
			Value::Object(options.data),
			json!({"url": "blog/all", "offset": 10})
		);
	}

	#[rstest]
	fn test_target_overrides_url_member() {
		let bag = CallOptions::new().url("ignored").success(|_| {});
		let options = normalize(("used", bag).into()).unwrap();
		assert_eq!(options.url.as_deref(), Some("used"));
	}

	#[rstest]
	fn test_empty_target_does_not_override_url_member() {
		let bag = CallOptions::new().url("kept").success(|_| {});
		let options = normalize(("", bag).into()).unwrap();
		assert_eq!(options.url.as_deref(), Some("kept"));
	}

	#[rstest]
	fn test_bare_hook_is_success_shorthand() {
		let options = normalize(("blog/all", Callback::new(|_: Response| {})).into()).unwrap();
		assert!(options.success.is_some());
		assert!(options.data.is_empty());
	}

	#[rstest]
	fn test_missing_target_is_empty_bag() {
		let options = normalize(None::<&str>.into()).unwrap();
		assert!(options.url.is_none());
		assert!(options.data.is_empty());
	}

	#[rstest]
	fn test_fragment_members_are_typed() {
		let bag = CallOptions::new()
			.data(json!({}))
			.target("#river")
			.manipulation(Manipulation::Append);
		let options = normalize(("river/getitem", bag).into()).unwrap();

		assert_eq!(options.target, Some(Element::from("#river")));
		assert_eq!(options.manipulation, Some(Manipulation::Append));
		assert!(options.extra.is_empty());
	}

	#[rstest]
	fn test_unknown_callback_member_is_ignored() {
		let mut bag = CallOptions::new().data(json!({"a": 1}));
		bag.insert("complete", OptionValue::Success(Callback::new(|_| {})));
		let options = normalize(("x", bag).into()).unwrap();

		assert!(options.success.is_none());
		assert!(!options.extra.contains_key("complete"));
	}

	#[rstest]
	fn test_non_object_data_is_rejected() {
		let bag = CallOptions::new().data(json!([1, 2])).success(|_| {});
		assert!(matches!(
			normalize(("x", bag).into()),
			Err(AjaxError::InvalidArgument(_))
		));
	}

	#[rstest]
	fn test_non_string_url_member_is_rejected() {
		let bag = CallOptions::new().with("url", 5);
		assert!(matches!(
			normalize(bag.into()),
			Err(AjaxError::InvalidArgument(_))
		));
	}

	#[rstest]
	fn test_value_in_hook_slot_is_rejected() {
		let bag = CallOptions::new().data(json!({})).with("success", "nope");
		assert!(matches!(
			normalize(("x", bag).into()),
			Err(AjaxError::InvalidArgument(_))
		));
	}

	#[rstest]
	fn test_from_json_requires_object() {
		assert!(CallOptions::from_json(json!({"a": 1})).unwrap().contains_key("a"));
		assert!(CallOptions::from_json(json!(null)).unwrap().is_empty());
		assert!(CallOptions::from_json(json!("a")).is_err());
	}

	#[rstest]
	fn test_remove_keeps_order() {
		let mut bag = CallOptions::new().with("a", 1).with("b", 2).with("c", 3);
		bag.remove("b");
		let keys: Vec<&str> = bag.iter().map(|(k, _)| k).collect();
		assert_eq!(keys, vec!["a", "c"]);
	}
}
