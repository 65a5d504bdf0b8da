//! Dispatcher configuration
//!
//! The application root is the one process-wide value the dispatcher needs.
//! It is injected through [`AjaxConfig`] rather than read from a global, so
//! several roots can coexist (one per [`Ajax`](crate::Ajax) instance).
//!
//! ## Environment
//!
//! [`AjaxConfig::from_env`] reads the following variables (prefix `AJAXIFY_`):
//!
//! | Variable | Meaning | Default |
//! |----------|---------|---------|
//! | `AJAXIFY_ROOT` | Application root URL | required |
//! | `AJAXIFY_INSPECT_ALL` | Surface system messages from every response | `true` |
//! | `AJAXIFY_TOKEN_TS_FIELD` | Payload field for the token timestamp | `__elgg_ts` |
//! | `AJAXIFY_TOKEN_FIELD` | Payload field for the token value | `__elgg_token` |

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{AjaxError, AjaxResult};

/// Default environment variable prefix.
pub const ENV_PREFIX: &str = "AJAXIFY_";

/// Default payload field carrying the token timestamp.
pub const DEFAULT_TIMESTAMP_FIELD: &str = "__elgg_ts";

/// Default payload field carrying the token value.
pub const DEFAULT_TOKEN_FIELD: &str = "__elgg_token";

/// Names of the payload fields the anti-forgery token is merged under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenFields {
	/// Field for the issue timestamp.
	pub timestamp: String,
	/// Field for the token value.
	pub token: String,
}

impl Default for TokenFields {
	fn default() -> Self {
		Self {
			timestamp: DEFAULT_TIMESTAMP_FIELD.to_string(),
			token: DEFAULT_TOKEN_FIELD.to_string(),
		}
	}
}

/// Configuration shared by every dispatch verb.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AjaxConfig {
	/// Application root. Always ends with exactly one `/`.
	#[serde(deserialize_with = "deserialize_root")]
	pub root: Url,

	/// Look for a `system_messages` envelope in every successful non-action
	/// response, not only in action responses.
	#[serde(default = "default_inspect_all")]
	pub inspect_all_responses: bool,

	/// Payload field names used when merging security tokens.
	#[serde(default)]
	pub token_fields: TokenFields,
}

fn default_inspect_all() -> bool {
	true
}

fn deserialize_root<'de, D>(deserializer: D) -> Result<Url, D::Error>
where
	D: serde::Deserializer<'de>,
{
	let raw = String::deserialize(deserializer)?;
	parse_root(&raw).map_err(serde::de::Error::custom)
}

/// Parses and normalizes an application root.
///
/// Only `http` and `https` roots are accepted. Query and fragment are dropped
/// and the path is given a single trailing slash.
pub fn parse_root(raw: &str) -> AjaxResult<Url> {
	let trimmed = raw.trim();
	if trimmed.is_empty() {
		return Err(AjaxError::config("application root is not set"));
	}

	let mut url = Url::parse(trimmed)
		.map_err(|e| AjaxError::config(format!("invalid application root {trimmed:?}: {e}")))?;

	if !matches!(url.scheme(), "http" | "https") {
		return Err(AjaxError::config(format!(
			"application root must be http(s), got {:?}",
			url.scheme()
		)));
	}

	url.set_query(None);
	url.set_fragment(None);
	let path = format!("{}/", url.path().trim_end_matches('/'));
	url.set_path(&path);

	Ok(url)
}

impl AjaxConfig {
	/// Creates a configuration for the given application root.
	pub fn new(root: &str) -> AjaxResult<Self> {
		Ok(Self {
			root: parse_root(root)?,
			inspect_all_responses: default_inspect_all(),
			token_fields: TokenFields::default(),
		})
	}

	/// Enables or disables system-message inspection for non-action responses.
	pub fn with_inspect_all_responses(mut self, enabled: bool) -> Self {
		self.inspect_all_responses = enabled;
		self
	}

	/// Overrides the token payload field names.
	pub fn with_token_fields(mut self, fields: TokenFields) -> Self {
		self.token_fields = fields;
		self
	}

	/// Returns the root as a string (with trailing slash).
	pub fn root_str(&self) -> &str {
		self.root.as_str()
	}

	/// Reads the configuration from `AJAXIFY_*` environment variables.
	pub fn from_env() -> AjaxResult<Self> {
		Self::from_lookup(ENV_PREFIX, |key| std::env::var(key).ok())
	}

	/// Reads the configuration through an arbitrary key lookup.
	///
	/// `lookup` receives the full variable name (prefix included).
	pub fn from_lookup<F>(prefix: &str, lookup: F) -> AjaxResult<Self>
	where
		F: Fn(&str) -> Option<String>,
	{
		let key = |name: &str| format!("{}{}", prefix, name);

		let root_key = key("ROOT");
		let root = lookup(&root_key)
			.ok_or_else(|| AjaxError::config(format!("missing environment variable {root_key}")))?;
		let mut config = Self::new(&root)?;

		let inspect_key = key("INSPECT_ALL");
		if let Some(value) = lookup(&inspect_key) {
			config.inspect_all_responses = parse_bool(&value).ok_or_else(|| {
				AjaxError::config(format!("{inspect_key} is not a boolean: {value:?}"))
			})?;
		}

		if let Some(field) = lookup(&key("TOKEN_TS_FIELD")) {
			config.token_fields.timestamp = field;
		}
		if let Some(field) = lookup(&key("TOKEN_FIELD")) {
			config.token_fields.token = field;
		}

		Ok(config)
	}
}

fn parse_bool(value: &str) -> Option<bool> {
	match value.trim().to_ascii_lowercase().as_str() {
		"1" | "true" | "yes" | "on" => Some(true),
		"0" | "false" | "no" | "off" => Some(false),
		_ => None,
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use std::collections::HashMap;

	#[rstest]
	#[case("http://example.com", "http://example.com/")]
	#[case("http://example.com/", "http://example.com/")]
	#[case("https://example.com/community//", "https://example.com/community/")]
	#[case("http://example.com/sub?x=1#frag", "http://example.com/sub/")]
	fn test_root_is_normalized(#[case] raw: &str, #[case] expected: &str) {
		let config = AjaxConfig::new(raw).unwrap();
		assert_eq!(config.root_str(), expected);
	}

	#[rstest]
	#[case("")]
	#[case("   ")]
	#[case("not a url")]
	#[case("ftp://example.com/")]
	fn test_bad_root_is_config_error(#[case] raw: &str) {
		assert!(matches!(AjaxConfig::new(raw), Err(AjaxError::Config(_))));
	}

	#[rstest]
	fn test_from_lookup_reads_prefixed_keys() {
		let vars: HashMap<&str, &str> = [
			("APP_ROOT", "https://site.test/elgg"),
			("APP_INSPECT_ALL", "off"),
			("APP_TOKEN_FIELD", "csrf"),
		]
		.into_iter()
		.collect();

		let config =
			AjaxConfig::from_lookup("APP_", |k| vars.get(k).map(|v| v.to_string())).unwrap();

		assert_eq!(config.root_str(), "https://site.test/elgg/");
		assert!(!config.inspect_all_responses);
		assert_eq!(config.token_fields.token, "csrf");
		assert_eq!(config.token_fields.timestamp, DEFAULT_TIMESTAMP_FIELD);
	}

	#[rstest]
	fn test_from_lookup_requires_root() {
		let err = AjaxConfig::from_lookup(ENV_PREFIX, |_| None).unwrap_err();
		assert!(err.to_string().contains("AJAXIFY_ROOT"));
	}

	#[rstest]
	fn test_from_lookup_rejects_bad_bool() {
		let err = AjaxConfig::from_lookup(ENV_PREFIX, |k| match k {
			"AJAXIFY_ROOT" => Some("http://site.test/".to_string()),
			"AJAXIFY_INSPECT_ALL" => Some("maybe".to_string()),
			_ => None,
		})
		.unwrap_err();
		assert!(matches!(err, AjaxError::Config(_)));
	}

	#[rstest]
	fn test_deserialize_normalizes_root() {
		let config: AjaxConfig =
			serde_json::from_str(r#"{"root": "http://site.test/app"}"#).unwrap();
		assert_eq!(config.root_str(), "http://site.test/app/");
		assert!(config.inspect_all_responses);
		assert_eq!(config.token_fields, TokenFields::default());
	}
}
