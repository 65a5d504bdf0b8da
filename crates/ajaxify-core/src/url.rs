//! Application-relative URL resolution.

use crate::config::AjaxConfig;

/// Resolves request targets against the application root.
///
/// The resolver is pure string manipulation: no network, no DOM.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlResolver {
	/// Root with exactly one trailing slash.
	root: String,
}

impl UrlResolver {
	/// Creates a resolver for a configuration's root.
	pub fn new(config: &AjaxConfig) -> Self {
		Self {
			root: config.root_str().to_string(),
		}
	}

	/// Returns the application root (with trailing slash).
	pub fn root(&self) -> &str {
		&self.root
	}

	/// Turns `raw` into an absolute URL.
	///
	/// - URLs already under the root, or absolute URLs elsewhere, come back unchanged.
	/// - Anything else is appended to the root, with leading slashes collapsed
	///   so the boundary carries exactly one `/`.
	/// - An empty string resolves to the root.
	pub fn resolve(&self, raw: &str) -> String {
		if raw.starts_with(&self.root) || is_absolute(raw) {
			return raw.to_string();
		}
		format!("{}{}", self.root, raw.trim_start_matches('/'))
	}

	/// Returns the root-relative remainder of `raw` when it lies under the root,
	/// otherwise `raw` unchanged.
	pub fn strip_root<'a>(&self, raw: &'a str) -> &'a str {
		raw.strip_prefix(self.root.as_str()).unwrap_or(raw)
	}

	/// Whether `raw` lies under the application root.
	pub fn is_internal(&self, raw: &str) -> bool {
		raw.starts_with(&self.root)
	}

	/// Extracts a view name from the current page URL.
	///
	/// The name is the part after the root with any query string removed.
	/// Returns `fallback` when `current` is outside the root or nothing
	/// remains after stripping.
	pub fn view_name_from_url(&self, current: &str, fallback: &str) -> String {
		let Some(rest) = current.strip_prefix(self.root.as_str()) else {
			return fallback.to_string();
		};
		let name = rest.split(['?', '#']).next().unwrap_or_default();
		if name.is_empty() {
			fallback.to_string()
		} else {
			name.to_string()
		}
	}
}

/// Whether `raw` carries an `http(s)` scheme or is protocol-relative.
pub fn is_absolute(raw: &str) -> bool {
	let lower = raw.get(..8).unwrap_or(raw).to_ascii_lowercase();
	lower.starts_with("http://") || lower.starts_with("https://") || raw.starts_with("//")
}
