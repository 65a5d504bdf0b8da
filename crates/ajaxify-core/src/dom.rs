//! DOM collaborator seam.
//!
//! Only the fragment loader and the UI bindings touch the page. They do so
//! through [`Dom`], which the host implements over its real document (or a
//! test double, see [`testing::MockDom`](crate::testing::MockDom)).

use std::fmt;
use std::str::FromStr;

use crate::error::AjaxError;

/// Opaque handle to an element, understood by the [`Dom`] implementation.
///
/// Hosts typically use a CSS selector that uniquely identifies the element.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Element(String);

impl Element {
	/// Wraps a handle string.
	pub fn new(handle: impl Into<String>) -> Self {
		Self(handle.into())
	}

	/// Returns the handle string.
	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for Element {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl From<&str> for Element {
	fn from(handle: &str) -> Self {
		Self::new(handle)
	}
}

impl From<String> for Element {
	fn from(handle: String) -> Self {
		Self(handle)
	}
}

impl From<&Element> for Element {
	fn from(element: &Element) -> Self {
		element.clone()
	}
}

/// How fetched markup is placed into its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Manipulation {
	/// Replace the target's contents.
	#[default]
	Html,
	/// Insert after the target's existing children.
	Append,
	/// Insert before the target's existing children.
	Prepend,
}

impl Manipulation {
	/// Name as accepted in option bags.
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Html => "html",
			Self::Append => "append",
			Self::Prepend => "prepend",
		}
	}
}

impl FromStr for Manipulation {
	type Err = AjaxError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"html" => Ok(Self::Html),
			"append" => Ok(Self::Append),
			"prepend" => Ok(Self::Prepend),
			other => Err(AjaxError::invalid_argument(format!(
				"unsupported manipulationMethod {other:?}"
			))),
		}
	}
}

/// Page access needed by fragment loading and UI bindings.
pub trait Dom: Send + Sync {
	/// Absolute URL of the current page.
	fn location(&self) -> String;

	/// Reads an attribute of `element`.
	fn attribute(&self, element: &Element, name: &str) -> Option<String>;

	/// First descendant of `element` matching `selector`.
	fn find(&self, element: &Element, selector: &str) -> Option<Element>;

	/// Nearest ancestor of `element` (itself included) matching `selector`.
	fn closest(&self, element: &Element, selector: &str) -> Option<Element>;

	/// Places `markup` into `target`.
	fn insert(&self, target: &Element, markup: &str, manipulation: Manipulation);

	/// Hides `element` (the host may animate this).
	fn hide(&self, element: &Element);

	/// Parses `markup` and returns the inner markup of the first element
	/// matching `selector`.
	fn extract(&self, markup: &str, selector: &str) -> Option<String>;
}
