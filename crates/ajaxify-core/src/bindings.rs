//! Handlers behind the page's ajaxified menu items.
//!
//! [`ActionDispatcher`] turns clicks on like and delete menu items into
//! actions. The host hands [`ActionDispatcher::register`] a [`UiRegistry`]
//! once at startup and routes element events to the handlers it receives.

use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde_json::json;
use tracing::warn;

use crate::callback::{Callback, ElementHandler};
use crate::dispatch::{Ajax, PendingRequest};
use crate::dom::{Dom, Element};
use crate::error::{AjaxError, AjaxResult};
use crate::fragment::FragmentLoader;
use crate::options::CallOptions;
use crate::transport::Response;

/// Menu item toggling a like.
pub const LIKES_MENU_ITEM: &str = ".elgg-menu-item-likes";

/// Menu item deleting an entity.
pub const DELETE_MENU_ITEM: &str = ".elgg-menu-item-delete";

/// River entries carry `id="item-river-<id>"`.
pub const RIVER_ITEM_SELECTOR: &str = "[id^=\"item-river-\"]";

/// View re-rendering a single river entry.
pub const RIVER_ITEM_VIEW: &str = "river/getitem";

static GUID_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"guid=(\d+)").unwrap());
static RIVER_ID_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"item-river-(\d+)").unwrap());

/// Event wiring supplied by the host UI.
pub trait UiRegistry {
	/// Calls `handler` with the element whenever an element matching
	/// `selector` is clicked.
	fn on_click(&mut self, selector: &str, handler: ElementHandler);
}

/// Dispatches actions for menu items.
#[derive(Clone)]
pub struct ActionDispatcher {
	loader: FragmentLoader,
	dom: Arc<dyn Dom>,
}

impl std::fmt::Debug for ActionDispatcher {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ActionDispatcher")
			.field("loader", &self.loader)
			.finish_non_exhaustive()
	}
}

impl ActionDispatcher {
	/// Creates a dispatcher acting through `ajax` on `dom`.
	pub fn new(ajax: Ajax, dom: Arc<dyn Dom>) -> Self {
		Self {
			loader: FragmentLoader::new(ajax, Arc::clone(&dom)),
			dom,
		}
	}

	/// The fragment loader used to re-render entries.
	pub fn loader(&self) -> &FragmentLoader {
		&self.loader
	}

	/// The `href` of the menu item's anchor.
	pub fn url_from_menu_item(&self, item: &Element) -> AjaxResult<String> {
		let anchor = self
			.dom
			.find(item, "a")
			.ok_or_else(|| AjaxError::MissingElement(format!("{item} a")))?;
		self.dom
			.attribute(&anchor, "href")
			.ok_or_else(|| AjaxError::MissingAttribute {
				element: anchor.to_string(),
				attribute: "href".to_string(),
			})
	}

	/// The entity GUID in the menu item's anchor `href`.
	pub fn guid_from_menu_item(&self, item: &Element) -> AjaxResult<i64> {
		let url = self.url_from_menu_item(item)?;
		capture_id(&GUID_PATTERN, &url)
	}

	/// Runs the like toggle behind `item`, then re-renders its river entry.
	pub fn toggle_like(&self, item: &Element) -> AjaxResult<PendingRequest> {
		let url = self.url_from_menu_item(item)?;
		let river_item = self
			.dom
			.closest(item, RIVER_ITEM_SELECTOR)
			.ok_or_else(|| AjaxError::MissingElement(format!("river item around {item}")))?;
		let id_attr = self
			.dom
			.attribute(&river_item, "id")
			.ok_or_else(|| AjaxError::MissingAttribute {
				element: river_item.to_string(),
				attribute: "id".to_string(),
			})?;
		let river_id = capture_id(&RIVER_ID_PATTERN, &id_attr)?;

		let loader = self.loader.clone();
		let bag = CallOptions::new().success(move |_: Response| {
			let view = CallOptions::new()
				.data(json!({ "id": river_id }))
				.target(&river_item);
			if let Err(e) = loader.load_view((RIVER_ITEM_VIEW, view)) {
				warn!(river_id, error = %e, "could not re-render river item");
			}
		});

		self.loader.ajax().action((url, bag))
	}

	/// Hides the entity's listing and deletes it.
	///
	/// GUIDs below 1 are ignored (`Ok(None)`, nothing touched).
	pub fn delete_entity(&self, guid: i64) -> AjaxResult<Option<PendingRequest>> {
		if guid < 1 {
			return Ok(None);
		}
		let pending = self
			.loader
			.ajax()
			.action(("entity/delete", CallOptions::new().with("guid", guid)))?;
		self.dom.hide(&Element::new(format!("#elgg-object-{guid}")));
		Ok(Some(pending))
	}

	/// Wires the like and delete menu items.
	pub fn register(&self, ui: &mut dyn UiRegistry) {
		let likes = self.clone();
		ui.on_click(
			LIKES_MENU_ITEM,
			Callback::new(move |item: Element| {
				if let Err(e) = likes.toggle_like(&item) {
					warn!(item = %item, error = %e, "like toggle not dispatched");
				}
			}),
		);

		let delete = self.clone();
		ui.on_click(
			DELETE_MENU_ITEM,
			Callback::new(move |item: Element| {
				let outcome = delete
					.guid_from_menu_item(&item)
					.and_then(|guid| delete.delete_entity(guid));
				if let Err(e) = outcome {
					warn!(item = %item, error = %e, "delete not dispatched");
				}
			}),
		);
	}
}

fn capture_id(pattern: &Regex, input: &str) -> AjaxResult<i64> {
	pattern
		.captures(input)
		.and_then(|caps| caps.get(1))
		.and_then(|m| m.as_str().parse().ok())
		.ok_or_else(|| AjaxError::MissingIdentifier {
			pattern: pattern.as_str().to_string(),
			input: input.to_string(),
		})
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case(&*GUID_PATTERN, "http://site.test/action/likes/add?guid=42&__elgg_ts=1", 42)]
	#[case(&*RIVER_ID_PATTERN, "elgg-item item-river-913", 913)]
	fn test_capture_id(#[case] pattern: &Regex, #[case] input: &str, #[case] expected: i64) {
		assert_eq!(capture_id(pattern, input).unwrap(), expected);
	}

	#[rstest]
	fn test_capture_id_fails_loudly() {
		let err = capture_id(&GUID_PATTERN, "http://site.test/action/likes/add").unwrap_err();
		assert!(matches!(err, AjaxError::MissingIdentifier { .. }));
	}
}
