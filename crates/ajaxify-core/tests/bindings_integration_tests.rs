//! Menu-item binding tests
//!
//! Like toggles, entity deletion and handler registration over the page
//! doubles.

use std::sync::Arc;

use ajaxify_core::bindings::{DELETE_MENU_ITEM, LIKES_MENU_ITEM, RIVER_ITEM_SELECTOR};
use ajaxify_core::testing::{FixedTokenSource, MockDom, MockTransport, MockUi};
use ajaxify_core::{
	ActionDispatcher, Ajax, AjaxConfig, AjaxError, Element, Manipulation, Method,
	TransportResponse,
};
use rstest::rstest;
use serde_json::json;

const LIKE_URL: &str = "http://site.test/action/likes/add?guid=42&__elgg_ts=1&__elgg_token=t";
const DELETE_URL: &str = "http://site.test/action/entity/delete?guid=42";

fn page() -> MockDom {
	MockDom::new()
		.with_descendant("#like-item", "a", "#like-link")
		.with_attribute("#like-link", "href", LIKE_URL)
		.with_ancestor("#like-item", RIVER_ITEM_SELECTOR, "#item-river-913")
		.with_attribute("#item-river-913", "id", "item-river-913")
		.with_descendant("#delete-item", "a", "#delete-link")
		.with_attribute("#delete-link", "href", DELETE_URL)
}

fn setup(dom: MockDom) -> (ActionDispatcher, Arc<MockTransport>, Arc<MockDom>) {
	let transport = Arc::new(MockTransport::new());
	transport.respond("ajax/view/river/getitem", TransportResponse::html("<li>liked</li>"));

	let ajax = Ajax::builder(AjaxConfig::new("http://site.test/").unwrap())
		.transport(transport.clone())
		.tokens(Arc::new(FixedTokenSource::default()))
		.build()
		.unwrap();
	let dom = Arc::new(dom);
	(ActionDispatcher::new(ajax, dom.clone()), transport, dom)
}

async fn settle(until: impl Fn() -> bool) {
	for _ in 0..100 {
		if until() {
			return;
		}
		tokio::task::yield_now().await;
	}
}

// ============================================================================
// Identifier extraction
// ============================================================================

/// Tests reading the action URL and GUID from a menu item
#[rstest]
fn test_menu_item_identifiers() {
	let (bindings, _, _) = setup(page());

	assert_eq!(
		bindings.url_from_menu_item(&Element::from("#like-item")).unwrap(),
		LIKE_URL
	);
	assert_eq!(
		bindings.guid_from_menu_item(&Element::from("#delete-item")).unwrap(),
		42
	);
}

/// Tests that missing anchors, attributes and identifiers fail loudly
#[rstest]
fn test_menu_item_extraction_errors() {
	let dom = MockDom::new()
		.with_descendant("#no-href", "a", "#bare-link")
		.with_descendant("#no-guid", "a", "#plain-link")
		.with_attribute("#plain-link", "href", "http://site.test/blog/all");
	let (bindings, _, _) = setup(dom);

	assert!(matches!(
		bindings.url_from_menu_item(&Element::from("#missing")),
		Err(AjaxError::MissingElement(_))
	));
	assert!(matches!(
		bindings.url_from_menu_item(&Element::from("#no-href")),
		Err(AjaxError::MissingAttribute { .. })
	));
	assert!(matches!(
		bindings.guid_from_menu_item(&Element::from("#no-guid")),
		Err(AjaxError::MissingIdentifier { .. })
	));
}

// ============================================================================
// Likes
// ============================================================================

/// Tests that a like posts the action then re-renders the river item
#[rstest]
#[tokio::test]
async fn test_toggle_like_rerenders_river_item() {
	let (bindings, transport, dom) = setup(page());

	bindings
		.toggle_like(&Element::from("#like-item"))
		.unwrap()
		.wait()
		.await
		.unwrap();
	settle(|| dom.inserts().len() == 1).await;

	let requests = transport.requests();
	assert_eq!(requests.len(), 2);
	assert_eq!(requests[0].url, LIKE_URL);
	assert_eq!(requests[0].method, Method::Post);
	assert_eq!(requests[1].url, "http://site.test/ajax/view/river/getitem");
	assert_eq!(requests[1].data.get("id"), Some(&json!(913)));

	let inserts = dom.inserts();
	assert_eq!(inserts[0].target, Element::from("#item-river-913"));
	assert_eq!(inserts[0].markup, "<li>liked</li>");
	assert_eq!(inserts[0].manipulation, Manipulation::Html);
}

/// Tests that a like outside a river item dispatches nothing
#[rstest]
#[tokio::test]
async fn test_toggle_like_without_river_item() {
	let dom = MockDom::new()
		.with_descendant("#orphan", "a", "#orphan-link")
		.with_attribute("#orphan-link", "href", LIKE_URL);
	let (bindings, transport, _) = setup(dom);

	assert!(matches!(
		bindings.toggle_like(&Element::from("#orphan")),
		Err(AjaxError::MissingElement(_))
	));
	tokio::task::yield_now().await;
	assert_eq!(transport.request_count(), 0);
}

/// Tests that a malformed river id dispatches nothing
#[rstest]
#[tokio::test]
async fn test_toggle_like_with_bad_river_id() {
	let dom = MockDom::new()
		.with_descendant("#like", "a", "#link")
		.with_attribute("#link", "href", LIKE_URL)
		.with_ancestor("#like", RIVER_ITEM_SELECTOR, "#item-river-x")
		.with_attribute("#item-river-x", "id", "item-river-x");
	let (bindings, transport, _) = setup(dom);

	assert!(matches!(
		bindings.toggle_like(&Element::from("#like")),
		Err(AjaxError::MissingIdentifier { .. })
	));
	assert_eq!(transport.request_count(), 0);
}

// ============================================================================
// Deletion
// ============================================================================

/// Tests that non-positive GUIDs are ignored
#[rstest]
#[case(0)]
#[case(-5)]
#[tokio::test]
async fn test_delete_entity_ignores_non_positive(#[case] guid: i64) {
	let (bindings, transport, dom) = setup(page());

	assert!(bindings.delete_entity(guid).unwrap().is_none());
	tokio::task::yield_now().await;
	assert_eq!(transport.request_count(), 0);
	assert!(dom.hidden().is_empty());
}

/// Tests that deletion hides the listing and sends one delete action
#[rstest]
#[tokio::test]
async fn test_delete_entity() {
	let (bindings, transport, dom) = setup(page());

	let pending = bindings.delete_entity(42).unwrap().unwrap();
	pending.wait().await.unwrap();

	let requests = transport.requests();
	assert_eq!(requests.len(), 1);
	assert_eq!(requests[0].url, "http://site.test/action/entity/delete");
	assert_eq!(requests[0].data.get("guid"), Some(&json!(42)));
	assert_eq!(dom.hidden(), vec![Element::from("#elgg-object-42")]);
}

// ============================================================================
// Registration
// ============================================================================

/// Tests that both menu items are wired and clicks dispatch
#[rstest]
#[tokio::test]
async fn test_register_wires_menu_items() {
	let (bindings, transport, dom) = setup(page());
	let mut ui = MockUi::new();
	bindings.register(&mut ui);

	assert_eq!(ui.selectors(), vec![DELETE_MENU_ITEM, LIKES_MENU_ITEM]);

	assert!(ui.click(DELETE_MENU_ITEM, "#delete-item"));
	settle(|| transport.request_count() == 1).await;
	assert_eq!(dom.hidden(), vec![Element::from("#elgg-object-42")]);

	assert!(ui.click(LIKES_MENU_ITEM, "#like-item"));
	settle(|| dom.inserts().len() == 1).await;
	assert_eq!(transport.request_count(), 3);

	assert!(!ui.click(".elgg-menu-item-unknown", "#x"));
}

/// Tests that a click on a broken item is swallowed
#[rstest]
#[tokio::test]
async fn test_click_on_broken_item_dispatches_nothing() {
	let (bindings, transport, _) = setup(MockDom::new());
	let mut ui = MockUi::new();
	bindings.register(&mut ui);

	assert!(ui.click(DELETE_MENU_ITEM, "#nothing"));
	tokio::task::yield_now().await;
	assert_eq!(transport.request_count(), 0);
}
