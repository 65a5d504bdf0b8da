//! Reqwest transport tests against a local axum server.

use std::sync::Arc;
use std::time::Duration;

use ajaxify_core::testing::RecordingNotifier;
use ajaxify_core::{
	Ajax, AjaxConfig, CallOptions, DataType, Method, SecurityToken, Transport, TransportError,
	TransportRequest,
};
use ajaxify_http::ReqwestTransport;
use axum::Json;
use axum::Router;
use axum::extract::RawQuery;
use axum::http::{HeaderMap, StatusCode};
use axum::response::Html;
use axum::routing::{get, post};
use rstest::rstest;
use serde_json::{Map, Value, json};

fn header(headers: &HeaderMap, name: &str) -> Value {
	headers
		.get(name)
		.and_then(|v| v.to_str().ok())
		.map_or(Value::Null, Value::from)
}

async fn echo_query(RawQuery(query): RawQuery, headers: HeaderMap) -> Json<Value> {
	Json(json!({
		"query": query,
		"requested_with": header(&headers, "x-requested-with"),
		"accept": header(&headers, "accept"),
		"custom": header(&headers, "x-custom"),
	}))
}

async fn echo_form(headers: HeaderMap, body: String) -> Json<Value> {
	Json(json!({
		"body": body,
		"content_type": header(&headers, "content-type"),
	}))
}

async fn action(body: String) -> Json<Value> {
	Json(json!({
		"system_messages": {"success": ["Liked"]},
		"output": body,
	}))
}

async fn slow() -> &'static str {
	tokio::time::sleep(Duration::from_secs(2)).await;
	"late"
}

async fn spawn_server() -> String {
	let app = Router::new()
		.route("/echo", get(echo_query).post(echo_form))
		.route("/page", get(|| async { Html("<li>fragment</li>") }))
		.route("/forbidden", get(|| async { (StatusCode::FORBIDDEN, "nope") }))
		.route("/slow", get(slow))
		.route("/action/likes/add", post(action));

	let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
	let addr = listener.local_addr().unwrap();
	tokio::spawn(async move {
		axum::serve(listener, app).await.unwrap();
	});
	format!("http://{addr}")
}

fn request(url: String, method: Method, data: Value) -> TransportRequest {
	let data = match data {
		Value::Object(map) => map,
		_ => Map::new(),
	};
	TransportRequest {
		url,
		method,
		data,
		data_type: None,
		extra: Map::new(),
	}
}

fn body_json(body: &str) -> Value {
	serde_json::from_str(body).unwrap()
}

#[rstest]
#[tokio::test]
async fn test_get_sends_query_and_headers() {
	let base = spawn_server().await;
	let mut req = request(
		format!("{base}/echo"),
		Method::Get,
		json!({"guid": 42, "tags": ["a", "b"]}),
	);
	req.data_type = Some(DataType::Json);

	let response = ReqwestTransport::new().execute(req).await.unwrap();
	let echoed = body_json(&response.body);

	assert_eq!(response.status, 200);
	assert!(response.content_type.unwrap().contains("application/json"));
	let query = echoed["query"].as_str().unwrap();
	assert!(query.contains("guid=42"));
	assert!(query.contains("tags%5B%5D=a"));
	assert!(query.contains("tags%5B%5D=b"));
	assert_eq!(echoed["requested_with"], "XMLHttpRequest");
	assert_eq!(echoed["accept"], DataType::Json.accept());
}

#[rstest]
#[tokio::test]
async fn test_post_sends_form_body() {
	let base = spawn_server().await;
	let req = request(
		format!("{base}/echo"),
		Method::Post,
		json!({"title": "a b", "meta": {"x": 1}}),
	);

	let response = ReqwestTransport::new().execute(req).await.unwrap();
	let echoed = body_json(&response.body);

	assert_eq!(echoed["content_type"], "application/x-www-form-urlencoded");
	let body = echoed["body"].as_str().unwrap();
	assert!(body.contains("title=a+b"));
	assert!(body.contains("meta%5Bx%5D=1"));
}

#[rstest]
#[tokio::test]
async fn test_markup_is_returned_verbatim() {
	let base = spawn_server().await;
	let response = ReqwestTransport::new()
		.execute(request(format!("{base}/page"), Method::Get, json!({})))
		.await
		.unwrap();

	assert_eq!(response.body, "<li>fragment</li>");
	assert!(response.content_type.unwrap().starts_with("text/html"));
}

#[rstest]
#[tokio::test]
async fn test_non_success_status_is_status_error() {
	let base = spawn_server().await;
	let err = ReqwestTransport::new()
		.execute(request(format!("{base}/forbidden"), Method::Get, json!({})))
		.await
		.unwrap_err();

	assert_eq!(
		err,
		TransportError::status(403, "Forbidden", "nope")
	);
}

#[rstest]
#[tokio::test]
async fn test_connection_failure_is_network_error() {
	let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
	let addr = listener.local_addr().unwrap();
	drop(listener);

	let err = ReqwestTransport::new()
		.execute(request(format!("http://{addr}/echo"), Method::Get, json!({})))
		.await
		.unwrap_err();
	assert!(matches!(err, TransportError::Network(_)));
}

#[rstest]
#[tokio::test]
async fn test_extra_timeout_and_headers() {
	let base = spawn_server().await;
	let transport = ReqwestTransport::new();

	let mut req = request(format!("{base}/slow"), Method::Get, json!({}));
	req.extra.insert("timeout".to_string(), json!(100));
	assert!(matches!(
		transport.execute(req).await,
		Err(TransportError::Network(_))
	));

	let mut req = request(format!("{base}/echo"), Method::Get, json!({}));
	req.extra
		.insert("headers".to_string(), json!({"X-Custom": "yes"}));
	let echoed = body_json(&transport.execute(req).await.unwrap().body);
	assert_eq!(echoed["custom"], "yes");
}

#[rstest]
#[tokio::test]
async fn test_signed_action_end_to_end() {
	let base = spawn_server().await;
	let notifier = Arc::new(RecordingNotifier::new());
	let ajax = Ajax::builder(AjaxConfig::new(&base).unwrap())
		.transport(Arc::new(ReqwestTransport::new()))
		.static_token(SecurityToken::new(1700000000, "abc"))
		.notifier(notifier.clone())
		.build()
		.unwrap();

	let response = ajax
		.action(("likes/add", CallOptions::new().with("guid", 42)))
		.unwrap()
		.wait()
		.await
		.unwrap();

	let document = response.body.as_json().unwrap();
	let sent = document["output"].as_str().unwrap();
	assert!(sent.contains("guid=42"));
	assert!(sent.contains("__elgg_ts=1700000000"));
	assert!(sent.contains("__elgg_token=abc"));
	assert_eq!(notifier.successes(), vec!["Liked".to_string()]);
}
