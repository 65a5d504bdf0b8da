//! Payload flattening for query strings and form bodies.
//!
//! Nested members use bracket notation, which PHP-style backends decode back
//! into nested arrays:
//!
//! ```text
//! {"a": {"b": 1}, "tags": ["x", "y"]}  =>  a[b]=1&tags[]=x&tags[]=y
//! ```

use serde_json::{Map, Value};

/// Flattens `data` into `(name, value)` pairs in member order.
pub fn encode_pairs(data: &Map<String, Value>) -> Vec<(String, String)> {
	let mut pairs = Vec::new();
	for (key, value) in data {
		push_value(&mut pairs, key.clone(), value);
	}
	pairs
}

fn push_value(pairs: &mut Vec<(String, String)>, name: String, value: &Value) {
	match value {
		Value::Object(members) => {
			for (key, member) in members {
				push_value(pairs, format!("{name}[{key}]"), member);
			}
		}
		Value::Array(items) => {
			for (index, item) in items.iter().enumerate() {
				// Scalars use the short form, nested items need an index
				let item_name = if is_scalar(item) {
					format!("{name}[]")
				} else {
					format!("{name}[{index}]")
				};
				push_value(pairs, item_name, item);
			}
		}
		scalar => pairs.push((name, scalar_text(scalar))),
	}
}

fn is_scalar(value: &Value) -> bool {
	!matches!(value, Value::Object(_) | Value::Array(_))
}

fn scalar_text(value: &Value) -> String {
	match value {
		Value::Null => String::new(),
		Value::String(s) => s.clone(),
		other => other.to_string(),
	}
}
