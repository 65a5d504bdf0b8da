//! Anti-forgery token sources.
//!
//! Every action payload carries a timestamp and a token bound to it. The
//! dispatcher asks its [`TokenSource`] to merge a fresh pair into the payload
//! exactly once per action, right before sending.

use hmac::{Hmac, Mac};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::Sha256;

use crate::config::TokenFields;
use crate::error::{AjaxError, AjaxResult};

type HmacSha256 = Hmac<Sha256>;

/// A timestamp and the token bound to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityToken {
	/// Unix timestamp (seconds) the token was issued for.
	pub timestamp: i64,
	/// Opaque token value.
	pub token: String,
}

impl SecurityToken {
	/// Creates a token pair.
	pub fn new(timestamp: i64, token: impl Into<String>) -> Self {
		Self {
			timestamp,
			token: token.into(),
		}
	}

	/// Returns `data` with this token merged under `fields`.
	///
	/// Existing members with the same names are overwritten.
	pub fn merge_into(&self, fields: &TokenFields, mut data: Map<String, Value>) -> Map<String, Value> {
		data.insert(fields.timestamp.clone(), Value::from(self.timestamp));
		data.insert(fields.token.clone(), Value::from(self.token.clone()));
		data
	}
}

/// Mints token fields into action payloads.
pub trait TokenSource: Send + Sync {
	/// Returns `data` with fresh token fields merged in.
	fn mint(&self, data: Map<String, Value>) -> Map<String, Value>;
}

/// Serves the token pair the server embedded in the page.
///
/// The pair can be swapped when the server rotates it (e.g. after a
/// keep-alive refresh).
#[derive(Debug)]
pub struct StaticTokenSource {
	fields: TokenFields,
	current: RwLock<SecurityToken>,
}

impl StaticTokenSource {
	/// Creates a source serving `token` under the default field names.
	pub fn new(token: SecurityToken) -> Self {
		Self::with_fields(token, TokenFields::default())
	}

	/// Creates a source serving `token` under custom field names.
	pub fn with_fields(token: SecurityToken, fields: TokenFields) -> Self {
		Self {
			fields,
			current: RwLock::new(token),
		}
	}

	/// Replaces the served token, returning the previous one.
	pub fn replace(&self, token: SecurityToken) -> SecurityToken {
		std::mem::replace(&mut *self.current.write(), token)
	}

	/// The token currently served.
	pub fn current(&self) -> SecurityToken {
		self.current.read().clone()
	}
}

impl TokenSource for StaticTokenSource {
	fn mint(&self, data: Map<String, Value>) -> Map<String, Value> {
		self.current.read().merge_into(&self.fields, data)
	}
}

/// Mints `hex(HMAC-SHA256(site_secret, "<timestamp><session_id>"))` tokens.
///
/// Useful when the page runs next to the application and shares its site
/// secret, e.g. in server-side rendering or integration tests.
#[derive(Clone)]
pub struct HmacTokenSource {
	fields: TokenFields,
	mac: HmacSha256,
	session_id: String,
}

impl HmacTokenSource {
	/// Creates a source for `session_id` signed with `site_secret`.
	pub fn new(site_secret: &[u8], session_id: impl Into<String>) -> AjaxResult<Self> {
		if site_secret.is_empty() {
			return Err(AjaxError::config("site secret must not be empty"));
		}
		let mac = HmacSha256::new_from_slice(site_secret)
			.map_err(|e| AjaxError::config(format!("invalid site secret: {e}")))?;
		Ok(Self {
			fields: TokenFields::default(),
			mac,
			session_id: session_id.into(),
		})
	}

	/// Overrides the payload field names.
	pub fn with_fields(mut self, fields: TokenFields) -> Self {
		self.fields = fields;
		self
	}

	/// Issues the token for `timestamp`.
	pub fn issue_at(&self, timestamp: i64) -> SecurityToken {
		let mut mac = self.mac.clone();
		mac.update(timestamp.to_string().as_bytes());
		mac.update(self.session_id.as_bytes());
		SecurityToken::new(timestamp, hex::encode(mac.finalize().into_bytes()))
	}

	/// Issues the token for the current time.
	pub fn issue(&self) -> SecurityToken {
		self.issue_at(chrono::Utc::now().timestamp())
	}
}

impl std::fmt::Debug for HmacTokenSource {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("HmacTokenSource")
			.field("fields", &self.fields)
			.field("session_id", &self.session_id)
			.finish_non_exhaustive()
	}
}

impl TokenSource for HmacTokenSource {
	fn mint(&self, data: Map<String, Value>) -> Map<String, Value> {
		self.issue().merge_into(&self.fields, data)
	}
}
