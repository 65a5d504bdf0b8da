//! Partial-view loading and in-place refresh.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::{debug, info, warn};

use crate::dispatch::{Ajax, PendingRequest};
use crate::dom::{Dom, Element, Manipulation};
use crate::error::{AjaxError, AjaxResult};
use crate::options::{CallArguments, CallOptions, OptionValue};
use crate::transport::Response;
use crate::url::is_absolute;

/// Path prefix of the fragment endpoint.
pub const VIEW_PREFIX: &str = "ajax/view/";

/// Fetches server-rendered fragments and places them into the page.
#[derive(Clone)]
pub struct FragmentLoader {
	ajax: Ajax,
	dom: Arc<dyn Dom>,
}

impl std::fmt::Debug for FragmentLoader {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("FragmentLoader")
			.field("ajax", &self.ajax)
			.finish_non_exhaustive()
	}
}

impl FragmentLoader {
	/// Creates a loader dispatching through `ajax` and writing into `dom`.
	pub fn new(ajax: Ajax, dom: Arc<dyn Dom>) -> Self {
		Self { ajax, dom }
	}

	/// The dispatcher used for fetching.
	pub fn ajax(&self) -> &Ajax {
		&self.ajax
	}

	/// Fetches view `name` from `ajax/view/<name>`.
	///
	/// Without a `success` hook the markup is placed into the bag's `target`
	/// using `manipulationMethod` (replace by default).
	///
	/// # Errors
	///
	/// [`AjaxError::InvalidArgument`] when the name is missing, empty or an
	/// absolute URL outside the application, or when neither `success` nor
	/// `target` is given.
	pub fn load_view(&self, args: impl Into<CallArguments>) -> AjaxResult<PendingRequest> {
		let (name, mut bag) = args.into().into_parts();
		let name = match name {
			Some(name) if !name.is_empty() => name,
			_ => return Err(AjaxError::invalid_argument("view name must be a non-empty string")),
		};

		let resolver = self.ajax.resolver();
		let name = if resolver.is_internal(&name) {
			resolver.strip_root(&name).to_string()
		} else if is_absolute(&name) {
			return Err(AjaxError::invalid_argument(format!(
				"view {name:?} is outside the application"
			)));
		} else {
			name
		};

		if !matches!(bag.get("success"), Some(OptionValue::Success(_))) {
			let target = match bag.get_value("target") {
				Some(Value::String(target)) if !target.is_empty() => Element::new(target.as_str()),
				_ => {
					return Err(AjaxError::invalid_argument(
						"a target is required when no success hook is given",
					));
				}
			};
			let manipulation = match bag.get_value("manipulationMethod") {
				Some(Value::String(raw)) => raw.parse()?,
				_ => Manipulation::default(),
			};

			let dom = Arc::clone(&self.dom);
			bag = bag.success(move |response: Response| {
				dom.insert(&target, &response.raw, manipulation);
			});
		}

		self.ajax.get((format!("{VIEW_PREFIX}{name}"), bag))
	}

	/// Re-fetches the current page and replaces the contents of `selector`
	/// with the matching part of the fresh markup.
	pub fn refresh(&self, selector: &str) -> AjaxResult<PendingRequest> {
		let dom = Arc::clone(&self.dom);
		let target = Element::new(selector);
		let selector = selector.to_string();

		let bag = CallOptions::new().success(move |response: Response| {
			match dom.extract(&response.raw, &selector) {
				Some(markup) => dom.insert(&target, &markup, Manipulation::Html),
				None => debug!(selector = %selector, "refreshed page has no matching element"),
			}
		});

		self.ajax.get((self.dom.location(), bag))
	}

	/// Refreshes `selector` every `every`, starting one interval from now.
	///
	/// Ticks are not coalesced and never wait for the previous refresh.
	///
	/// # Errors
	///
	/// [`AjaxError::InvalidArgument`] for a zero interval,
	/// [`AjaxError::NoRuntime`] outside a tokio runtime.
	pub fn start_polling(&self, selector: impl Into<String>, every: Duration) -> AjaxResult<PollHandle> {
		if every.is_zero() {
			return Err(AjaxError::invalid_argument("polling interval must be positive"));
		}
		let runtime = Handle::try_current().map_err(|_| AjaxError::NoRuntime)?;

		let selector = selector.into();
		let loader = self.clone();
		let polled = selector.clone();

		info!(selector = %selector, interval = ?every, "polling started");

		let task = runtime.spawn(async move {
			let Some(start) = Instant::now().checked_add(every) else {
				// First tick lies beyond the clock's range
				return std::future::pending::<()>().await;
			};
			let mut ticker = interval_at(start, every);
			ticker.set_missed_tick_behavior(MissedTickBehavior::Burst);
			loop {
				ticker.tick().await;
				if let Err(e) = loader.refresh(&polled) {
					warn!(selector = %polled, error = %e, "refresh failed");
				}
			}
		});

		Ok(PollHandle {
			selector,
			task,
			stopped: false,
		})
	}
}

/// Running poll started by [`FragmentLoader::start_polling`].
///
/// Polling stops on [`PollHandle::stop`] or when the handle is dropped.
/// Refreshes already issued still complete.
#[derive(Debug)]
pub struct PollHandle {
	selector: String,
	task: JoinHandle<()>,
	stopped: bool,
}

impl PollHandle {
	/// Selector being refreshed.
	pub fn selector(&self) -> &str {
		&self.selector
	}

	/// Whether polling is still scheduled.
	pub fn is_active(&self) -> bool {
		!self.stopped && !self.task.is_finished()
	}

	/// Stops scheduling refreshes.
	pub fn stop(&mut self) {
		if self.stopped {
			return;
		}
		self.stopped = true;
		self.task.abort();
		info!(selector = %self.selector, "polling stopped");
	}
}

impl Drop for PollHandle {
	fn drop(&mut self) {
		self.stop();
	}
}
