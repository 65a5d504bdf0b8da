//! Completion hook types.
//!
//! Hooks are stored in option bags, moved into request tasks and invoked on
//! the runtime, so they are `Send + Sync` and cheaply cloneable.

use std::sync::Arc;

use crate::dom::Element;
use crate::error::TransportError;
use crate::transport::Response;

/// A type-safe, cloneable callback wrapper.
///
/// `Callback` wraps a function in an `Arc`, so cloning it shares the same
/// function rather than copying captured state.
///
/// ## Example
///
/// ```
/// use ajaxify_core::Callback;
///
/// let double = Callback::new(|x: i32| x * 2);
/// assert_eq!(double.call(21), 42);
/// ```
pub struct Callback<Args, Ret = ()> {
	inner: Arc<dyn Fn(Args) -> Ret + Send + Sync + 'static>,
}

impl<Args, Ret> Callback<Args, Ret> {
	/// Creates a new Callback from a function or closure.
	pub fn new<F>(f: F) -> Self
	where
		F: Fn(Args) -> Ret + Send + Sync + 'static,
	{
		Self { inner: Arc::new(f) }
	}

	/// Calls the callback with the given arguments.
	pub fn call(&self, args: Args) -> Ret {
		(self.inner)(args)
	}

	/// Whether two handles point at the same function.
	pub fn ptr_eq(&self, other: &Self) -> bool {
		Arc::ptr_eq(&self.inner, &other.inner)
	}
}

impl<Args, Ret> Clone for Callback<Args, Ret> {
	fn clone(&self) -> Self {
		Self {
			inner: Arc::clone(&self.inner),
		}
	}
}

impl<Args, Ret> std::fmt::Debug for Callback<Args, Ret> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Callback")
			.field("inner", &"<function>")
			.finish()
	}
}

/// Hook run with the completed response.
pub type SuccessHandler = Callback<Response>;

/// Hook run with the transport failure.
pub type ErrorHandler = Callback<TransportError>;

/// Handler the host UI invokes with the element an event fired on.
pub type ElementHandler = Callback<Element>;
