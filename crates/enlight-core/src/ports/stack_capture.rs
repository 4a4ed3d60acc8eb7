//! Stack-capture port (driving/primary port)
//!
//! A stack-capture collaborator converts a raised error into an ordered
//! list of call frames and dispatches the result to every registered
//! subscriber. It may also watch for uncaught errors on its own and
//! dispatch those.
//!
//! ## Design Notes
//!
//! - Subscription is explicit: the agent registers exactly one handler at
//!   initialization through [`IStackCapture::on_error`].
//! - [`IStackCapture::report`] may "rethrow" by returning the exception in
//!   `Err`. Callers compare identity with [`Arc::ptr_eq`] to tell a rethrow
//!   of the captured exception apart from a new failure.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::domain::RawError;

/// A raised error whose identity is its allocation
pub type Exception = Arc<dyn std::error::Error + Send + Sync + 'static>;

/// Subscriber invoked for every captured error
pub type ErrorHandler = Arc<dyn Fn(RawError) + Send + Sync + 'static>;

/// Options passed through to the collaborator at initialization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureOptions {
    /// Dispatch uncaught errors automatically
    pub collect_uncaught: bool,
    /// Fetch source files to fill in frame context
    pub source_fetching: bool,
    /// Number of context lines gathered around each frame's line
    pub context_lines: u32,
}

impl Default for CaptureOptions {
    fn default() -> Self {
        Self {
            collect_uncaught: false,
            source_fetching: true,
            context_lines: 11,
        }
    }
}

/// Stack-capture collaborator
pub trait IStackCapture: Send + Sync {
    /// Applies pass-through options
    fn configure(&self, options: &CaptureOptions);

    /// Registers a subscriber for captured errors
    fn on_error(&self, handler: ErrorHandler);

    /// Extracts frames from `exception` and notifies subscribers
    ///
    /// # Returns
    /// `Err` carrying whatever the collaborator raised while doing so,
    /// which may be `exception` itself.
    fn report(&self, exception: Exception) -> Result<(), Exception>;
}
