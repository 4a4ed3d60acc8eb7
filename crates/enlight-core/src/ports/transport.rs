//! Transport port (driven/secondary port)
//!
//! Delivers one serialized batch to a collector endpoint.
//!
//! ## Design Notes
//!
//! - `submit` is synchronous and returns nothing. Implementations start the
//!   delivery and return immediately; the caller never learns the outcome.
//! - There is no retry. A batch handed to `submit` is considered sent, so a
//!   failed delivery loses that batch.

use url::Url;

/// Fire-and-forget delivery of JSON batches
pub trait ITransport: Send + Sync {
    /// Posts `body` (a JSON array) to `endpoint` with
    /// `Content-Type: application/json`
    fn submit(&self, endpoint: &Url, body: String);
}
