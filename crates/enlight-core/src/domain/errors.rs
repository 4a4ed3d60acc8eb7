//! Domain error types
//!
//! Errors raised while reading captured input or building collector
//! endpoints. None of them abort a capture: callers degrade and continue.

use thiserror::Error;

/// Errors that can occur in domain operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A frame's source context is not a sequence of strings
    #[error("Malformed frame context at index {index}: {reason}")]
    MalformedContext {
        /// Position of the offending line within the context (or 0 for the container)
        index: usize,
        /// What was found instead of a string line
        reason: String,
    },

    /// The collector server URL cannot be parsed or has an unsupported scheme
    #[error("Invalid server URL: {0}")]
    InvalidServer(String),

    /// The configured page URL cannot be parsed
    #[error("Invalid page URL: {0}")]
    InvalidPageUrl(String),
}
