//! Domain entities and wire schema
//!
//! This module contains the core domain types for Enlight:
//! - Ambient context merged into every report and log entry
//! - Raw captured errors as delivered by a stack-capture collaborator
//! - Canonical report and traceback types sent to the collector
//! - Canonical log entries
//! - Collector endpoint URLs
//! - Domain-specific error types

pub mod context;
pub mod endpoints;
pub mod errors;
pub mod log_entry;
pub mod raw_error;
pub mod report;

// Re-export commonly used types
pub use context::Context;
pub use endpoints::Endpoints;
pub use errors::DomainError;
pub use log_entry::LogEntry;
pub use raw_error::{ErrorMode, RawError, RawFrame};
pub use report::{Report, TracebackLine};
