//! Enlight Agent - Batching and delivery of error reports and log entries
//!
//! Provides:
//! - `Agent`: The host-facing facade (`init`, `set_context`, `capture_error`, `log`, `flush`)
//! - `DualBuffer`: Independent FIFO buffers for reports and log entries
//! - `FlushScheduler`: Cancellable recurring flush task
//! - `HttpTransport`: Fire-and-forget JSON POST delivery
//! - `PanicCapture`: Panic-hook and backtrace based stack capture
//! - `EnlightLayer`: `tracing` layer forwarding application events as log entries
//! - `AgentMetrics`: Prometheus counters for captured and submitted entries
//!
//! ## Delivery guarantee
//!
//! Buffered telemetry survives until the next flush and the transport call
//! that follows it. Delivery is neither confirmed nor retried: a batch that
//! fails in transit is lost.

pub mod agent;
pub mod buffer;
pub mod capture;
pub mod layer;
pub mod metrics;
pub mod scheduler;
pub mod transport;

pub use agent::{Agent, FlushOutcome, Pending};
pub use buffer::{DualBuffer, EntryBuffer};
pub use capture::PanicCapture;
pub use layer::EnlightLayer;
pub use metrics::AgentMetrics;
pub use scheduler::{FlushHandle, FlushScheduler, MIN_SEND_INTERVAL};
pub use transport::HttpTransport;

use enlight_core::config::ValidationError;
use enlight_core::domain::DomainError;
use thiserror::Error;

/// Errors that can occur while setting up the agent
#[derive(Debug, Error)]
pub enum AgentError {
    /// The configuration failed validation
    #[error("Invalid configuration: {}", join_errors(.0))]
    InvalidConfig(Vec<ValidationError>),

    /// An endpoint or page URL could not be built
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    /// Periodic flushing was requested outside a Tokio runtime
    #[error("Periodic flushing requires a running Tokio runtime")]
    NoRuntime,

    /// The metrics registry could not be created
    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    /// The HTTP client could not be built
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
