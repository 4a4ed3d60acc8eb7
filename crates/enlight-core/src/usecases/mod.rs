//! Use cases (interactors) for Enlight
//!
//! Pure transformations from captured input to canonical wire entries.
//! Buffering and delivery are left to the agent.
//!
//! ## Use Cases
//!
//! - [`ReportNormalizer`] - Captured error to [`Report`](crate::domain::Report)
//! - [`LogNormalizer`] - Log call to [`LogEntry`](crate::domain::LogEntry)

pub mod normalize_log;
pub mod normalize_report;

pub use normalize_log::LogNormalizer;
pub use normalize_report::{NormalizedReport, ReportNormalizer};

use chrono::{SecondsFormat, Utc};

/// Current time as an ISO-8601 UTC timestamp with millisecond precision,
/// e.g. `2026-01-15T10:00:00.000Z`
pub(crate) fn timestamp_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
