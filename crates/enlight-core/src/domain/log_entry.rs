//! Canonical log entries
//!
//! The wire representation of one explicit application log statement, as
//! accepted by the `/api/logs` collector endpoint.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Canonical log entry sent to the collector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Uppercased level name, e.g. `ERROR`
    pub log_level: String,
    pub message: String,
    /// ISO-8601 UTC timestamp
    pub date: String,
    /// Logical source of the entry; defaults to the page path
    pub namespace: String,
    /// Copied from the context `server` field when present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server: Option<Value>,
}
