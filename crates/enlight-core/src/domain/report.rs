//! Canonical error reports
//!
//! A [`Report`] is the wire representation of one captured runtime error,
//! as accepted by the `/api/reports` collector endpoint. Because ambient
//! [`Context`](super::Context) fields are merged over the base fields (and
//! may overwrite them), a report is stored as a JSON object rather than a
//! fixed struct. Typed accessors cover the fields the agent reads back.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::context::REQUEST_ID_KEY;

/// One line of a report traceback
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TracebackLine {
    /// Concatenated source context, one line per `\n`
    pub cline: String,
    /// Source file or script URL
    pub file: String,
    /// Function name
    #[serde(rename = "fn")]
    pub function: String,
    pub line: u32,
    /// Reserved for local variables; always empty
    pub vars: Vec<Value>,
}

/// Canonical report sent to the collector
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Report {
    fields: Map<String, Value>,
}

impl Report {
    /// Wraps an already normalized set of report fields
    pub fn from_fields(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// Returns the raw value of `key`
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Human-readable error summary
    pub fn error(&self) -> Option<&str> {
        self.fields.get("error").and_then(Value::as_str)
    }

    /// Correlation identifier; always present on normalized reports
    pub fn request_id(&self) -> Option<&str> {
        self.fields.get(REQUEST_ID_KEY).and_then(Value::as_str)
    }

    /// Traceback lines, most recent call first
    ///
    /// Returns an empty vector if a context field overwrote `traceback`
    /// with something that is not a traceback.
    pub fn traceback(&self) -> Vec<TracebackLine> {
        self.fields
            .get("traceback")
            .cloned()
            .and_then(|value| serde_json::from_value(value).ok())
            .unwrap_or_default()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.fields
    }
}
