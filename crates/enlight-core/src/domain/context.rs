//! Ambient request/session context
//!
//! A [`Context`] is a flat key/value mapping merged into every outgoing
//! report and log entry. Keys are strings, values are arbitrary JSON and are
//! serialized as-is. Merging is last-write-wins per key and there is no
//! removal primitive: once a key is set it stays for the agent's lifetime.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Well-known context key holding the page/application URL.
pub const URL_KEY: &str = "url";

/// Well-known context key holding the server name copied onto log entries.
pub const SERVER_KEY: &str = "server";

/// Well-known context key holding the correlation identifier of a report.
pub const REQUEST_ID_KEY: &str = "request_id";

/// Ambient key/value data merged into every report and log entry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Context {
    fields: Map<String, Value>,
}

impl Context {
    /// Creates an empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a context seeded with the `url` field
    pub fn with_url(url: impl Into<String>) -> Self {
        let mut context = Self::new();
        context.insert(URL_KEY, Value::String(url.into()));
        context
    }

    /// Merges `partial` into this context, overwriting existing keys
    pub fn merge<I, K>(&mut self, partial: I)
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        for (key, value) in partial {
            self.fields.insert(key.into(), value);
        }
    }

    /// Sets a single key, overwriting any previous value
    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.fields.insert(key.into(), value);
    }

    /// Returns the value stored under `key`
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Returns `true` if `key` has been set
    pub fn contains(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    /// Borrowed view of all fields
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl From<Map<String, Value>> for Context {
    fn from(fields: Map<String, Value>) -> Self {
        Self { fields }
    }
}
