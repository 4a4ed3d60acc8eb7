//! Log normalization use case
//!
//! Converts a `(level, message, namespace)` log call into a [`LogEntry`].

use tracing::trace;
use url::Url;

use crate::domain::context::SERVER_KEY;
use crate::domain::{Context, LogEntry};
use crate::usecases::timestamp_now;

/// Builds canonical log entries
#[derive(Debug, Clone)]
pub struct LogNormalizer {
    default_namespace: String,
}

impl LogNormalizer {
    /// Creates a normalizer whose default namespace is `namespace`
    pub fn new(default_namespace: impl Into<String>) -> Self {
        Self {
            default_namespace: default_namespace.into(),
        }
    }

    /// Creates a normalizer whose default namespace is the path of `page_url`
    pub fn for_page(page_url: &Url) -> Self {
        Self::new(page_url.path())
    }

    pub fn default_namespace(&self) -> &str {
        &self.default_namespace
    }

    /// Normalizes one log call
    ///
    /// # Arguments
    /// * `level` - Level name in any case; uppercased on the entry
    /// * `message` - Log message
    /// * `namespace` - Logical source; defaults to the page path
    /// * `correlation_id` - Accepted for future report correlation; not sent
    /// * `context` - Current ambient context; only `server` is copied
    pub fn normalize(
        &self,
        level: &str,
        message: impl Into<String>,
        namespace: Option<&str>,
        correlation_id: Option<&str>,
        context: &Context,
    ) -> LogEntry {
        if let Some(id) = correlation_id {
            trace!(correlation_id = %id, "Correlation id not forwarded on log entries");
        }

        LogEntry {
            log_level: level.to_uppercase(),
            message: message.into(),
            date: timestamp_now(),
            namespace: namespace
                .map(str::to_string)
                .unwrap_or_else(|| self.default_namespace.clone()),
            server: context.get(SERVER_KEY).cloned(),
        }
    }
}
