//! HTTP transport
//!
//! [`HttpTransport`] implements the fire-and-forget [`ITransport`] port with
//! `reqwest`. Each submitted batch is posted from its own Tokio task; the
//! outcome is logged and otherwise discarded. Nothing is retried.

use std::time::Duration;

use enlight_core::ports::ITransport;
use reqwest::{header::CONTENT_TYPE, Client, StatusCode};
use tokio_util::task::TaskTracker;
use tracing::{debug, warn};
use url::Url;

use crate::AgentError;

/// Default per-request timeout
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Posts JSON batches to the collector without awaiting the response
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    deliveries: TaskTracker,
}

impl HttpTransport {
    /// Creates a transport with the default request timeout
    pub fn new() -> Result<Self, AgentError> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    /// Creates a transport whose requests give up after `timeout`
    pub fn with_timeout(timeout: Duration) -> Result<Self, AgentError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("enlight-agent/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            deliveries: TaskTracker::new(),
        })
    }

    /// Posts `body` and returns the response status
    ///
    /// This is the awaited form used by each background delivery.
    pub async fn post(&self, endpoint: &Url, body: String) -> Result<StatusCode, reqwest::Error> {
        let response = self
            .client
            .post(endpoint.clone())
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await?;
        Ok(response.status())
    }

    /// Number of deliveries still in flight
    pub fn in_flight(&self) -> usize {
        self.deliveries.len()
    }

    /// Waits until every delivery started so far has finished
    ///
    /// Useful before process exit; the agent itself never waits.
    pub async fn wait_for_deliveries(&self) {
        self.deliveries.close();
        self.deliveries.wait().await;
        self.deliveries.reopen();
    }
}

impl ITransport for HttpTransport {
    fn submit(&self, endpoint: &Url, body: String) {
        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => runtime,
            Err(_) => {
                warn!(endpoint = %redact(endpoint), "No Tokio runtime, dropping batch");
                return;
            }
        };

        let transport = self.clone();
        let endpoint = endpoint.clone();
        let bytes = body.len();

        self.deliveries.spawn_on(
            async move {
                match transport.post(&endpoint, body).await {
                    Ok(status) if status.is_success() => {
                        debug!(endpoint = %redact(&endpoint), %status, bytes, "Batch delivered");
                    }
                    Ok(status) => {
                        warn!(endpoint = %redact(&endpoint), %status, bytes, "Collector rejected batch");
                    }
                    Err(e) => {
                        warn!(endpoint = %redact(&endpoint), error = %e, bytes, "Batch delivery failed");
                    }
                }
            },
            &runtime,
        );
    }
}

/// Endpoint without its query string, so the API key stays out of logs
fn redact(endpoint: &Url) -> String {
    let mut url = endpoint.clone();
    url.set_query(None);
    url.to_string()
}
