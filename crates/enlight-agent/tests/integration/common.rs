//! Shared test helpers for collector integration tests
//!
//! Each helper mounts the collector endpoints on a wiremock server and
//! returns an Agent pointing at it.

use std::sync::Arc;

use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

use enlight_agent::{Agent, HttpTransport, PanicCapture};
use enlight_core::config::{Config, ConfigBuilder};

pub const API_KEY: &str = "pk_integration";

/// Agent wired to a mock collector
pub struct Harness {
    pub server: MockServer,
    pub agent: Agent,
    pub transport: HttpTransport,
}

/// Config pointing at `server`, flushing manually
pub fn config_for(server: &MockServer) -> Config {
    ConfigBuilder::new()
        .server(server.uri())
        .api_key(API_KEY)
        .send_interval_ms(0)
        .page_url("https://shop.example.com/checkout/pay")
        .source_fetching(false)
        .build()
}

/// Starts a collector answering `status` on both endpoints
pub async fn setup_collector(status: u16) -> MockServer {
    let server = MockServer::start().await;

    for kind in ["reports", "logs"] {
        Mock::given(method("POST"))
            .and(path(format!("/api/{kind}")))
            .and(query_param("public_api_key", API_KEY))
            .and(query_param("protocol_version", "0.5"))
            .respond_with(ResponseTemplate::new(status))
            .mount(&server)
            .await;
    }

    server
}

/// Starts a collector and an agent built from `config_for`
pub async fn setup_agent(status: u16) -> Harness {
    let server = setup_collector(status).await;
    let config = config_for(&server);
    build_harness(server, &config)
}

pub fn build_harness(server: MockServer, config: &Config) -> Harness {
    let transport = HttpTransport::new().expect("build transport");
    let agent = Agent::init(
        config,
        Arc::new(transport.clone()),
        Arc::new(PanicCapture::new()),
    )
    .expect("init agent");

    Harness {
        server,
        agent,
        transport,
    }
}

/// Requests received on `/api/{kind}`
pub async fn received(server: &MockServer, kind: &str) -> Vec<Request> {
    let target = format!("/api/{kind}");
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|request| request.url.path() == target)
        .collect()
}
