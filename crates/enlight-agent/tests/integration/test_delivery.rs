//! Delivery semantics: best effort, no retries, periodic flushing

use std::time::Duration;

use enlight_core::config::ConfigBuilder;

use crate::common;

#[tokio::test]
async fn test_empty_flush_sends_nothing() {
    let harness = common::setup_agent(200).await;

    assert!(harness.agent.flush().is_empty());
    harness.transport.wait_for_deliveries().await;

    let requests = harness.server.received_requests().await.unwrap_or_default();
    assert!(requests.is_empty());
}

#[tokio::test]
async fn test_rejected_batch_is_not_retried() {
    let harness = common::setup_agent(500).await;
    harness.agent.log("error", "lost", None, None);

    assert_eq!(harness.agent.flush_logs(), 1);
    harness.transport.wait_for_deliveries().await;

    assert!(harness.agent.pending().logs == 0);
    assert_eq!(harness.agent.flush_logs(), 0);
    harness.transport.wait_for_deliveries().await;

    assert_eq!(common::received(&harness.server, "logs").await.len(), 1);
}

#[tokio::test]
async fn test_periodic_flush_delivers_without_manual_flush() {
    let server = common::setup_collector(200).await;
    let config = ConfigBuilder::new()
        .server(server.uri())
        .api_key(common::API_KEY)
        .send_interval_ms(1000)
        .build();
    let harness = common::build_harness(server, &config);

    harness.agent.log("info", "tick", None, None);
    tokio::time::sleep(Duration::from_millis(1500)).await;
    harness.transport.wait_for_deliveries().await;

    assert_eq!(common::received(&harness.server, "logs").await.len(), 1);
    assert_eq!(harness.agent.pending().logs, 0);

    harness.agent.shutdown();
}

#[tokio::test]
async fn test_shutdown_flushes_buffered_entries() {
    let harness = common::setup_agent(200).await;
    harness.agent.log("info", "bye", None, None);

    let outcome = harness.agent.shutdown();
    assert_eq!(outcome.logs, 1);
    harness.transport.wait_for_deliveries().await;

    assert_eq!(common::received(&harness.server, "logs").await.len(), 1);
}
