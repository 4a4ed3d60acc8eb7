//! Log entries delivered to `/api/logs`

use enlight_core::domain::LogEntry;
use serde_json::json;

use crate::common;

#[tokio::test]
async fn test_log_entries_are_posted() {
    let harness = common::setup_agent(200).await;
    harness.agent.set_context([("server", json!("web-3"))]);

    harness.agent.log("error", "boom", None, None);
    harness.agent.log("info", "order placed", Some("orders"), Some("corr-9"));

    assert_eq!(harness.agent.flush_logs(), 2);
    harness.transport.wait_for_deliveries().await;

    let requests = common::received(&harness.server, "logs").await;
    assert_eq!(requests.len(), 1);

    let batch: Vec<LogEntry> = requests[0].body_json().expect("log batch");
    assert_eq!(batch[0].log_level, "ERROR");
    assert_eq!(batch[0].message, "boom");
    assert_eq!(batch[0].namespace, "/checkout/pay");
    assert_eq!(batch[0].server, Some(json!("web-3")));
    assert_eq!(batch[1].log_level, "INFO");
    assert_eq!(batch[1].namespace, "orders");
}

#[tokio::test]
async fn test_logs_and_reports_are_separate_requests() {
    let harness = common::setup_agent(200).await;
    harness.agent.log("warning", "slow", None, None);
    harness
        .agent
        .handle_error(enlight_core::domain::RawError::new("Error", "m"));

    let outcome = harness.agent.flush();
    assert_eq!((outcome.reports, outcome.logs), (1, 1));
    harness.transport.wait_for_deliveries().await;

    assert_eq!(common::received(&harness.server, "logs").await.len(), 1);
    assert_eq!(common::received(&harness.server, "reports").await.len(), 1);
}
