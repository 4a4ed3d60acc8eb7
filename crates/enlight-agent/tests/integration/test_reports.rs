//! Error reports delivered to `/api/reports`

use std::sync::Arc;

use enlight_core::ports::Exception;
use serde_json::{json, Value};

use crate::common;

#[derive(Debug)]
struct CheckoutError;

impl std::fmt::Display for CheckoutError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("card declined")
    }
}

impl std::error::Error for CheckoutError {}

#[tokio::test]
async fn test_captured_error_is_posted_as_report() {
    let harness = common::setup_agent(200).await;
    harness.agent.set_context([("user", json!("u-17"))]);

    let exception: Exception = Arc::new(CheckoutError);
    harness.agent.capture_error(exception).expect("capture");

    let outcome = harness.agent.flush();
    assert_eq!(outcome.reports, 1);
    harness.transport.wait_for_deliveries().await;

    let requests = common::received(&harness.server, "reports").await;
    assert_eq!(requests.len(), 1);

    let batch: Vec<Value> = requests[0].body_json().expect("JSON array body");
    assert_eq!(batch.len(), 1);

    let report = &batch[0];
    assert_eq!(report["client"], "javascript");
    assert_eq!(report["language"], "javascript");
    assert_eq!(report["error"], "Error: card declined");
    assert_eq!(report["priority"], 5);
    assert_eq!(report["http_status"], 500);
    assert_eq!(report["occurences"], 1);
    assert_eq!(report["user"], "u-17");
    assert_eq!(report["url"], "https://shop.example.com/checkout/pay");
    assert!(report["traceback"].is_array());
    assert_eq!(report["request_id"].as_str().map(str::len), Some(36));
}

#[tokio::test]
async fn test_reports_batch_preserves_order() {
    let harness = common::setup_agent(200).await;

    for message in ["first", "second", "third"] {
        harness.agent.handle_error(enlight_core::domain::RawError::new("Error", message));
    }

    assert_eq!(harness.agent.flush_reports(), 3);
    harness.transport.wait_for_deliveries().await;

    let requests = common::received(&harness.server, "reports").await;
    let batch: Vec<Value> = requests[0].body_json().unwrap();
    let errors: Vec<&str> = batch.iter().filter_map(|r| r["error"].as_str()).collect();
    assert_eq!(errors, vec!["Error: first", "Error: second", "Error: third"]);
}

#[tokio::test]
async fn test_request_carries_json_content_type() {
    let harness = common::setup_agent(200).await;
    harness.agent.handle_error(enlight_core::domain::RawError::new("Error", "m"));

    harness.agent.flush();
    harness.transport.wait_for_deliveries().await;

    let requests = common::received(&harness.server, "reports").await;
    let content_type = requests[0]
        .headers
        .get("content-type")
        .and_then(|v| v.to_str().ok());
    assert_eq!(content_type, Some("application/json"));
}
