//! Integration tests for enlight-agent
//!
//! Uses wiremock to simulate the collector and verifies end-to-end
//! behavior of the Agent with the HTTP transport and panic capture.

mod common;

mod test_delivery;
mod test_logs;
mod test_reports;
