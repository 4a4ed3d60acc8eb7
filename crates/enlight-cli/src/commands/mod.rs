//! CLI subcommands and the helpers they share

pub mod capture;
pub mod completions;
pub mod config;
pub mod log;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use enlight_agent::{Agent, FlushOutcome, HttpTransport, PanicCapture};
use enlight_core::config::Config;
use serde_json::Value;
use tracing::{debug, warn};

use crate::output::Printer;

/// Longest wait for in-flight deliveries before the CLI exits
const DELIVERY_TIMEOUT: Duration = Duration::from_secs(10);

/// Loads and validates the configuration at `path`
///
/// A missing file means defaults; a file that exists but does not parse
/// is an error.
pub(crate) fn load_config(path: &Path) -> Result<Config> {
    let config = if path.exists() {
        Config::load(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?
    } else {
        debug!(config_path = %path.display(), "No configuration file, using defaults");
        Config::default()
    };

    let errors = config.validate();
    if !errors.is_empty() {
        let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
        bail!("Invalid configuration: {}", messages.join("; "));
    }
    Ok(config)
}

/// Starts an agent delivering over HTTP
pub(crate) fn start_agent(config: &Config) -> Result<(Agent, HttpTransport)> {
    let transport = HttpTransport::new().context("Failed to build HTTP client")?;
    let agent = Agent::init(
        config,
        Arc::new(transport.clone()),
        Arc::new(PanicCapture::new()),
    )
    .context("Failed to initialize agent")?;
    Ok((agent, transport))
}

/// Flushes the agent and waits for delivery before exit
///
/// Deliveries still running after `DELIVERY_TIMEOUT` are abandoned with a
/// warning.
pub(crate) async fn finish(
    agent: &Agent,
    transport: &HttpTransport,
    printer: &Printer,
) -> FlushOutcome {
    let outcome = agent.shutdown();
    if tokio::time::timeout(DELIVERY_TIMEOUT, transport.wait_for_deliveries())
        .await
        .is_err()
    {
        let in_flight = transport.in_flight();
        warn!(in_flight, "Deliveries still pending at exit");
        printer.warn(&pending_message(in_flight, DELIVERY_TIMEOUT));
    }
    outcome
}

fn pending_message(in_flight: usize, waited: Duration) -> String {
    format!(
        "{in_flight} deliver{} still pending after {}s, exiting anyway",
        if in_flight == 1 { "y" } else { "ies" },
        waited.as_secs()
    )
}

/// Parses a `key=value` context pair; the value is JSON when it parses as
/// JSON and a plain string otherwise
pub(crate) fn parse_context_pair(raw: &str) -> Result<(String, Value), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{raw}'"))?;
    if key.is_empty() {
        return Err(format!("empty key in '{raw}'"));
    }
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((key.to_string(), value))
}
