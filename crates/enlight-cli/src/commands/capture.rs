//! Capture command - Send a captured error as a report
//!
//! Reads a captured error in the stack-capture wire shape
//! (`{"mode", "name", "message", "stack": [{"url", "func", "line", "context"}]}`),
//! normalizes it with the current context and delivers it to the collector.
//! With `--dry-run` the normalized report is printed instead of sent.

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use enlight_core::domain::{Context, RawError};
use enlight_core::usecases::ReportNormalizer;
use serde_json::Value;
use tracing::info;

use super::{finish, load_config, parse_context_pair, start_agent};
use crate::output::Printer;

/// Arguments for the capture subcommand
#[derive(Debug, clap::Args)]
pub struct CaptureCommand {
    /// JSON file holding the captured error
    pub file: PathBuf,

    /// Extra context field (repeatable), e.g. `--context user=42`
    #[arg(long = "context", value_parser = parse_context_pair)]
    pub context: Vec<(String, Value)>,

    /// Print the normalized report instead of sending it
    #[arg(long)]
    pub dry_run: bool,
}

impl CaptureCommand {
    pub async fn execute(&self, printer: &Printer, config_path: &Path) -> Result<()> {
        let config = load_config(config_path)?;
        let raw = read_raw_error(&self.file)?;

        info!(file = %self.file.display(), error = %raw.summary(), "Capturing error");

        if self.dry_run {
            let mut context = Context::with_url(config.client.page_url.clone());
            context.merge(self.context.iter().cloned());

            let normalizer = ReportNormalizer::new(config.client.user_agent.clone());
            let normalized = normalizer.normalize(&raw, &context);
            if printer.is_json() {
                printer.json(&Value::Object(normalized.report.into_map()));
            } else {
                let yaml = serde_yaml::to_string(&normalized.report)
                    .context("Failed to serialize report")?;
                printer.success("Normalized report (not sent)");
                for line in yaml.lines() {
                    printer.detail(line);
                }
            }
            return Ok(());
        }

        let (agent, transport) = start_agent(&config)?;
        agent.set_context(self.context.iter().cloned());
        agent.handle_error(raw);
        let outcome = finish(&agent, &transport, printer).await;

        if printer.is_json() {
            printer.json(&serde_json::json!({
                "success": true,
                "reports": outcome.reports,
                "server": config.client.server,
            }));
        } else {
            printer.success(&format!(
                "Submitted {} report(s) to {}",
                outcome.reports, config.client.server
            ));
        }
        Ok(())
    }
}

fn read_raw_error(path: &Path) -> Result<RawError> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    parse_raw_error(&content)
        .with_context(|| format!("Invalid captured error in {}", path.display()))
}

fn parse_raw_error(content: &str) -> Result<RawError> {
    Ok(serde_json::from_str(content)?)
}
