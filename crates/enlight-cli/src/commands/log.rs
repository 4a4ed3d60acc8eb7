//! Log command - Send a single log entry
//!
//! Usage: `enlight log error "payment failed" --namespace checkout`

use std::path::Path;

use anyhow::Result;
use enlight_core::domain::Context;
use enlight_core::usecases::LogNormalizer;
use serde_json::Value;
use tracing::info;
use url::Url;

use super::{finish, load_config, parse_context_pair, start_agent};
use crate::output::Printer;

/// Arguments for the log subcommand
#[derive(Debug, clap::Args)]
pub struct LogCommand {
    /// Log level (any case; sent uppercased)
    pub level: String,

    /// Log message
    pub message: String,

    /// Logical source; defaults to the page path
    #[arg(long)]
    pub namespace: Option<String>,

    /// Correlation id (accepted, not sent)
    #[arg(long)]
    pub correlation_id: Option<String>,

    /// Extra context field (repeatable); only `server` is copied onto log entries
    #[arg(long = "context", value_parser = parse_context_pair)]
    pub context: Vec<(String, Value)>,

    /// Print the normalized entry instead of sending it
    #[arg(long)]
    pub dry_run: bool,
}

impl LogCommand {
    pub async fn execute(&self, printer: &Printer, config_path: &Path) -> Result<()> {
        let config = load_config(config_path)?;

        info!(level = %self.level, "Sending log entry");

        if self.dry_run {
            let page_url = Url::parse(&config.client.page_url)?;
            let mut context = Context::with_url(page_url.as_str());
            context.merge(self.context.iter().cloned());

            let entry = LogNormalizer::for_page(&page_url).normalize(
                &self.level,
                self.message.clone(),
                self.namespace.as_deref(),
                self.correlation_id.as_deref(),
                &context,
            );
            if printer.is_json() {
                printer.json(&serde_json::to_value(&entry)?);
            } else {
                printer.success("Normalized log entry (not sent)");
                printer.detail(&format!("{} [{}] {}", entry.date, entry.log_level, entry.message));
                printer.detail(&format!("namespace: {}", entry.namespace));
            }
            return Ok(());
        }

        let (agent, transport) = start_agent(&config)?;
        agent.set_context(self.context.iter().cloned());
        agent.log(
            &self.level,
            self.message.clone(),
            self.namespace.as_deref(),
            self.correlation_id.as_deref(),
        );
        let outcome = finish(&agent, &transport, printer).await;

        if printer.is_json() {
            printer.json(&serde_json::json!({
                "success": true,
                "logs": outcome.logs,
                "server": config.client.server,
            }));
        } else {
            printer.success(&format!(
                "Submitted {} log entr{} to {}",
                outcome.logs,
                if outcome.logs == 1 { "y" } else { "ies" },
                config.client.server
            ));
        }
        Ok(())
    }
}
