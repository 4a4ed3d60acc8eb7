//! Config command - View and validate Enlight configuration
//!
//! Provides the `enlight config` CLI command which:
//! 1. Shows the effective configuration (YAML or JSON)
//! 2. Validates the configuration file and reports errors
//! 3. Prints the configuration file path

use std::path::Path;

use anyhow::{Context, Result};
use clap::Subcommand;
use enlight_core::config::Config;
use tracing::info;

use crate::output::Printer;

/// Config subcommands
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Display current configuration
    Show,
    /// Validate configuration file
    Validate,
    /// Print the configuration file path
    Path,
}

impl ConfigCommand {
    pub async fn execute(&self, printer: &Printer, config_path: &Path) -> Result<()> {
        match self {
            ConfigCommand::Show => execute_show(printer, config_path),
            ConfigCommand::Validate => execute_validate(printer, config_path),
            ConfigCommand::Path => execute_path(printer, config_path),
        }
    }
}

fn execute_show(printer: &Printer, config_path: &Path) -> Result<()> {
    let config = Config::load_or_default(config_path);

    info!(config_path = %config_path.display(), "Showing configuration");

    if printer.is_json() {
        let json =
            serde_json::to_value(&config).context("Failed to serialize configuration to JSON")?;
        printer.json(&json);
    } else {
        printer.success(&format!("Configuration ({})", config_path.display()));
        printer.detail("");

        let yaml =
            serde_yaml::to_string(&config).context("Failed to serialize configuration to YAML")?;
        for line in yaml.lines() {
            printer.detail(line);
        }
    }

    Ok(())
}

fn execute_validate(printer: &Printer, config_path: &Path) -> Result<()> {

    let errors = match validation_errors(config_path) {
        Ok(errors) => errors,
        Err(e) => vec![e],
    };

    info!(config_path = %config_path.display(), errors = errors.len(), "Validated configuration");

    if printer.is_json() {
        printer.json(&serde_json::json!({
            "valid": errors.is_empty(),
            "config_path": config_path.display().to_string(),
            "errors": errors,
        }));
    } else if errors.is_empty() {
        printer.success("Configuration is valid");
        printer.detail(&format!("File: {}", config_path.display()));
    } else {
        printer.error(&format!(
            "Configuration has {} error{}:",
            errors.len(),
            if errors.len() == 1 { "" } else { "s" }
        ));
        printer.detail(&format!("File: {}", config_path.display()));
        printer.detail("");
        for error in &errors {
            printer.detail(&format!("  {error}"));
        }
    }

    Ok(())
}

fn execute_path(printer: &Printer, config_path: &Path) -> Result<()> {
    if printer.is_json() {
        printer.json(&serde_json::json!({
            "config_path": config_path.display().to_string(),
            "exists": config_path.exists(),
        }));
    } else {
        println!("{}", config_path.display());
    }
    Ok(())
}

/// Loads the file strictly and returns its validation errors
///
/// A missing file validates as the defaults.
fn validation_errors(config_path: &Path) -> Result<Vec<String>, String> {
    let config = if config_path.exists() {
        Config::load(config_path).map_err(|e| format!("Failed to parse configuration: {e}"))?
    } else {
        Config::default()
    };
    Ok(config.validate().iter().map(ToString::to_string).collect())
}
