//! Completions command - Generate shell completion scripts
//!
//! `enlight completions zsh` prints the script; `--output` writes it to a
//! file instead, creating parent directories as needed.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::CommandFactory;
use clap_complete::Shell;

use crate::output::Printer;

/// Arguments for the completions subcommand
#[derive(Debug, clap::Args)]
pub struct CompletionsCommand {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,

    /// Write the script to this file instead of stdout
    #[arg(long, short)]
    pub output: Option<PathBuf>,
}

impl CompletionsCommand {
    pub async fn execute(&self, printer: &Printer) -> Result<()> {
        let script = render(self.shell);

        let Some(path) = &self.output else {
            print!("{}", String::from_utf8_lossy(&script));
            return Ok(());
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        std::fs::write(path, &script)
            .with_context(|| format!("Failed to write {}", path.display()))?;

        if printer.is_json() {
            printer.json(&serde_json::json!({
                "shell": self.shell.to_string(),
                "path": path.display().to_string(),
            }));
        } else {
            printer.success(&format!("Wrote {} completions to {}", self.shell, path.display()));
        }
        Ok(())
    }
}

/// Completion script for `shell`
fn render(shell: Shell) -> Vec<u8> {
    let mut cmd = crate::Cli::command();
    let mut script = Vec::new();
    clap_complete::generate(shell, &mut cmd, "enlight", &mut script);
    script
}
