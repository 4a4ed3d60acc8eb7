//! Terminal output for the CLI
//!
//! Results go to stdout, warnings and errors to stderr. `--quiet` drops
//! human-readable confirmations and detail lines but never warnings,
//! errors or requested JSON.

use serde_json::Value;

/// Output format selector
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputFormat {
    Human,
    Json,
}

/// Kind of message being printed
#[derive(Debug, Clone, Copy, PartialEq)]
enum Kind {
    Success,
    Warn,
    Error,
    Detail,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Stream {
    Stdout,
    Stderr,
}

/// Formats and prints command output
#[derive(Debug, Clone, Copy)]
pub struct Printer {
    format: OutputFormat,
    quiet: bool,
}

impl Printer {
    pub fn new(format: OutputFormat, quiet: bool) -> Self {
        Self { format, quiet }
    }

    pub fn is_json(&self) -> bool {
        self.format == OutputFormat::Json
    }

    pub fn success(&self, message: &str) {
        self.emit(Kind::Success, message);
    }

    pub fn warn(&self, message: &str) {
        self.emit(Kind::Warn, message);
    }

    pub fn error(&self, message: &str) {
        self.emit(Kind::Error, message);
    }

    /// Indented follow-up line; human output only
    pub fn detail(&self, message: &str) {
        self.emit(Kind::Detail, message);
    }

    /// Pretty-printed JSON document; JSON output only
    pub fn json(&self, value: &Value) {
        if self.is_json() {
            println!("{}", serde_json::to_string_pretty(value).unwrap_or_default());
        }
    }

    fn emit(&self, kind: Kind, message: &str) {
        match self.render(kind, message) {
            Some((Stream::Stdout, line)) => println!("{line}"),
            Some((Stream::Stderr, line)) => eprintln!("{line}"),
            None => {}
        }
    }

    fn render(&self, kind: Kind, message: &str) -> Option<(Stream, String)> {
        match (self.format, kind) {
            (OutputFormat::Human, Kind::Success) if !self.quiet => {
                Some((Stream::Stdout, format!("\u{2713} {message}")))
            }
            (OutputFormat::Human, Kind::Detail) if !self.quiet => {
                Some((Stream::Stdout, format!("  {message}")))
            }
            (OutputFormat::Human, Kind::Warn) => {
                Some((Stream::Stderr, format!("\u{26a0} Warning: {message}")))
            }
            (OutputFormat::Human, Kind::Error) => {
                Some((Stream::Stderr, format!("\u{2717} Error: {message}")))
            }
            (OutputFormat::Human, _) => None,
            (OutputFormat::Json, Kind::Success) => Some((
                Stream::Stdout,
                serde_json::json!({"success": true, "message": message}).to_string(),
            )),
            (OutputFormat::Json, Kind::Warn) => Some((
                Stream::Stderr,
                serde_json::json!({"level": "warning", "message": message}).to_string(),
            )),
            (OutputFormat::Json, Kind::Error) => Some((
                Stream::Stderr,
                serde_json::json!({"success": false, "error": message}).to_string(),
            )),
            (OutputFormat::Json, Kind::Detail) => None,
        }
    }
}
