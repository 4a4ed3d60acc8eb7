//! Raw captured errors
//!
//! These are the input shapes produced by a stack-capture collaborator:
//! an error name and message plus the call stack, ordered oldest call
//! first. Frames carry their source context as raw JSON so that input
//! coming from foreign capture mechanisms (or a JSON file handed to the
//! CLI) can be malformed without failing deserialization. Reading the
//! context is where malformation surfaces.
//!
//! The other frame fields are read leniently: a wrongly typed `url`,
//! `func` or `line` degrades to empty / unknown for that frame only, and a
//! stack entry that is not an object becomes an empty frame. One bad frame
//! never discards the rest of the error.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::domain::errors::DomainError;

/// How the collaborator obtained the error
///
/// Only `stack` mode yields a `"Name: message"` summary; every other mode
/// (e.g. `onerror`, `failed`) reports the bare message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ErrorMode {
    /// A full stack trace was extracted
    Stack,
    /// Any other extraction mode, kept verbatim
    Other(String),
}

impl From<String> for ErrorMode {
    fn from(mode: String) -> Self {
        if mode == "stack" {
            ErrorMode::Stack
        } else {
            ErrorMode::Other(mode)
        }
    }
}

impl From<ErrorMode> for String {
    fn from(mode: ErrorMode) -> Self {
        match mode {
            ErrorMode::Stack => "stack".to_string(),
            ErrorMode::Other(other) => other,
        }
    }
}

impl Default for ErrorMode {
    fn default() -> Self {
        ErrorMode::Stack
    }
}

/// One call-stack frame as delivered by the collaborator
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawFrame {
    /// Source file or script URL
    #[serde(default, deserialize_with = "lenient::string")]
    pub url: String,
    /// Function name (`func` on the wire of some capture libraries)
    #[serde(default, alias = "func", deserialize_with = "lenient::string")]
    pub function: String,
    /// Line number, when known
    #[serde(default, deserialize_with = "lenient::line")]
    pub line: Option<u32>,
    /// Source lines around `line`; expected to be an array of strings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,
}

impl RawFrame {
    /// Creates a frame without source context
    pub fn new(url: impl Into<String>, function: impl Into<String>, line: u32) -> Self {
        Self {
            url: url.into(),
            function: function.into(),
            line: Some(line),
            context: None,
        }
    }

    /// Attaches source context lines
    pub fn with_context<I, S>(mut self, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let lines = lines
            .into_iter()
            .map(|line| Value::String(line.into()))
            .collect();
        self.context = Some(Value::Array(lines));
        self
    }

    /// Reads the source context as string lines
    ///
    /// Returns an empty vector when the frame has no context (absent or
    /// `null`), and [`DomainError::MalformedContext`] when the context is
    /// not an array of strings.
    pub fn context_lines(&self) -> Result<Vec<&str>, DomainError> {
        let lines = match &self.context {
            None | Some(Value::Null) => return Ok(Vec::new()),
            Some(Value::Array(lines)) => lines,
            Some(other) => {
                return Err(DomainError::MalformedContext {
                    index: 0,
                    reason: format!("expected array, found {}", json_kind(other)),
                })
            }
        };

        lines
            .iter()
            .enumerate()
            .map(|(index, line)| {
                line.as_str().ok_or_else(|| DomainError::MalformedContext {
                    index,
                    reason: format!("expected string, found {}", json_kind(line)),
                })
            })
            .collect()
    }
}

/// A captured error before normalization
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawError {
    #[serde(default, deserialize_with = "lenient::mode")]
    pub mode: ErrorMode,
    #[serde(default, deserialize_with = "lenient::string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub message: String,
    /// Call stack, oldest call first
    #[serde(default, deserialize_with = "lenient::stack")]
    pub stack: Vec<RawFrame>,
}

impl RawError {
    /// Creates a stack-mode error with no frames
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            mode: ErrorMode::Stack,
            name: name.into(),
            message: message.into(),
            stack: Vec::new(),
        }
    }

    pub fn with_mode(mut self, mode: ErrorMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_stack(mut self, stack: Vec<RawFrame>) -> Self {
        self.stack = stack;
        self
    }

    /// Human-readable summary: `"Name: message"` in stack mode, else the message
    pub fn summary(&self) -> String {
        match self.mode {
            ErrorMode::Stack => format!("{}: {}", self.name, self.message),
            ErrorMode::Other(_) => self.message.clone(),
        }
    }
}

/// Field readers that coerce wrongly typed input instead of failing
mod lenient {
    use super::*;

    /// Strings pass through; numbers and booleans are stringified; anything
    /// else reads as empty
    pub(super) fn string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
        Ok(match Option::<Value>::deserialize(d)? {
            Some(Value::String(s)) => s,
            Some(Value::Number(n)) => n.to_string(),
            Some(Value::Bool(b)) => b.to_string(),
            _ => String::new(),
        })
    }

    /// Non-negative integers up to `u32::MAX`, or strings holding one
    pub(super) fn line<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u32>, D::Error> {
        Ok(match Option::<Value>::deserialize(d)? {
            Some(Value::Number(n)) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
            Some(Value::String(s)) => s.trim().parse().ok(),
            _ => None,
        })
    }

    pub(super) fn mode<'de, D: Deserializer<'de>>(d: D) -> Result<ErrorMode, D::Error> {
        match Option::<Value>::deserialize(d)? {
            Some(Value::String(s)) => Ok(ErrorMode::from(s)),
            _ => Ok(ErrorMode::default()),
        }
    }

    /// Non-array stacks read as empty; non-object entries as empty frames
    pub(super) fn stack<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<RawFrame>, D::Error> {
        let frames = match Option::<Value>::deserialize(d)? {
            Some(Value::Array(frames)) => frames,
            _ => return Ok(Vec::new()),
        };
        Ok(frames
            .into_iter()
            .map(|frame| match frame {
                Value::Object(_) => serde_json::from_value(frame).unwrap_or_default(),
                _ => RawFrame::default(),
            })
            .collect())
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
