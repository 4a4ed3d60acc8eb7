//! `tracing` bridge
//!
//! [`EnlightLayer`] forwards application `tracing` events into the agent's
//! log buffer, using the event target as the log namespace. Events emitted
//! by the agent's own crates are ignored so that flushing cannot feed back
//! into the buffer.

use std::fmt::{self, Write as _};

use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::Context;

use crate::agent::Agent;

/// Target roots of the agent's own crates
const OWN_CRATES: &[&str] = &["enlight_core", "enlight_agent", "enlight_cli"];

/// Layer turning `tracing` events into buffered log entries
#[derive(Debug, Clone)]
pub struct EnlightLayer {
    agent: Agent,
    min_level: Level,
}

impl EnlightLayer {
    /// Forwards events at `INFO` and above
    pub fn new(agent: Agent) -> Self {
        Self::with_min_level(agent, Level::INFO)
    }

    /// Forwards events at `min_level` and above
    pub fn with_min_level(agent: Agent, min_level: Level) -> Self {
        Self { agent, min_level }
    }
}

impl<S: Subscriber> tracing_subscriber::Layer<S> for EnlightLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        // more verbose levels compare greater
        if *metadata.level() > self.min_level {
            return;
        }
        if is_own_target(metadata.target()) {
            return;
        }

        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);

        self.agent.log(
            metadata.level().as_str(),
            visitor.finish(),
            Some(metadata.target()),
            None,
        );
    }
}

fn is_own_target(target: &str) -> bool {
    OWN_CRATES.iter().any(|root| {
        target
            .strip_prefix(root)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with("::"))
    })
}

/// Collects the `message` field followed by `key=value` pairs
#[derive(Default)]
struct MessageVisitor {
    message: String,
    fields: String,
}

impl MessageVisitor {
    fn finish(self) -> String {
        if self.fields.is_empty() {
            self.message
        } else if self.message.is_empty() {
            self.fields
        } else {
            format!("{} {}", self.message, self.fields)
        }
    }

    fn push_field(&mut self, field: &Field, value: fmt::Arguments<'_>) {
        if !self.fields.is_empty() {
            self.fields.push(' ');
        }
        let _ = write!(self.fields, "{}={}", field.name(), value);
    }
}

impl Visit for MessageVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.push_field(field, format_args!("{value}"));
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        } else {
            self.push_field(field, format_args!("{value:?}"));
        }
    }
}
