//! Prometheus metrics for the agent
//!
//! Counts what the agent captured and what it handed to the transport.
//! Delivery outcome is not observable from here since submission is
//! fire-and-forget.

use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

use crate::AgentError;

/// Label value for report batches
pub const KIND_REPORTS: &str = "reports";

/// Label value for log batches
pub const KIND_LOGS: &str = "logs";

/// Agent-local metrics registry
#[derive(Clone)]
pub struct AgentMetrics {
    registry: Registry,
    /// Counter: reports normalized and buffered
    pub reports_captured_total: IntCounter,
    /// Counter: log entries normalized and buffered
    pub logs_captured_total: IntCounter,
    /// Counter: batches handed to the transport, by kind
    pub batches_submitted_total: IntCounterVec,
    /// Counter: entries handed to the transport, by kind
    pub entries_submitted_total: IntCounterVec,
    /// Counter: stack frames whose context could not be read
    pub frames_degraded_total: IntCounter,
}

impl AgentMetrics {
    pub fn new() -> Result<Self, AgentError> {
        let registry = Registry::new_custom(Some("enlight".to_string()), None)?;

        let reports_captured_total = IntCounter::with_opts(Opts::new(
            "reports_captured_total",
            "Error reports captured",
        ))?;
        registry.register(Box::new(reports_captured_total.clone()))?;

        let logs_captured_total =
            IntCounter::with_opts(Opts::new("logs_captured_total", "Log entries captured"))?;
        registry.register(Box::new(logs_captured_total.clone()))?;

        let batches_submitted_total = IntCounterVec::new(
            Opts::new("batches_submitted_total", "Batches submitted to the collector"),
            &["kind"],
        )?;
        registry.register(Box::new(batches_submitted_total.clone()))?;

        let entries_submitted_total = IntCounterVec::new(
            Opts::new("entries_submitted_total", "Entries submitted to the collector"),
            &["kind"],
        )?;
        registry.register(Box::new(entries_submitted_total.clone()))?;

        let frames_degraded_total = IntCounter::with_opts(Opts::new(
            "frames_degraded_total",
            "Stack frames reported with placeholder context",
        ))?;
        registry.register(Box::new(frames_degraded_total.clone()))?;

        Ok(Self {
            registry,
            reports_captured_total,
            logs_captured_total,
            batches_submitted_total,
            entries_submitted_total,
            frames_degraded_total,
        })
    }

    /// Record one buffered report and its degraded frames.
    pub fn record_report(&self, degraded_frames: usize) {
        self.reports_captured_total.inc();
        self.frames_degraded_total.inc_by(degraded_frames as u64);
    }

    pub fn record_log(&self) {
        self.logs_captured_total.inc();
    }

    /// Record one submitted batch of `entries` entries of `kind`.
    pub fn record_batch(&self, kind: &str, entries: usize) {
        self.batches_submitted_total.with_label_values(&[kind]).inc();
        self.entries_submitted_total
            .with_label_values(&[kind])
            .inc_by(entries as u64);
    }

    /// Encode all metrics in Prometheus text exposition format.
    pub fn encode(&self) -> Result<String, AgentError> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()).into())
    }
}
