//! Agent facade
//!
//! [`Agent`] wires the normalizers, buffers, scheduler and transport
//! together and is the only type a host application needs to hold.
//!
//! ## Lifecycle
//!
//! 1. [`Agent::init`] validates the configuration, seeds the context with
//!    the page URL and starts periodic flushing. Only then does it
//!    configure the stack-capture collaborator and register the single
//!    error handler.
//! 2. The host calls [`Agent::set_context`], [`Agent::capture_error`] and
//!    [`Agent::log`] any number of times.
//! 3. [`Agent::shutdown`] stops the scheduler and flushes what is left.
//!
//! The agent is cheap to clone; clones share buffers and context.

use std::sync::{Arc, Mutex, PoisonError, RwLock, Weak};
use std::time::Duration;

use enlight_core::config::Config;
use enlight_core::domain::{Context, DomainError, Endpoints, RawError};
use enlight_core::ports::{ErrorHandler, Exception, IStackCapture, ITransport};
use enlight_core::usecases::{LogNormalizer, ReportNormalizer};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, info, warn};
use url::Url;

use crate::buffer::DualBuffer;
use crate::metrics::{AgentMetrics, KIND_LOGS, KIND_REPORTS};
use crate::scheduler::{FlushHandle, FlushScheduler};
use crate::AgentError;

/// Number of entries submitted by one flush
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushOutcome {
    pub reports: usize,
    pub logs: usize,
}

impl FlushOutcome {
    /// True when neither buffer had anything to send
    pub fn is_empty(&self) -> bool {
        self.reports == 0 && self.logs == 0
    }
}

/// Number of entries waiting in each buffer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Pending {
    pub reports: usize,
    pub logs: usize,
}

/// Client telemetry agent
#[derive(Clone)]
pub struct Agent {
    inner: Arc<AgentInner>,
}

struct AgentInner {
    endpoints: Endpoints,
    context: RwLock<Context>,
    report_normalizer: ReportNormalizer,
    log_normalizer: LogNormalizer,
    buffers: DualBuffer,
    transport: Arc<dyn ITransport>,
    capture: Arc<dyn IStackCapture>,
    metrics: AgentMetrics,
    scheduler: Mutex<Option<FlushHandle>>,
}

impl Agent {
    /// Initializes the agent
    ///
    /// Periodic flushing needs a running Tokio runtime unless
    /// `client.send_interval_ms` is below 1000, in which case no timer is
    /// created and the host flushes manually.
    ///
    /// # Errors
    /// - [`AgentError::InvalidConfig`] if validation fails
    /// - [`AgentError::Domain`] if an endpoint cannot be built
    /// - [`AgentError::NoRuntime`] if periodic flushing is enabled outside a runtime
    pub fn init(
        config: &Config,
        transport: Arc<dyn ITransport>,
        capture: Arc<dyn IStackCapture>,
    ) -> Result<Self, AgentError> {
        let errors = config.validate();
        if !errors.is_empty() {
            return Err(AgentError::InvalidConfig(errors));
        }

        let client = &config.client;
        let endpoints = Endpoints::new(&client.server, &client.api_key, &client.protocol_version)?;
        let page_url = Url::parse(&client.page_url)
            .map_err(|e| DomainError::InvalidPageUrl(format!("{}: {e}", client.page_url)))?;

        let agent = Self {
            inner: Arc::new(AgentInner {
                endpoints,
                context: RwLock::new(Context::with_url(page_url.as_str())),
                report_normalizer: ReportNormalizer::new(client.user_agent.clone()),
                log_normalizer: LogNormalizer::for_page(&page_url),
                buffers: DualBuffer::new(),
                transport,
                capture,
                metrics: AgentMetrics::new()?,
                scheduler: Mutex::new(None),
            }),
        };

        let weak = agent.downgrade();
        let handle = FlushScheduler::start(
            Duration::from_millis(client.send_interval_ms),
            move || {
                if let Some(inner) = weak.upgrade() {
                    Agent { inner }.flush();
                }
            },
        )?;
        *agent.lock_scheduler() = handle;

        // last, so a failed init never leaves a panic hook installed
        agent.inner.capture.configure(&config.capture.options());
        agent.inner.capture.on_error(agent.error_handler());

        info!(
            server = %client.server,
            send_interval_ms = client.send_interval_ms,
            collect_uncaught = config.capture.window_on_error,
            "Agent initialized"
        );

        Ok(agent)
    }

    /// Merges `partial` into the context; later writes win per key
    pub fn set_context<I, K>(&self, partial: I)
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        // collected before locking: the panic hook reads the context
        let partial: Vec<(String, Value)> =
            partial.into_iter().map(|(k, v)| (k.into(), v)).collect();
        self.write_context().merge(partial);
    }

    /// Snapshot of the current context
    pub fn context(&self) -> Context {
        self.read_context().clone()
    }

    /// Normalizes a captured error and buffers the report
    ///
    /// This is the handler registered with the stack-capture collaborator.
    pub fn handle_error(&self, raw: RawError) {
        let context = self.context();
        let normalized = self.inner.report_normalizer.normalize(&raw, &context);

        if normalized.degraded_frames > 0 {
            debug!(degraded = normalized.degraded_frames, "Report has frames without context");
        }
        self.inner.metrics.record_report(normalized.degraded_frames);
        let pending = self.inner.buffers.reports.push(normalized.report);
        debug!(error = %raw.summary(), pending, "Report buffered");
    }

    /// Hands `exception` to the stack-capture collaborator
    ///
    /// A rethrow of `exception` itself during capture is swallowed; any
    /// other error raised by the collaborator is returned.
    pub fn capture_error(&self, exception: Exception) -> Result<(), Exception> {
        match self.inner.capture.report(Arc::clone(&exception)) {
            Ok(()) => Ok(()),
            Err(raised) if Arc::ptr_eq(&raised, &exception) => {
                debug!(error = %exception, "Captured error rethrown by collaborator, swallowed");
                Ok(())
            }
            Err(raised) => {
                warn!(error = %raised, "Stack capture raised a different error");
                Err(raised)
            }
        }
    }

    /// Buffers one log entry
    ///
    /// `namespace` defaults to the page path. `correlation_id` is accepted
    /// but not forwarded.
    pub fn log(
        &self,
        level: &str,
        message: impl Into<String>,
        namespace: Option<&str>,
        correlation_id: Option<&str>,
    ) {
        let message = message.into();
        let context = self.context();
        let entry = self
            .inner
            .log_normalizer
            .normalize(level, message, namespace, correlation_id, &context);

        self.inner.metrics.record_log();
        self.inner.buffers.logs.push(entry);
    }

    /// Drains both buffers and submits each non-empty batch
    pub fn flush(&self) -> FlushOutcome {
        FlushOutcome {
            reports: self.flush_reports(),
            logs: self.flush_logs(),
        }
    }

    /// Drains the report buffer; returns the number of reports submitted
    pub fn flush_reports(&self) -> usize {
        let batch = self.inner.buffers.reports.drain();
        self.submit(&self.inner.endpoints.reports, KIND_REPORTS, &batch)
    }

    /// Drains the log buffer; returns the number of entries submitted
    pub fn flush_logs(&self) -> usize {
        let batch = self.inner.buffers.logs.drain();
        self.submit(&self.inner.endpoints.logs, KIND_LOGS, &batch)
    }

    pub fn pending(&self) -> Pending {
        Pending {
            reports: self.inner.buffers.reports.len(),
            logs: self.inner.buffers.logs.len(),
        }
    }

    pub fn metrics(&self) -> &AgentMetrics {
        &self.inner.metrics
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.inner.endpoints
    }

    /// True while a periodic flush task is scheduled
    pub fn is_scheduled(&self) -> bool {
        self.lock_scheduler()
            .as_ref()
            .is_some_and(FlushHandle::is_running)
    }

    /// Stops periodic flushing and flushes whatever is still buffered
    pub fn shutdown(&self) -> FlushOutcome {
        if let Some(handle) = self.lock_scheduler().take() {
            handle.stop();
        }
        let outcome = self.flush();
        info!(reports = outcome.reports, logs = outcome.logs, "Agent shut down");
        outcome
    }

    fn submit<T: Serialize>(&self, endpoint: &Url, kind: &str, batch: &[T]) -> usize {
        if batch.is_empty() {
            return 0;
        }

        let body = match serde_json::to_string(batch) {
            Ok(body) => body,
            Err(e) => {
                error!(kind, dropped = batch.len(), error = %e, "Failed to serialize batch");
                return 0;
            }
        };

        self.inner.transport.submit(endpoint, body);
        self.inner.metrics.record_batch(kind, batch.len());
        debug!(kind, entries = batch.len(), "Batch submitted");
        batch.len()
    }

    fn error_handler(&self) -> ErrorHandler {
        let weak = self.downgrade();
        Arc::new(move |raw: RawError| {
            if let Some(inner) = weak.upgrade() {
                Agent { inner }.handle_error(raw);
            }
        })
    }

    fn downgrade(&self) -> Weak<AgentInner> {
        Arc::downgrade(&self.inner)
    }

    fn read_context(&self) -> std::sync::RwLockReadGuard<'_, Context> {
        self.inner.context.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_context(&self) -> std::sync::RwLockWriteGuard<'_, Context> {
        self.inner.context.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_scheduler(&self) -> std::sync::MutexGuard<'_, Option<FlushHandle>> {
        self.inner.scheduler.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for AgentInner {
    fn drop(&mut self) {
        let scheduler = self.scheduler.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Some(handle) = scheduler.take() {
            handle.stop();
        }
    }
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("endpoints", &self.inner.endpoints)
            .field("pending", &self.pending())
            .finish_non_exhaustive()
    }
}
