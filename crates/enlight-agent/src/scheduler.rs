//! Flush scheduler - periodic draining of the report and log buffers
//!
//! The [`FlushScheduler`] spawns a Tokio task that invokes a flush callback
//! once per interval. The returned [`FlushHandle`] is the only way to stop
//! it; dropping the handle leaves the task running.
//!
//! ## Flow
//!
//! ```text
//! interval tick ──→ flush() ──→ drain reports ──→ ITransport::submit
//!                          └──→ drain logs    ──→ ITransport::submit
//! ```
//!
//! Intervals shorter than [`MIN_SEND_INTERVAL`] disable periodic flushing
//! entirely; the host then flushes manually.

use std::time::Duration;

use enlight_core::config::MIN_SEND_INTERVAL_MS;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::AgentError;

/// Shortest interval for which a recurring flush is scheduled
pub const MIN_SEND_INTERVAL: Duration = Duration::from_millis(MIN_SEND_INTERVAL_MS);

/// Starts recurring flush tasks
pub struct FlushScheduler;

impl FlushScheduler {
    /// Spawns a task calling `flush` every `interval`
    ///
    /// The first flush happens one full interval after start.
    ///
    /// # Returns
    /// - `Ok(None)` if `interval` is below [`MIN_SEND_INTERVAL`]
    /// - `Ok(Some(handle))` once the task is spawned
    /// - `Err(AgentError::NoRuntime)` if called outside a Tokio runtime
    pub fn start<F>(interval: Duration, flush: F) -> Result<Option<FlushHandle>, AgentError>
    where
        F: Fn() + Send + Sync + 'static,
    {
        if interval < MIN_SEND_INTERVAL {
            info!(
                interval_ms = interval.as_millis() as u64,
                "Send interval below threshold, periodic flushing disabled"
            );
            return Ok(None);
        }

        let runtime = tokio::runtime::Handle::try_current().map_err(|_| AgentError::NoRuntime)?;
        let shutdown = CancellationToken::new();
        let token = shutdown.clone();

        let task = runtime.spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // interval() completes its first tick immediately
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        debug!("Flush tick");
                        flush();
                    }
                    _ = token.cancelled() => {
                        debug!("Flush scheduler cancelled");
                        break;
                    }
                }
            }
        });

        info!(interval_ms = interval.as_millis() as u64, "Periodic flushing scheduled");

        Ok(Some(FlushHandle {
            shutdown,
            task,
            interval,
        }))
    }
}

/// Handle to a running flush task
#[derive(Debug)]
pub struct FlushHandle {
    shutdown: CancellationToken,
    task: JoinHandle<()>,
    interval: Duration,
}

impl FlushHandle {
    /// Cancels the recurring flush; no tick runs after this returns
    /// except one already in progress
    pub fn stop(&self) {
        self.shutdown.cancel();
    }

    /// Cancels and waits for the task to finish
    pub async fn stop_and_wait(self) {
        self.shutdown.cancel();
        let _ = self.task.await;
    }

    pub fn is_running(&self) -> bool {
        !self.shutdown.is_cancelled() && !self.task.is_finished()
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}
