//! Port definitions (hexagonal architecture interfaces)
//!
//! Ports are the boundaries between the normalization core and the
//! mechanisms it does not own. Implementations live in `enlight-agent`
//! or in the host application.
//!
//! ## Ports Overview
//!
//! - [`ITransport`] - Fire-and-forget delivery of JSON batches
//! - [`IStackCapture`] - Turns raised errors into call frames and notifies subscribers

pub mod stack_capture;
pub mod transport;

pub use stack_capture::{CaptureOptions, ErrorHandler, Exception, IStackCapture};
pub use transport::ITransport;
