//! Enlight Core - Domain logic for the client-side telemetry agent
//!
//! This crate contains the hexagonal architecture core with:
//! - **Domain entities** - `Context`, `RawError`, `Report`, `TracebackLine`, `LogEntry`
//! - **Use cases** - `ReportNormalizer`, `LogNormalizer`
//! - **Port definitions** - Traits for adapters: `ITransport`, `IStackCapture`
//!
//! # Architecture
//!
//! The domain module holds the wire schema and its invariants with no
//! runtime dependencies. Ports define the trait interfaces implemented by
//! `enlight-agent` (HTTP transport, panic-hook stack capture). Use cases
//! turn captured errors and log calls into canonical wire entries.

pub mod config;
pub mod domain;
pub mod ports;
pub mod usecases;
