//! OpenSMTPD Prometheus Exporter
//!
//! Periodically runs `smtpctl show stats`, picks a few delivery totals out of
//! its output and republishes them as Prometheus counters.
//!
//! # Overview
//!
//! smtpd only reports cumulative totals since it started, and those totals
//! drop back to zero when the daemon restarts. The exporter turns each new
//! total into an increment so the published counters never go backwards and
//! never spike after a restart.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐  smtpctl show stats  ┌──────────────────────┐
//! │   smtpd     │ ◄─────────────────── │       Exporter       │
//! └─────────────┘      (stdout)        │                      │
//!                                      │  Sampler             │
//!                                      │    └─► Extractor     │      HTTP      ┌────────────┐
//!                                      │          └─► Fields  │ ◄────────────► │ Prometheus │
//!                                      │               └─► Registry  /metrics  └────────────┘
//!                                      └──────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`sampler`] - runs the status command
//! - [`extractor`] - regex extraction of integer fields
//! - [`reconciler`] - turns cumulative totals into counter increments
//! - [`field`] - per-field state guarded by its own lock
//! - [`metrics`] - registry capabilities and their implementations
//! - [`poller`] - the poll loop
//! - [`server`] - HTTP server
//! - [`config`] - configuration management
//! - [`error`] - error types
//!
//! # Quick Start
//!
//! ```no_run
//! use smtpd_exporter::{config::Config, server};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config/Default.toml")?;
//!     server::start(config).await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod extractor;
pub mod field;
pub mod metrics;
pub mod poller;
pub mod reconciler;
pub mod sampler;
pub mod server;
