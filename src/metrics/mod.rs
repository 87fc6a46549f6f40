//! Prometheus Metrics Registry
//!
//! The poll loop publishes through two small capabilities instead of a global
//! registry, so tests can swap in a deterministic double:
//!
//! - [`MetricRegistry`] - creates, registers, unregisters and renders counters
//! - [`CounterHandle`] - one live counter that only moves forward
//!
//! # Implementations
//!
//! - [`PrometheusRegistry`] - backed by `prometheus::Registry`, served on `/metrics`
//! - [`InMemoryRegistry`] - plain atomics, used by tests
//!
//! # Metric Types
//!
//! - **IntCounter**: one per tracked smtpd field (e.g. `smtpd_delivery_ok`)
//! - **IntGauge**: `smtpd_up` (1 if the last `smtpctl` call succeeded, 0 otherwise)
//!
//! Counter increments are `u64`, so a negative delta cannot be expressed.

use crate::error::Result;

mod memory;
mod registry;

pub use memory::{InMemoryCounter, InMemoryRegistry};
pub use registry::{PrometheusCounter, PrometheusRegistry};

/// A single published counter.
///
/// Reads and increments are atomic; a scrape may run concurrently with `add`.
pub trait CounterHandle: Clone + Send + Sync + 'static {
    /// Metric name this counter is published under.
    fn name(&self) -> &str;

    /// Increments the published value.
    fn add(&self, delta: u64);

    /// Current published value.
    fn get(&self) -> u64;
}

/// The set of counters visible to scrapers.
pub trait MetricRegistry: Send + Sync + 'static {
    type Counter: CounterHandle;

    /// Creates a zero-valued counter that is not yet visible to scrapers.
    fn new_counter(&self, name: &str, help: &str) -> Result<Self::Counter>;

    /// Makes `counter` visible.
    ///
    /// Fails with `ExporterError::DuplicateRegistration` if a counter with the
    /// same name is already registered.
    fn register(&self, counter: &Self::Counter) -> Result<()>;

    /// Removes the counter registered under `counter`'s name.
    fn unregister(&self, counter: &Self::Counter) -> Result<()>;

    /// Records whether the last sample succeeded.
    fn set_up(&self, up: bool);

    fn is_up(&self) -> bool;

    /// Renders all registered metrics in the Prometheus text format.
    fn render(&self) -> Result<String>;
}
