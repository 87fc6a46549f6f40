use super::{CounterHandle, MetricRegistry};
use crate::error::{ExporterError, Result};
use prometheus::{Encoder, IntCounter, IntGauge, Opts, Registry, TextEncoder};
use std::sync::Arc;

/// Counter handle backed by a `prometheus::IntCounter`.
#[derive(Clone)]
pub struct PrometheusCounter {
    name: Arc<str>,
    inner: IntCounter,
}

impl CounterHandle for PrometheusCounter {
    fn name(&self) -> &str {
        &self.name
    }

    fn add(&self, delta: u64) {
        self.inner.inc_by(delta);
    }

    fn get(&self) -> u64 {
        self.inner.get()
    }
}

/// Metric registry served on `/metrics`.
#[derive(Clone)]
pub struct PrometheusRegistry {
    registry: Arc<Registry>,
    up: IntGauge,
}

impl PrometheusRegistry {
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let up = IntGauge::with_opts(
            Opts::new(
                "up",
                "Whether the last smtpctl invocation succeeded (1=yes, 0=no)",
            )
            .namespace("smtpd"),
        )?;
        registry.register(Box::new(up.clone()))?;

        Ok(Self {
            registry: Arc::new(registry),
            up,
        })
    }
}

impl MetricRegistry for PrometheusRegistry {
    type Counter = PrometheusCounter;

    fn new_counter(&self, name: &str, help: &str) -> Result<PrometheusCounter> {
        let inner = IntCounter::with_opts(Opts::new(name, help))?;
        Ok(PrometheusCounter {
            name: Arc::from(name),
            inner,
        })
    }

    fn register(&self, counter: &PrometheusCounter) -> Result<()> {
        self.registry
            .register(Box::new(counter.inner.clone()))
            .map_err(|e| match e {
                prometheus::Error::AlreadyReg => {
                    ExporterError::DuplicateRegistration(counter.name.to_string())
                }
                other => other.into(),
            })
    }

    fn unregister(&self, counter: &PrometheusCounter) -> Result<()> {
        self.registry.unregister(Box::new(counter.inner.clone()))?;
        Ok(())
    }

    fn set_up(&self, up: bool) {
        self.up.set(i64::from(up));
    }

    fn is_up(&self) -> bool {
        self.up.get() > 0
    }

    fn render(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| ExporterError::Server(e.to_string()))
    }
}
