//! Poll Loop
//!
//! Drives sampler -> extractor -> reconciler -> registry once per tick.
//!
//! # Failure isolation
//!
//! - Sampler failure: logged, `smtpd_up` set to 0, the whole cycle is skipped
//! - Extraction failure: logged, the field observes `0` for this cycle, the
//!   remaining fields are processed as usual
//! - Publishing failure (e.g. duplicate registration during a reset): logged,
//!   only that field is affected
//!
//! The loop sleeps for the full interval after each cycle completes, so a slow
//! `smtpctl` shifts later ticks instead of overlapping them.

use crate::config::FieldConfig;
use crate::error::Result;
use crate::field::TrackedField;
use crate::metrics::MetricRegistry;
use crate::reconciler::Reconciliation;
use crate::sampler::Sampler;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, error, info};

/// What happened to one field during a cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldUpdate {
    pub name: String,
    /// Raw total used for this cycle (`0` when extraction failed).
    pub observed: u64,
    /// `None` when the counter could not be published.
    pub outcome: Option<Reconciliation>,
}

impl FieldUpdate {
    pub fn delta(&self) -> Option<u64> {
        self.outcome.map(|o| o.delta)
    }

    pub fn reset(&self) -> bool {
        self.outcome.is_some_and(|o| o.reset)
    }
}

pub struct Poller<S: Sampler, R: MetricRegistry> {
    sampler: S,
    registry: R,
    fields: Vec<TrackedField<R>>,
    interval: Duration,
}

impl<S: Sampler, R: MetricRegistry> Poller<S, R> {
    /// Builds the tracked fields and registers their counters.
    ///
    /// Fails if a pattern is invalid or a counter cannot be registered; both
    /// are startup errors.
    pub fn new(sampler: S, registry: R, fields: &[FieldConfig], interval: Duration) -> Result<Self> {
        let fields = fields
            .iter()
            .map(|config| {
                debug!(metric = %config.name, pattern = %config.pattern, "tracking field");
                TrackedField::new(config, &registry)
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            sampler,
            registry,
            fields,
            interval,
        })
    }

    pub fn fields(&self) -> &[TrackedField<R>] {
        &self.fields
    }

    pub fn registry(&self) -> &R {
        &self.registry
    }

    pub fn sampler(&self) -> &S {
        &self.sampler
    }

    /// Runs a single cycle.
    ///
    /// Only a sampler failure is returned as an error; per-field problems are
    /// logged and reported in the returned updates.
    pub async fn collect_values(&self) -> Result<Vec<FieldUpdate>> {
        let raw = match self.sampler.sample().await {
            Ok(raw) => raw,
            Err(e) => {
                self.registry.set_up(false);
                return Err(e);
            }
        };
        self.registry.set_up(true);

        let updates = self
            .fields
            .iter()
            .map(|field| {
                let observed = match field.extract(&raw) {
                    Ok(value) => value,
                    Err(e) => {
                        debug!(metric = %field.name(), error = %e, "could not get value");
                        0
                    }
                };

                let outcome = match field.update(&self.registry, observed) {
                    Ok(outcome) => Some(outcome),
                    Err(e) => {
                        error!(metric = %field.name(), error = %e, "could not publish value");
                        None
                    }
                };

                FieldUpdate {
                    name: field.name().to_string(),
                    observed,
                    outcome,
                }
            })
            .collect();

        Ok(updates)
    }

    /// Polls until `shutdown` resolves.
    pub async fn run<F>(&self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        info!(
            "Polling smtpd every {:?} for {} fields",
            self.interval,
            self.fields.len()
        );

        loop {
            if let Err(e) = self.collect_values().await {
                error!("Failed to collect smtpd stats: {}", e);
            }

            tokio::select! {
                _ = &mut shutdown => {
                    info!("Poll loop stopped");
                    return;
                }
                _ = tokio::time::sleep(self.interval) => {}
            }
        }
    }
}
