//! Tracked smtpd Fields
//!
//! A [`TrackedField`] couples one whitelisted `smtpctl` statistic with the
//! counter that publishes it. The last raw total and the live counter handle
//! sit behind a per-field mutex; [`TrackedField::update`] holds it for the
//! whole read-reconcile-publish sequence, so two polls never interleave and a
//! scrape never sees two counters under one name.
//!
//! Scrapes read the registry without taking the field lock. A scrape that
//! lands between unregistering the old counter and registering its
//! replacement sees no sample for that field; the next scrape sees the new
//! counter.

use crate::config::FieldConfig;
use crate::error::Result;
use crate::extractor::FieldPattern;
use crate::metrics::{CounterHandle, MetricRegistry};
use crate::reconciler::{reconcile, Reconciliation};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, warn};

struct FieldState<C> {
    last_raw_value: u64,
    counter: C,
    registered: bool,
}

/// One monitored smtpd statistic.
pub struct TrackedField<R: MetricRegistry> {
    name: String,
    help: String,
    pattern: FieldPattern,
    state: Mutex<FieldState<R::Counter>>,
}

impl<R: MetricRegistry> TrackedField<R> {
    /// Compiles the field's pattern and registers its initial counter.
    pub fn new(config: &FieldConfig, registry: &R) -> Result<Self> {
        let pattern = FieldPattern::new(&config.pattern)?;
        let counter = registry.new_counter(&config.name, &config.help)?;
        registry.register(&counter)?;

        Ok(Self {
            name: config.name.clone(),
            help: config.help.clone(),
            pattern,
            state: Mutex::new(FieldState {
                last_raw_value: 0,
                counter,
                registered: true,
            }),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn help(&self) -> &str {
        &self.help
    }

    pub fn pattern(&self) -> &FieldPattern {
        &self.pattern
    }

    /// Extracts this field's raw total from a `smtpctl` sample.
    pub fn extract(&self, raw: &str) -> Result<u64> {
        self.pattern.extract(raw)
    }

    /// Most recently observed raw total.
    pub fn last_raw_value(&self) -> u64 {
        self.lock().last_raw_value
    }

    /// The counter currently published for this field.
    pub fn counter(&self) -> R::Counter {
        self.lock().counter.clone()
    }

    /// Folds a new raw total into the published counter.
    ///
    /// On reset the old counter is unregistered and a fresh one registered in
    /// its place. If registration fails the stored total is left untouched and
    /// the next poll redoes the whole swap, publishing its total in full on the
    /// new counter whether or not the total dropped again.
    pub fn update(&self, registry: &R, observed: u64) -> Result<Reconciliation> {
        let mut state = self.lock();
        let outcome = if state.registered {
            reconcile(state.last_raw_value, observed)
        } else {
            // an earlier swap failed; the new counter starts from zero
            Reconciliation {
                delta: observed,
                reset: true,
            }
        };

        if outcome.reset {
            warn!(
                metric = %self.name,
                last = state.last_raw_value,
                value = observed,
                "smtpd total went backwards, recreating counter"
            );

            // unregistering goes by name, so this also clears a counter left
            // behind by an earlier failed swap
            if let Err(e) = registry.unregister(&state.counter) {
                warn!(metric = %self.name, error = %e, "could not unregister counter");
            }
            state.registered = false;
            state.counter = registry.new_counter(&self.name, &self.help)?;
            registry.register(&state.counter)?;
            state.registered = true;
        }

        debug!(metric = %self.name, add = outcome.delta, value = observed, "adds value");

        state.counter.add(outcome.delta);
        state.last_raw_value = observed;

        Ok(outcome)
    }

    fn lock(&self) -> MutexGuard<'_, FieldState<R::Counter>> {
        // the guarded state is two plain values that are always consistent
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
