use super::{CounterHandle, MetricRegistry};
use crate::error::{ExporterError, Result};
use std::collections::BTreeMap;
use std::fmt::Write;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Counter handle for [`InMemoryRegistry`].
///
/// Every call to `new_counter` hands out a fresh `id`, so tests can tell a
/// recreated counter apart from the one it replaced.
#[derive(Clone, Debug)]
pub struct InMemoryCounter {
    id: u64,
    name: Arc<str>,
    help: Arc<str>,
    value: Arc<AtomicU64>,
}

impl InMemoryCounter {
    pub fn id(&self) -> u64 {
        self.id
    }
}

impl CounterHandle for InMemoryCounter {
    fn name(&self) -> &str {
        &self.name
    }

    fn add(&self, delta: u64) {
        self.value.fetch_add(delta, Ordering::Relaxed);
    }

    fn get(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }
}

/// Deterministic registry for tests.
#[derive(Clone, Default)]
pub struct InMemoryRegistry {
    next_id: Arc<AtomicU64>,
    registered: Arc<Mutex<BTreeMap<String, InMemoryCounter>>>,
    up: Arc<AtomicBool>,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn counters(&self) -> MutexGuard<'_, BTreeMap<String, InMemoryCounter>> {
        self.registered.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The counter currently registered under `name`, if any.
    pub fn registered(&self, name: &str) -> Option<InMemoryCounter> {
        self.counters().get(name).cloned()
    }

    /// Published value of the counter registered under `name`.
    pub fn value(&self, name: &str) -> Option<u64> {
        self.registered(name).map(|c| c.get())
    }

    /// Number of counters handed out so far, registered or not.
    pub fn created(&self) -> u64 {
        self.next_id.load(Ordering::Relaxed)
    }
}

impl MetricRegistry for InMemoryRegistry {
    type Counter = InMemoryCounter;

    fn new_counter(&self, name: &str, help: &str) -> Result<InMemoryCounter> {
        if name.is_empty() {
            return Err(ExporterError::Config("counter name is empty".to_string()));
        }

        Ok(InMemoryCounter {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            name: Arc::from(name),
            help: Arc::from(help),
            value: Arc::new(AtomicU64::new(0)),
        })
    }

    fn register(&self, counter: &InMemoryCounter) -> Result<()> {
        let mut counters = self.counters();
        if counters.contains_key(counter.name()) {
            return Err(ExporterError::DuplicateRegistration(
                counter.name().to_string(),
            ));
        }
        counters.insert(counter.name().to_string(), counter.clone());
        Ok(())
    }

    fn unregister(&self, counter: &InMemoryCounter) -> Result<()> {
        match self.counters().remove(counter.name()) {
            Some(_) => Ok(()),
            None => Err(ExporterError::NotRegistered(counter.name().to_string())),
        }
    }

    fn set_up(&self, up: bool) {
        self.up.store(up, Ordering::Relaxed);
    }

    fn is_up(&self) -> bool {
        self.up.load(Ordering::Relaxed)
    }

    fn render(&self) -> Result<String> {
        let mut out = String::new();
        let up = u8::from(self.is_up());
        let _ = writeln!(
            out,
            "# HELP smtpd_up Whether the last smtpctl invocation succeeded (1=yes, 0=no)"
        );
        let _ = writeln!(out, "# TYPE smtpd_up gauge");
        let _ = writeln!(out, "smtpd_up {}", up);

        for (name, counter) in self.counters().iter() {
            let _ = writeln!(out, "# HELP {} {}", name, counter.help);
            let _ = writeln!(out, "# TYPE {} counter", name);
            let _ = writeln!(out, "{} {}", name, counter.get());
        }

        Ok(out)
    }
}
