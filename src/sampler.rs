//! smtpd Statistics Sampler
//!
//! Runs the status command (`smtpctl show stats` by default) and hands back its
//! standard output verbatim. No retries happen here; the poll loop simply tries
//! again on its next tick.

use crate::config::SamplerConfig;
use crate::error::{ExporterError, Result};
use std::collections::VecDeque;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

/// Source of raw smtpd statistics text.
pub trait Sampler: Send + Sync + 'static {
    fn sample(&self) -> impl Future<Output = Result<String>> + Send;
}

/// Spawns the configured status command once per call.
#[derive(Debug, Clone)]
pub struct CommandSampler {
    command: String,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandSampler {
    pub fn new(command: impl Into<String>, args: Vec<String>, timeout: Duration) -> Self {
        Self {
            command: command.into(),
            args,
            timeout,
        }
    }

    /// Builds a sampler from config. Without an explicit timeout the command
    /// may run for at most one poll interval.
    pub fn from_config(config: &SamplerConfig, interval: Duration) -> Self {
        let timeout = config
            .timeout_ms
            .map(Duration::from_millis)
            .unwrap_or(interval);
        Self::new(config.command.clone(), config.args.clone(), timeout)
    }

    fn command_line(&self) -> String {
        std::iter::once(self.command.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl Sampler for CommandSampler {
    async fn sample(&self) -> Result<String> {
        let mut cmd = Command::new(&self.command);
        cmd.args(&self.args).kill_on_drop(true);

        let output = tokio::time::timeout(self.timeout, cmd.output())
            .await
            .map_err(|_| ExporterError::SamplerTimeout(self.timeout))?
            .map_err(|e| {
                ExporterError::Sampler(format!("failed to run '{}': {}", self.command_line(), e))
            })?;

        if !output.status.success() {
            return Err(ExporterError::Sampler(format!(
                "'{}' exited with {}: {}",
                self.command_line(),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let out = String::from_utf8_lossy(&output.stdout).into_owned();
        debug!(command = %self.command_line(), "{}", out);

        Ok(out)
    }
}

/// Scripted sampler for tests.
///
/// Replays queued responses in order. The last response is repeated once the
/// queue is down to one entry; an empty script fails every call.
#[derive(Debug, Default)]
pub struct StaticSampler {
    script: Mutex<VecDeque<std::result::Result<String, String>>>,
    calls: AtomicUsize,
}

impl StaticSampler {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sampler that always returns `output`.
    pub fn with_output(output: impl Into<String>) -> Self {
        let sampler = Self::new();
        sampler.push_output(output);
        sampler
    }

    pub fn push_output(&self, output: impl Into<String>) {
        self.script().push_back(Ok(output.into()));
    }

    pub fn push_failure(&self, reason: impl Into<String>) {
        self.script().push_back(Err(reason.into()));
    }

    /// Number of times `sample` has been called.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }

    fn script(&self) -> std::sync::MutexGuard<'_, VecDeque<std::result::Result<String, String>>> {
        self.script.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn next(&self) -> Result<String> {
        self.calls.fetch_add(1, Ordering::Relaxed);

        let mut script = self.script();
        let next = if script.len() > 1 {
            script.pop_front()
        } else {
            script.front().cloned()
        };

        match next {
            Some(Ok(output)) => Ok(output),
            Some(Err(reason)) => Err(ExporterError::Sampler(reason)),
            None => Err(ExporterError::Sampler("no scripted output".to_string())),
        }
    }
}

impl Sampler for StaticSampler {
    fn sample(&self) -> impl Future<Output = Result<String>> + Send {
        let next = self.next();
        async move { next }
    }
}
