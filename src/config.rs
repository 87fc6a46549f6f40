use crate::error::{ExporterError, Result};
use crate::extractor::FieldPattern;
use anyhow::Context;
use regex::Regex;
use serde::Deserialize;
use std::collections::HashSet;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub poll: PollConfig,
    pub sampler: SamplerConfig,
    #[serde(default = "default_fields")]
    pub fields: Vec<FieldConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PollConfig {
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SamplerConfig {
    #[serde(default = "default_command")]
    pub command: String,
    #[serde(default = "default_args")]
    pub args: Vec<String>,
    /// Falls back to the poll interval when unset.
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct FieldConfig {
    pub name: String,
    pub help: String,
    pub pattern: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            poll: PollConfig::default(),
            sampler: SamplerConfig::default(),
            fields: default_fields(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
        }
    }
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            command: default_command(),
            args: default_args(),
            timeout_ms: None,
        }
    }
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    9967
}

fn default_interval_ms() -> u64 {
    1000
}

fn default_command() -> String {
    "smtpctl".to_string()
}

fn default_args() -> Vec<String> {
    vec!["show".to_string(), "stats".to_string()]
}

/// The delivery counters exported when no `[[fields]]` are configured.
pub fn default_fields() -> Vec<FieldConfig> {
    vec![
        FieldConfig {
            name: "smtpd_delivery_ok".to_string(),
            help: "Shows how often a delivery was ok.".to_string(),
            pattern: r"scheduler\.delivery\.ok=(?P<number>\d+)".to_string(),
        },
        FieldConfig {
            name: "smtpd_delivery_permfail".to_string(),
            help: "Shows how often a delivery permafailed.".to_string(),
            pattern: r"scheduler\.delivery\.permfail=(?P<number>\d+)".to_string(),
        },
        FieldConfig {
            name: "smtpd_delivery_tempfail".to_string(),
            help: "Shows how often a delivery tempfailed.".to_string(),
            pattern: r"scheduler\.delivery\.tempfail=(?P<number>\d+)".to_string(),
        },
    ]
}

impl Config {
    pub fn load(path: &str) -> anyhow::Result<Self> {
        // Load environment variables from .env if present
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix("SMTPD_EXPORTER")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to build configuration")?;

        let mut config: Config = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        // an explicit empty list is treated as "not configured"
        if config.fields.is_empty() {
            config.fields = default_fields();
        }

        Ok(config)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.poll.interval_ms)
    }

    /// Checks everything that can be checked without a live sample.
    pub fn validate(&self) -> Result<()> {
        if self.poll.interval_ms == 0 {
            return Err(ExporterError::Config(
                "poll interval must be greater than zero".to_string(),
            ));
        }

        if self.sampler.command.trim().is_empty() {
            return Err(ExporterError::Config(
                "sampler command must not be empty".to_string(),
            ));
        }

        if self.sampler.timeout_ms == Some(0) {
            return Err(ExporterError::Config(
                "sampler timeout must be greater than zero".to_string(),
            ));
        }

        if self.fields.is_empty() {
            return Err(ExporterError::Config(
                "at least one field must be configured".to_string(),
            ));
        }

        let metric_name = Regex::new("^[a-zA-Z_:][a-zA-Z0-9_:]*$")
            .map_err(|e| ExporterError::Config(e.to_string()))?;
        let mut seen = HashSet::new();

        for field in &self.fields {
            if !metric_name.is_match(&field.name) {
                return Err(ExporterError::Config(format!(
                    "invalid metric name '{}'",
                    field.name
                )));
            }
            if !seen.insert(field.name.as_str()) {
                return Err(ExporterError::Config(format!(
                    "duplicate field name '{}'",
                    field.name
                )));
            }
            FieldPattern::new(&field.pattern)?;
        }

        Ok(())
    }
}

/// Parses a poll interval: `500ms`, `1s`, `2m`, `1h`, or bare seconds (`1.5`).
pub fn parse_duration(input: &str) -> std::result::Result<Duration, String> {
    let input = input.trim();
    let (number, unit) = match input.find(|c: char| c.is_ascii_alphabetic()) {
        Some(idx) => input.split_at(idx),
        None => (input, "s"),
    };

    let value: f64 = number
        .trim()
        .parse()
        .map_err(|_| format!("invalid duration '{}'", input))?;
    if !value.is_finite() || value < 0.0 {
        return Err(format!("invalid duration '{}'", input));
    }

    let seconds = match unit {
        "ms" => value / 1000.0,
        "s" => value,
        "m" => value * 60.0,
        "h" => value * 3600.0,
        other => return Err(format!("unknown duration unit '{}' in '{}'", other, input)),
    };

    Duration::try_from_secs_f64(seconds).map_err(|e| format!("invalid duration '{}': {}", input, e))
}
