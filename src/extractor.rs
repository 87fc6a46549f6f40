//! Field Extraction
//!
//! Pulls a single integer out of the plain-text `smtpctl show stats` output.
//!
//! Every tracked field carries a regular expression with exactly one capturing
//! group, e.g. `scheduler\.delivery\.ok=(?P<number>\d+)`. The group's text must
//! parse as a non-negative base-10 integer.
//!
//! # Example
//!
//! ```
//! use smtpd_exporter::extractor::FieldPattern;
//!
//! let pattern = FieldPattern::new(r"scheduler\.delivery\.ok=(\d+)").unwrap();
//! let value = pattern.extract("scheduler.delivery.ok=5318\n").unwrap();
//! assert_eq!(value, 5318);
//! ```

use crate::error::{ExporterError, Result};
use regex::Regex;

/// A compiled extraction pattern with exactly one capturing group.
#[derive(Debug, Clone)]
pub struct FieldPattern {
    regex: Regex,
}

impl FieldPattern {
    /// Compiles and validates a pattern.
    ///
    /// Fails with [`ExporterError::PatternInvalid`] if the expression does not
    /// compile or does not declare exactly one capturing group. This runs at
    /// startup so a broken pattern never needs a live sample to be noticed.
    pub fn new(pattern: &str) -> Result<Self> {
        let regex = Regex::new(pattern).map_err(|e| ExporterError::PatternInvalid {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })?;

        // captures_len() counts the implicit whole-match group
        let groups = regex.captures_len() - 1;
        if groups != 1 {
            return Err(ExporterError::PatternInvalid {
                pattern: pattern.to_string(),
                reason: format!("expected exactly one capturing group, found {}", groups),
            });
        }

        Ok(Self { regex })
    }

    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    /// Extracts the captured integer from `raw`.
    ///
    /// The first match wins. Returns [`ExporterError::FieldNotFound`] when the
    /// pattern does not match or its group did not participate, and
    /// [`ExporterError::ValueNotInteger`] when the captured text is not a
    /// non-negative integer.
    pub fn extract(&self, raw: &str) -> Result<u64> {
        let captured = self
            .regex
            .captures(raw)
            .and_then(|caps| caps.get(1))
            .ok_or_else(|| ExporterError::FieldNotFound(self.regex.as_str().to_string()))?;

        let text = captured.as_str();
        if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ExporterError::ValueNotInteger(text.to_string()));
        }

        text.parse::<u64>()
            .map_err(|_| ExporterError::ValueNotInteger(text.to_string()))
    }
}

/// Compiles `pattern` and extracts its value from `raw` in one step.
///
/// Prefer [`FieldPattern`] on hot paths; this recompiles on every call.
pub fn extract(pattern: &str, raw: &str) -> Result<u64> {
    FieldPattern::new(pattern)?.extract(raw)
}
