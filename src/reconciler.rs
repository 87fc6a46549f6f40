//! Counter Reconciliation
//!
//! `smtpctl` reports cumulative totals since smtpd started. Prometheus counters
//! only move forward, so each poll turns the latest total into an increment:
//!
//! | Condition                          | Delta        | Reset |
//! |------------------------------------|--------------|-------|
//! | `observed < last`                  | `observed`   | yes   |
//! | `last == 0` or `observed == 0`     | `observed`   | no    |
//! | otherwise                          | `observed - last` | no |
//!
//! A reset means smtpd restarted; the caller replaces the published counter
//! with a fresh one so the series starts over at `observed`.

/// Outcome of reconciling one observation against the stored total.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reconciliation {
    /// Increment to add to the published counter.
    pub delta: u64,
    /// The daemon's total went backwards and the counter must be recreated.
    pub reset: bool,
}

/// Computes the increment for `observed` given the previous raw total `last`.
///
/// Never fails and never produces a negative increment.
pub fn reconcile(last: u64, observed: u64) -> Reconciliation {
    if observed < last {
        return Reconciliation {
            delta: observed,
            reset: true,
        };
    }

    if last == 0 || observed == 0 {
        return Reconciliation {
            delta: observed,
            reset: false,
        };
    }

    Reconciliation {
        delta: observed - last,
        reset: false,
    }
}
