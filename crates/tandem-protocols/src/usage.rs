//! Usage accounting shared across a call tree.
//!
//! A single [`UsageLedger`] is created per top-level run and handed, by
//! reference, to every nested agent invocation. Counters only ever grow and
//! saturate at `u64::MAX` instead of wrapping; saturation is latched and
//! reported through [`UsageSnapshot::overflow`].

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

/// Thread-safe, monotonic resource ledger.
#[derive(Debug, Default)]
pub struct UsageLedger {
    requests_issued: AtomicU64,
    units_consumed: AtomicU64,
    saturated: AtomicBool,
}

impl UsageLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one request that consumed `units`.
    pub fn record(&self, units: u64) {
        let requests_overflowed = saturating_add(&self.requests_issued, 1);
        let units_overflowed = saturating_add(&self.units_consumed, units);
        if requests_overflowed || units_overflowed {
            self.latch_saturation();
        }
    }

    /// Record units without counting a request.
    pub fn record_units(&self, units: u64) {
        if saturating_add(&self.units_consumed, units) {
            self.latch_saturation();
        }
    }

    /// Immutable copy of the current totals.
    pub fn snapshot(&self) -> UsageSnapshot {
        UsageSnapshot {
            requests_issued: self.requests_issued.load(Ordering::Acquire),
            units_consumed: self.units_consumed.load(Ordering::Acquire),
            saturated: self.saturated.load(Ordering::Acquire),
        }
    }

    fn latch_saturation(&self) {
        if !self.saturated.swap(true, Ordering::AcqRel) {
            warn!("Usage ledger saturated; totals are now lower bounds");
        }
    }
}

/// Adds `amount` to `counter`, clamping at `u64::MAX`. Returns true when
/// the addition overflowed.
fn saturating_add(counter: &AtomicU64, amount: u64) -> bool {
    let previous = counter
        .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
            Some(current.saturating_add(amount))
        })
        .unwrap_or_else(|current| current);
    previous.checked_add(amount).is_none()
}

/// Point-in-time copy of a ledger's totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageSnapshot {
    pub requests_issued: u64,
    pub units_consumed: u64,
    /// Set once any counter has hit its maximum.
    #[serde(default)]
    pub saturated: bool,
}

impl UsageSnapshot {
    /// True if every counter is at least the other snapshot's value.
    pub fn covers(&self, other: &UsageSnapshot) -> bool {
        self.requests_issued >= other.requests_issued && self.units_consumed >= other.units_consumed
    }

    /// Consumption since an earlier snapshot of the same ledger.
    pub fn since(&self, earlier: &UsageSnapshot) -> UsageSnapshot {
        UsageSnapshot {
            requests_issued: self.requests_issued.saturating_sub(earlier.requests_issued),
            units_consumed: self.units_consumed.saturating_sub(earlier.units_consumed),
            saturated: self.saturated,
        }
    }

    /// Non-fatal warning when the totals were clamped.
    pub fn overflow(&self) -> Option<LedgerOverflow> {
        self.saturated.then_some(LedgerOverflow {
            requests_issued: self.requests_issued,
            units_consumed: self.units_consumed,
        })
    }
}

/// Warning raised when a ledger counter saturated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error(
    "usage ledger saturated at {requests_issued} requests / {units_consumed} units; totals are lower bounds"
)]
pub struct LedgerOverflow {
    pub requests_issued: u64,
    pub units_consumed: u64,
}

#[cfg(test)]
#[path = "usage_tests.rs"]
mod tests;
