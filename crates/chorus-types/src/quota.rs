//! Quota allowance types.
//!
//! A `QuotaStatus` is a per-turn snapshot fetched from the quota endpoint.
//! It is never cached across turns -- the gate re-queries before every
//! turn attempt.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Which allowance counter a notice or balance refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuotaTier {
    Standard,
    Pro,
}

impl fmt::Display for QuotaTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuotaTier::Standard => write!(f, "standard"),
            QuotaTier::Pro => write!(f, "pro"),
        }
    }
}

/// Remaining messages on one tier, or the unbounded sentinel.
///
/// Serialized as a plain number, with `null` meaning unlimited (the wire
/// convention of the quota endpoint).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuotaBalance {
    Limited(u32),
    Unlimited,
}

impl QuotaBalance {
    /// Whether the allowance is fully used up.
    pub fn is_exhausted(self) -> bool {
        matches!(self, QuotaBalance::Limited(0))
    }

    /// Whether the allowance sits exactly at the given low-water mark.
    ///
    /// Unlimited balances never trip a threshold.
    pub fn at_threshold(self, threshold: u32) -> bool {
        matches!(self, QuotaBalance::Limited(n) if n == threshold)
    }

    /// The remaining count, when bounded.
    pub fn remaining(self) -> Option<u32> {
        match self {
            QuotaBalance::Limited(n) => Some(n),
            QuotaBalance::Unlimited => None,
        }
    }
}

impl Serialize for QuotaBalance {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.remaining().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for QuotaBalance {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<u32>::deserialize(deserializer)?;
        Ok(match raw {
            Some(n) => QuotaBalance::Limited(n),
            None => QuotaBalance::Unlimited,
        })
    }
}

/// Per-turn snapshot of the caller's remaining allowances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaStatus {
    /// Remaining standard-tier messages.
    pub remaining: QuotaBalance,
    /// Remaining premium-tier messages.
    pub remaining_pro: QuotaBalance,
}
