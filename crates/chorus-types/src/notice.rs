//! User-facing side-channel notices.
//!
//! Notices are the only way failures and warnings leave the core: the
//! quota gate, pool manager, and slot controllers publish them on a
//! broadcast bus, and the UI layer (an external collaborator) renders
//! them as toasts/banners.

use serde::{Deserialize, Serialize};

use crate::quota::QuotaTier;

/// A notification destined for the user, published on the notice bus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SessionNotice {
    /// The caller is unauthenticated; the UI should redirect to sign-in.
    SignInRequired,

    /// Daily limit reached on a tier. Terminal for the current turn.
    QuotaExhausted { tier: QuotaTier },

    /// Remaining allowance crossed the low-water mark. Informational.
    QuotaLow { tier: QuotaTier, remaining: u32 },

    /// One slot's stream failed; attributed to that model by display name.
    SlotFailed {
        index: usize,
        model_name: String,
        message: String,
    },

    /// More models were requested than the pool holds; the excess was
    /// dropped at the boundary.
    CapacityTruncated { requested: usize, capacity: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notice_serde_tagging() {
        let notice = SessionNotice::QuotaLow {
            tier: QuotaTier::Standard,
            remaining: 5,
        };
        let json = serde_json::to_string(&notice).unwrap();
        assert_eq!(json, r#"{"kind":"quota_low","tier":"standard","remaining":5}"#);
        let parsed: SessionNotice = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, notice);
    }

    #[test]
    fn slot_failed_carries_attribution() {
        let notice = SessionNotice::SlotFailed {
            index: 1,
            model_name: "Claude Sonnet 4".to_string(),
            message: "connection reset".to_string(),
        };
        let json = serde_json::to_string(&notice).unwrap();
        assert!(json.contains("Claude Sonnet 4"));
        assert!(json.contains("slot_failed"));
    }
}
