//! Pre-flight quota gate.
//!
//! Before a turn starts, the gate re-queries the caller's remaining
//! allowance and decides whether the turn may proceed. Exhaustion is
//! terminal for the turn (no retry); crossing the low-water mark is
//! informational only. The check itself has no persistent side effects.

use tracing::{debug, warn};

use chorus_types::config::ChorusConfig;
use chorus_types::error::QuotaError;
use chorus_types::notice::SessionNotice;
use chorus_types::quota::{QuotaStatus, QuotaTier};

use crate::notice::NoticeBus;

/// Trait for the quota endpoint, queried once per turn attempt.
pub trait QuotaSource: Send + Sync {
    /// Fetch the caller's current allowance snapshot.
    fn fetch_quota(
        &self,
        user: &str,
    ) -> impl std::future::Future<Output = Result<QuotaStatus, QuotaError>> + Send;
}

/// Why a turn was not allowed to start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenialReason {
    /// The caller is unauthenticated; the UI should redirect to sign-in.
    SignInRequired,
    /// The standard allowance is used up. Fatal for the turn.
    QuotaExhausted,
    /// The quota endpoint could not be reached; the gate fails closed.
    QuotaUnavailable,
}

/// Outcome of the pre-flight check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnDecision {
    Allowed,
    Denied(DenialReason),
}

impl TurnDecision {
    pub fn is_allowed(self) -> bool {
        matches!(self, TurnDecision::Allowed)
    }
}

/// Pre-flight allowance check with threshold warnings.
///
/// Generic over [`QuotaSource`] so core tests run against a fake source;
/// the HTTP implementation lives in `chorus-infra`.
pub struct QuotaGate<Q> {
    source: Q,
    bus: NoticeBus,
    alert_threshold: u32,
    alert_threshold_pro: u32,
}

impl<Q: QuotaSource> QuotaGate<Q> {
    /// Create a gate with thresholds from configuration.
    pub fn new(source: Q, bus: NoticeBus, config: &ChorusConfig) -> Self {
        Self {
            source,
            bus,
            alert_threshold: config.quota_alert_threshold,
            alert_threshold_pro: config.quota_alert_threshold_pro,
        }
    }

    /// Decide whether a new turn may start for this caller.
    ///
    /// - Unauthenticated callers are denied and a sign-in notice is
    ///   published; the redirect itself belongs to the auth collaborator.
    /// - An exhausted standard allowance denies the turn with exactly one
    ///   terminal notice.
    /// - A balance sitting exactly at its low-water mark allows the turn
    ///   but publishes one informational notice; the standard and pro
    ///   counters are checked independently.
    pub async fn check_and_warn(&self, user: Option<&str>) -> Result<TurnDecision, QuotaError> {
        let Some(user) = user else {
            debug!("unauthenticated turn attempt; signalling sign-in");
            self.bus.publish(SessionNotice::SignInRequired);
            return Ok(TurnDecision::Denied(DenialReason::SignInRequired));
        };

        let status = self.source.fetch_quota(user).await?;

        if status.remaining.is_exhausted() {
            warn!(user, "standard allowance exhausted; turn denied");
            self.bus.publish(SessionNotice::QuotaExhausted {
                tier: QuotaTier::Standard,
            });
            return Ok(TurnDecision::Denied(DenialReason::QuotaExhausted));
        }

        if status.remaining.at_threshold(self.alert_threshold) {
            self.bus.publish(SessionNotice::QuotaLow {
                tier: QuotaTier::Standard,
                remaining: self.alert_threshold,
            });
        }
        if status.remaining_pro.at_threshold(self.alert_threshold_pro) {
            self.bus.publish(SessionNotice::QuotaLow {
                tier: QuotaTier::Pro,
                remaining: self.alert_threshold_pro,
            });
        }

        Ok(TurnDecision::Allowed)
    }
}
