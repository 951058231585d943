//! Turn orchestrator tying the quota gate, registry cache, and session
//! pool together.
//!
//! Control flow for one user turn: quota gate approves -> the selected
//! model ids are resolved against the registry (capability eligibility
//! decided before any slot is opened) -> the pool maps them onto slots
//! -> every freshly resolved slot gets the new user message appended and
//! starts streaming independently.

use std::sync::Arc;

use tracing::{debug, warn};

use chorus_types::config::ChorusConfig;
use chorus_types::model::ModelDescriptor;
use chorus_types::notice::SessionNotice;
use tokio::sync::broadcast;

use crate::notice::NoticeBus;
use crate::quota::{DenialReason, QuotaGate, QuotaSource, TurnDecision};
use crate::registry::{ModelCatalog, ModelRegistryCache};
use crate::session::{SessionHandle, SessionPool};
use crate::transport::ChatTransport;

/// One user turn: who is asking, which models, and what they said.
#[derive(Debug, Clone)]
pub struct TurnRequest<'a> {
    /// Authenticated user identifier, or `None` when signed out.
    pub user: Option<&'a str>,
    /// Selected model identifiers, in display order.
    pub model_ids: &'a [String],
    /// The user's message.
    pub content: &'a str,
    /// Whether the turn carries image input (restricts eligibility to
    /// vision-capable models).
    pub needs_vision: bool,
}

/// Result of attempting to start a turn.
pub enum TurnOutcome {
    /// The turn was blocked before any slot was touched.
    Denied(DenialReason),
    /// Streams were started; one handle per resolved slot (stale handles
    /// included so the caller can keep observing draining streams).
    Started(Vec<SessionHandle>),
}

/// The multi-model chat session manager.
///
/// Owns the registry cache, quota gate, pool, and notice bus. One
/// instance per multi-session view; [`ChorusService::shutdown`] cancels
/// every in-flight stream when the view unmounts.
pub struct ChorusService<C, Q> {
    registry: ModelRegistryCache<C>,
    quota: QuotaGate<Q>,
    pool: SessionPool,
    bus: NoticeBus,
}

impl<C, Q> ChorusService<C, Q>
where
    C: ModelCatalog + 'static,
    Q: QuotaSource,
{
    /// Wire up the core from its three collaborators and configuration.
    pub fn new(
        catalog: C,
        quota_source: Q,
        transport: Arc<dyn ChatTransport>,
        config: &ChorusConfig,
    ) -> Self {
        let bus = NoticeBus::default();
        Self {
            registry: ModelRegistryCache::from_config(catalog, config),
            quota: QuotaGate::new(quota_source, bus.clone(), config),
            pool: SessionPool::new(transport, bus.clone()),
            bus,
        }
    }

    /// Subscribe to user-facing notices (quota warnings, slot failures).
    pub fn notices(&self) -> broadcast::Receiver<SessionNotice> {
        self.bus.subscribe()
    }

    /// The registry cache (e.g., for a model-picker UI).
    pub fn registry(&self) -> &ModelRegistryCache<C> {
        &self.registry
    }

    /// The session pool (e.g., for rendering slot snapshots).
    pub fn pool(&self) -> &SessionPool {
        &self.pool
    }

    /// Run one user turn end to end.
    ///
    /// Quota failures deny the turn (fail closed) rather than erroring;
    /// per-slot append failures are logged and skipped without affecting
    /// sibling slots.
    pub async fn begin_turn(&self, turn: TurnRequest<'_>) -> TurnOutcome {
        let decision = match self.quota.check_and_warn(turn.user).await {
            Ok(decision) => decision,
            Err(err) => {
                warn!(error = %err, "quota check failed; denying turn");
                return TurnOutcome::Denied(DenialReason::QuotaUnavailable);
            }
        };
        if let TurnDecision::Denied(reason) = decision {
            return TurnOutcome::Denied(reason);
        }

        let selected = self.select_models(turn.model_ids, turn.needs_vision).await;
        let handles = self.pool.resolve(&selected);

        for handle in &handles {
            if handle.is_stale() {
                continue;
            }
            if let Err(err) = handle.append(turn.content) {
                // A busy slot stays on its current stream; the user sees
                // its in-progress answer rather than a dropped one.
                warn!(slot = handle.index(), error = %err, "append skipped");
            }
        }

        TurnOutcome::Started(handles)
    }

    /// Resolve selected ids against the registry, keeping input order and
    /// dropping unknown or ineligible models.
    async fn select_models(&self, model_ids: &[String], needs_vision: bool) -> Vec<ModelDescriptor> {
        let available = self.registry.get_models().await;
        let mut selected = Vec::with_capacity(model_ids.len());
        for id in model_ids {
            match available.iter().find(|m| &m.id == id) {
                Some(model) if model.eligible(needs_vision) => selected.push(model.clone()),
                Some(model) => {
                    debug!(model = %model.id, needs_vision, "model not eligible for this turn");
                }
                None => {
                    debug!(model = %id, "selected model not in registry");
                }
            }
        }
        selected
    }

    /// Tear down the view: cancel every in-flight stream.
    pub fn shutdown(&self) {
        self.pool.shutdown();
    }
}
