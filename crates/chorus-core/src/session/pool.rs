//! Session pool manager.
//!
//! Owns a fixed arena of `POOL_CAPACITY` slot controllers, allocated up
//! front and never individually destroyed, and maps the active model
//! list onto a prefix of them. Slot index identity is stable: slot *i*
//! keeps its transcript and cancellation handle for as long as the same
//! model stays mounted there, and a mid-stream slot is never silently
//! reassigned to a different model.

use std::sync::Arc;

use tracing::warn;

use chorus_types::POOL_CAPACITY;
use chorus_types::chat::SlotSnapshot;
use chorus_types::error::SessionError;
use chorus_types::model::ModelDescriptor;
use chorus_types::notice::SessionNotice;

use crate::notice::NoticeBus;
use crate::session::slot::SlotController;
use crate::transport::ChatTransport;

/// Caller-facing handle to one resolved slot.
///
/// A *stale* handle refers to a slot whose model has left the active
/// set; it supports `stop` and snapshots, but an `append` on it always
/// fails with `SlotBusy` — even once the drain finishes, a deselected
/// model must not be restarted through a retained handle.
pub struct SessionHandle {
    slot: Arc<SlotController>,
    transport: Arc<dyn ChatTransport>,
    stale: bool,
}

impl SessionHandle {
    /// Fixed index of the underlying slot.
    pub fn index(&self) -> usize {
        self.slot.index()
    }

    /// Whether this handle refers to a draining, no-longer-active stream.
    pub fn is_stale(&self) -> bool {
        self.stale
    }

    /// Start or continue an exchange on this slot.
    ///
    /// Refused on a stale handle regardless of the slot's state.
    pub fn append(&self, content: &str) -> Result<(), SessionError> {
        if self.stale {
            return Err(SessionError::SlotBusy {
                index: self.slot.index(),
            });
        }
        self.slot.append(&self.transport, content)
    }

    /// Cancel the slot's in-flight request, keeping the partial
    /// transcript. Idempotent no-op when the slot is not streaming.
    pub fn stop(&self) {
        self.slot.stop();
    }

    /// Read-only snapshot of model, transcript, and state.
    pub fn current_state(&self) -> SlotSnapshot {
        self.slot.snapshot()
    }
}

/// Fixed-capacity pool of independent model sessions.
///
/// The slot array is the only shared structure; it is mutated solely by
/// `resolve` (model assignment/clearing) and by each slot's own stream
/// controller. Constructed once per multi-session view and torn down
/// with [`SessionPool::shutdown`].
pub struct SessionPool {
    slots: Vec<Arc<SlotController>>,
    transport: Arc<dyn ChatTransport>,
    bus: NoticeBus,
}

impl SessionPool {
    /// Allocate all `POOL_CAPACITY` slots up front, empty.
    pub fn new(transport: Arc<dyn ChatTransport>, bus: NoticeBus) -> Self {
        let slots = (0..POOL_CAPACITY)
            .map(|index| Arc::new(SlotController::new(index, bus.clone())))
            .collect();
        Self {
            slots,
            transport,
            bus,
        }
    }

    /// Map the active model list onto the slot arena.
    ///
    /// - Input beyond `POOL_CAPACITY` is truncated at the boundary with a
    ///   warning notice (never queued, never an error).
    /// - Slot *i* is reassigned to `active[i]` only if it is not
    ///   mid-stream for a different model; otherwise the draining slot's
    ///   handle is returned in place, flagged stale, and the requested
    ///   model mounts on a later `resolve` once the slot frees.
    /// - Slots past the active prefix are cleared when idle and returned
    ///   as trailing stale handles while still streaming.
    ///
    /// Idempotent: resolving the same list twice mutates nothing.
    pub fn resolve(&self, active: &[ModelDescriptor]) -> Vec<SessionHandle> {
        let active = if active.len() > POOL_CAPACITY {
            warn!(
                requested = active.len(),
                capacity = POOL_CAPACITY,
                "active model list exceeds pool capacity; truncating"
            );
            self.bus.publish(SessionNotice::CapacityTruncated {
                requested: active.len(),
                capacity: POOL_CAPACITY,
            });
            &active[..POOL_CAPACITY]
        } else {
            active
        };

        let mut handles = Vec::with_capacity(active.len());
        for (slot, model) in self.slots.iter().zip(active) {
            let assigned = slot.try_assign(model);
            handles.push(SessionHandle {
                slot: Arc::clone(slot),
                transport: Arc::clone(&self.transport),
                stale: !assigned,
            });
        }

        for slot in &self.slots[active.len()..] {
            if slot.is_streaming() {
                handles.push(SessionHandle {
                    slot: Arc::clone(slot),
                    transport: Arc::clone(&self.transport),
                    stale: true,
                });
            } else if slot.model_id().is_some() {
                slot.clear();
            }
        }

        handles
    }

    /// Number of slots currently holding a model. Always `<= POOL_CAPACITY`.
    pub fn populated_count(&self) -> usize {
        self.slots.iter().filter(|s| s.model_id().is_some()).count()
    }

    /// Snapshots of every slot in the arena, populated or not.
    pub fn snapshots(&self) -> Vec<SlotSnapshot> {
        self.slots.iter().map(|s| s.snapshot()).collect()
    }

    /// Tear the pool down: cancel every in-flight stream.
    ///
    /// Called when the multi-session view unmounts. Slots keep their
    /// transcripts; only the streams are cancelled.
    pub fn shutdown(&self) {
        for slot in &self.slots {
            slot.stop();
        }
    }
}
