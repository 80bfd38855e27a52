//! Bridge between player status changes and the subscriber registry.
//!
//! The [`StatusBroadcaster`] sits at the boundary between the player and the
//! event-stream transport: it encodes a snapshot once and offers the frame to
//! every registered subscriber.

use std::sync::Arc;

use super::emitter::StatusEmitter;
use super::registry::{Frame, PublishOutcome, SubscriberRegistry};
use crate::error::{ControlError, ControlResult};
use crate::player::StatusSnapshot;

/// Publishes status snapshots to every event-stream subscriber.
///
/// Cheap to clone; clones share the same registry.
#[derive(Clone)]
pub struct StatusBroadcaster {
    registry: Arc<SubscriberRegistry>,
}

impl StatusBroadcaster {
    /// Creates a broadcaster with a fresh registry.
    pub fn new() -> Self {
        Self::with_registry(Arc::new(SubscriberRegistry::new()))
    }

    /// Creates a broadcaster publishing into an existing registry.
    pub fn with_registry(registry: Arc<SubscriberRegistry>) -> Self {
        Self { registry }
    }

    /// Returns the registry subscribers are tracked in.
    pub fn registry(&self) -> &Arc<SubscriberRegistry> {
        &self.registry
    }

    /// Encodes `status` once and offers it to every subscriber.
    ///
    /// Never waits on a subscriber. An encoding failure is logged and
    /// nothing is published.
    pub fn broadcast_status(&self, status: &StatusSnapshot) -> PublishOutcome {
        match encode_status(status) {
            Ok(frame) => {
                let outcome = self.registry.publish(frame);
                log::trace!(
                    "[Broadcast] Status offered: delivered={}, dropped={}",
                    outcome.delivered,
                    outcome.dropped
                );
                outcome
            }
            Err(e) => {
                log::error!("[Broadcast] Failed to encode status: {}", e);
                PublishOutcome::default()
            }
        }
    }
}

impl Default for StatusBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusEmitter for StatusBroadcaster {
    fn emit_status(&self, status: StatusSnapshot) {
        self.broadcast_status(&status);
    }
}

/// Encodes a snapshot into the JSON text carried by one event frame.
pub fn encode_status(status: &StatusSnapshot) -> ControlResult<Frame> {
    serde_json::to_string(status)
        .map(Frame::from)
        .map_err(|e| ControlError::Serialization(e.to_string()))
}
