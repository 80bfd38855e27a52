//! Status broadcast system for real-time listeners.
//!
//! This module provides:
//! - [`StatusEmitter`] trait for players to push status changes
//! - [`SubscriberRegistry`] tracking every live event-stream subscriber
//! - [`StatusBroadcaster`] encoding snapshots and fanning them out

mod broadcaster;
mod emitter;
mod registry;

pub use broadcaster::{encode_status, StatusBroadcaster};
pub use emitter::{LoggingStatusEmitter, NoopStatusEmitter, StatusEmitter};
pub use registry::{Frame, PublishOutcome, SubscriberId, SubscriberRegistry, Subscription};
