//! Fox Remote Core - live status and remote control for a music player.
//!
//! This crate exposes a player's state over HTTP: a snapshot endpoint, a
//! Server-Sent Events stream that pushes every status change to all
//! connected clients, and a command endpoint that drives the player.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`player`]: Player capability trait, status snapshot and an in-memory player
//! - [`events`]: Subscriber registry and drop-on-full status broadcasting
//! - [`api`]: HTTP router, handlers and server lifecycle
//! - [`error`]: Centralized error types
//!
//! # Abstraction Traits
//!
//! - [`PlayerController`](player::PlayerController): What the endpoints may ask of a player
//! - [`StatusEmitter`](events::StatusEmitter): Where a player reports status changes
//!
//! [`StatusBroadcaster`](events::StatusBroadcaster) implements `StatusEmitter`,
//! so a player wired to it feeds every open event stream.

#![allow(missing_docs)]
#![warn(clippy::all)]

pub mod api;
pub mod error;
pub mod events;
pub mod player;
pub mod protocol_constants;

// Re-export commonly used types at the crate root
pub use error::{ControlError, ControlResult};
pub use events::{
    encode_status, LoggingStatusEmitter, NoopStatusEmitter, PublishOutcome, StatusBroadcaster,
    StatusEmitter, SubscriberId, SubscriberRegistry, Subscription,
};
pub use player::{
    LyricLine, MemoryPlayer, PlayMode, PlayerController, PlayerError, StatusSnapshot, Track,
};

// Re-export API types
pub use api::http::create_router;
pub use api::{serve_listener, spawn_server, AppState, ServerError, ServerHandle};
