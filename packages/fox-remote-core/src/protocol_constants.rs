//! Fixed protocol constants that should NOT be changed.
//!
//! Paths and buffer sizes here are relied on by existing clients.

// ─────────────────────────────────────────────────────────────────────────────
// HTTP API
// ─────────────────────────────────────────────────────────────────────────────

/// Snapshot endpoint path.
pub const STATUS_PATH: &str = "/api/v1/status";

/// Event-stream endpoint path.
pub const EVENTS_PATH: &str = "/api/v1/events";

/// Command endpoint path.
pub const COMMAND_PATH: &str = "/api/v1/command";

/// Upper bound on a command request body (bytes).
pub const MAX_COMMAND_BODY_SIZE: usize = 64 * 1024;

/// Default port for the control server.
pub const DEFAULT_PORT: u16 = 9898;

// ─────────────────────────────────────────────────────────────────────────────
// Event Stream
// ─────────────────────────────────────────────────────────────────────────────

/// Frames buffered per subscriber.
///
/// One is enough: a slow listener only needs the frame it has not yet
/// written, and anything newer is dropped until it catches up.
pub const SUBSCRIBER_BUFFER_CAPACITY: usize = 1;
