//! Status emitter abstraction for decoupling players from transport.
//!
//! A player implementation depends on the [`StatusEmitter`] trait rather than
//! on the subscriber registry, so it can be driven in tests or embedded
//! without an HTTP server.

use crate::player::StatusSnapshot;

/// Trait for pushing status changes without knowledge of transport.
///
/// # Example
///
/// ```ignore
/// struct Engine {
///     emitter: Arc<dyn StatusEmitter>,
/// }
///
/// impl Engine {
///     fn on_track_changed(&self) {
///         self.emitter.emit_status(self.snapshot());
///     }
/// }
/// ```
pub trait StatusEmitter: Send + Sync {
    /// Emits a freshly built status snapshot.
    ///
    /// Players call this while holding their state lock, so an
    /// implementation must not block and must not call back into the player.
    fn emit_status(&self, status: StatusSnapshot);
}

/// No-op emitter for tests or players with no listeners.
pub struct NoopStatusEmitter;

impl StatusEmitter for NoopStatusEmitter {
    fn emit_status(&self, _status: StatusSnapshot) {}
}

/// Logging emitter for debugging and development.
///
/// Logs every snapshot at debug level.
pub struct LoggingStatusEmitter;

impl StatusEmitter for LoggingStatusEmitter {
    fn emit_status(&self, status: StatusSnapshot) {
        tracing::debug!(
            title = %status.song_title,
            playing = status.is_playing,
            mode = %status.play_mode,
            "status_event"
        );
    }
}
