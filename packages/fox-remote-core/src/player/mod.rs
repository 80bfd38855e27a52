//! Player capability interface.
//!
//! The HTTP layer never touches player internals directly. It depends on
//! [`PlayerController`], the narrow set of operations the real player engine
//! exposes. [`MemoryPlayer`] is an in-process implementation used by the
//! standalone server and by tests.

mod memory;
mod status;

#[cfg(test)]
pub(crate) mod test_fixtures;

pub use memory::{LyricLine, MemoryPlayer, Track};
pub use status::{PlayMode, StatusSnapshot, UnknownPlayMode};

use thiserror::Error;

/// Failure reported by the player engine.
///
/// The message is surfaced verbatim to HTTP clients.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct PlayerError {
    message: String,
}

impl PlayerError {
    /// Creates an error carrying the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Returns the error message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Operations the control surface needs from the player engine.
///
/// Implementations must be cheap and non-blocking: handlers call these from
/// async tasks without offloading to a blocking pool.
///
/// # Example
///
/// ```ignore
/// struct Engine { /* ... */ }
///
/// impl PlayerController for Engine {
///     fn status(&self) -> StatusSnapshot { /* ... */ }
///     fn play(&self) { /* ... */ }
///     // ...
/// }
/// ```
pub trait PlayerController: Send + Sync {
    /// Returns a fresh snapshot of the current state.
    fn status(&self) -> StatusSnapshot;

    /// Starts or resumes playback.
    fn play(&self);

    /// Pauses playback.
    fn pause(&self);

    /// Skips to the next track.
    fn next(&self);

    /// Returns to the previous track.
    fn previous(&self);

    /// Advances to the next play mode in the cycle.
    fn next_play_mode(&self);

    /// Switches to the given play mode.
    fn set_play_mode(&self, mode: PlayMode) -> Result<(), PlayerError>;

    /// Enters intelligent (recommendation) mode.
    fn activate_intelligent_mode(&self) -> Result<(), PlayerError>;

    /// Asks the player UI to redraw itself.
    fn rerender(&self);
}
