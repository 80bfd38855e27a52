//! Shared test doubles for the player capability interface.

use parking_lot::Mutex;

use super::{PlayMode, PlayerController, PlayerError, StatusSnapshot};

/// Player that records every call and can be told to fail.
#[derive(Default)]
pub struct RecordingPlayer {
    calls: Mutex<Vec<String>>,
    status: Mutex<StatusSnapshot>,
    set_mode_error: Mutex<Option<String>>,
    intelligent_error: Mutex<Option<String>>,
}

impl RecordingPlayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Calls observed so far, e.g. `["set_play_mode:ordered", "rerender"]`.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn set_status(&self, status: StatusSnapshot) {
        *self.status.lock() = status;
    }

    pub fn fail_set_play_mode(&self, message: &str) {
        *self.set_mode_error.lock() = Some(message.to_string());
    }

    pub fn fail_intelligent_mode(&self, message: &str) {
        *self.intelligent_error.lock() = Some(message.to_string());
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.lock().push(call.into());
    }
}

impl PlayerController for RecordingPlayer {
    fn status(&self) -> StatusSnapshot {
        self.status.lock().clone()
    }

    fn play(&self) {
        self.record("play");
        self.status.lock().is_playing = true;
    }

    fn pause(&self) {
        self.record("pause");
        self.status.lock().is_playing = false;
    }

    fn next(&self) {
        self.record("next");
    }

    fn previous(&self) {
        self.record("previous");
    }

    fn next_play_mode(&self) {
        self.record("next_play_mode");
    }

    fn set_play_mode(&self, mode: PlayMode) -> Result<(), PlayerError> {
        self.record(format!("set_play_mode:{}", mode));
        match self.set_mode_error.lock().clone() {
            Some(message) => Err(PlayerError::new(message)),
            None => {
                self.status.lock().play_mode = mode;
                Ok(())
            }
        }
    }

    fn activate_intelligent_mode(&self) -> Result<(), PlayerError> {
        self.record("activate_intelligent_mode");
        match self.intelligent_error.lock().clone() {
            Some(message) => Err(PlayerError::new(message)),
            None => Ok(()),
        }
    }

    fn rerender(&self) {
        self.record("rerender");
    }
}
