//! In-process player used by the standalone server.
//!
//! [`MemoryPlayer`] keeps a track list and transport state in memory and
//! pushes a fresh snapshot through its [`StatusEmitter`] after every change.
//! It does not produce audio.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use rand::Rng;
use serde::Deserialize;

use super::{PlayMode, PlayerController, PlayerError, StatusSnapshot};
use crate::events::StatusEmitter;

/// One timed lyric line.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LyricLine {
    /// Offset into the track where the line starts.
    #[serde(rename = "at_secs", with = "seconds")]
    pub at: Duration,
    /// Lyric text.
    pub text: String,
}

/// A playable track.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Track {
    pub title: String,
    #[serde(default)]
    pub artist: String,
    #[serde(rename = "duration_secs", with = "seconds")]
    pub duration: Duration,
    #[serde(default)]
    pub lyrics: Vec<LyricLine>,
}

impl Track {
    /// Creates a track without lyrics.
    pub fn new(title: impl Into<String>, artist: impl Into<String>, duration: Duration) -> Self {
        Self {
            title: title.into(),
            artist: artist.into(),
            duration,
            lyrics: Vec::new(),
        }
    }

    /// Adds a lyric line starting at `at`.
    pub fn with_lyric(mut self, at: Duration, text: impl Into<String>) -> Self {
        self.lyrics.push(LyricLine {
            at,
            text: text.into(),
        });
        self
    }

    /// Returns the lyric line active at `elapsed`.
    fn lyric_at(&self, elapsed: Duration) -> &str {
        self.lyrics
            .iter()
            .take_while(|line| line.at <= elapsed)
            .last()
            .map(|line| line.text.as_str())
            .unwrap_or_default()
    }
}

struct PlayerState {
    tracks: Vec<Track>,
    current: usize,
    playing: bool,
    mode: PlayMode,
    elapsed: Duration,
    logged_in: bool,
}

impl PlayerState {
    fn snapshot(&self) -> StatusSnapshot {
        let track = self.tracks.get(self.current);
        StatusSnapshot {
            song_title: track.map(|t| t.title.clone()).unwrap_or_default(),
            artist: track.map(|t| t.artist.clone()).unwrap_or_default(),
            is_playing: self.playing,
            play_mode: self.mode,
            song_duration: track.map(|t| t.duration).unwrap_or_default(),
            playback_played: self.elapsed,
            lyric: track
                .map(|t| t.lyric_at(self.elapsed).to_string())
                .unwrap_or_default(),
            is_logged_in: self.logged_in,
        }
    }

    /// Moves to another track as a user skip would.
    fn skip_forward(&mut self) {
        let len = self.tracks.len();
        self.current = if self.mode.is_random() && len > 1 {
            let offset = rand::rng().random_range(1..len);
            (self.current + offset) % len
        } else {
            (self.current + 1) % len
        };
        self.elapsed = Duration::ZERO;
    }

    /// Applies the play mode's rule for what follows a finished track.
    fn finish_track(&mut self) {
        self.elapsed = Duration::ZERO;
        match self.mode {
            PlayMode::SingleLoop => {}
            PlayMode::Ordered => {
                if self.current + 1 < self.tracks.len() {
                    self.current += 1;
                } else {
                    self.playing = false;
                }
            }
            PlayMode::ListLoop
            | PlayMode::ListRandom
            | PlayMode::InfRandom
            | PlayMode::Intelligent => self.skip_forward(),
        }
    }
}

/// Player that holds its whole state in memory.
pub struct MemoryPlayer {
    state: RwLock<PlayerState>,
    emitter: Arc<dyn StatusEmitter>,
    rerenders: AtomicU64,
}

impl MemoryPlayer {
    /// Creates a paused player positioned at the first track.
    pub fn new(tracks: Vec<Track>, emitter: Arc<dyn StatusEmitter>) -> Self {
        let tracks = tracks
            .into_iter()
            .map(|mut track| {
                track.lyrics.sort_by_key(|line| line.at);
                track
            })
            .collect();
        Self {
            state: RwLock::new(PlayerState {
                tracks,
                current: 0,
                playing: false,
                mode: PlayMode::default(),
                elapsed: Duration::ZERO,
                logged_in: false,
            }),
            emitter,
            rerenders: AtomicU64::new(0),
        }
    }

    /// Sets the logged-in flag and emits the new status.
    pub fn set_logged_in(&self, logged_in: bool) {
        self.update(|state| {
            let changed = state.logged_in != logged_in;
            state.logged_in = logged_in;
            changed
        });
    }

    /// Number of re-render requests received.
    #[must_use]
    pub fn rerender_count(&self) -> u64 {
        self.rerenders.load(Ordering::Relaxed)
    }

    /// Advances playback by `delta`.
    ///
    /// Does nothing while paused. Crossing the end of the track applies the
    /// current play mode's rule for what plays next.
    pub fn tick(&self, delta: Duration) {
        self.update(|state| {
            if !state.playing || state.tracks.is_empty() {
                return false;
            }
            state.elapsed += delta;
            if state.elapsed >= state.tracks[state.current].duration {
                state.finish_track();
            }
            true
        });
    }

    /// Applies `change` under the write lock and emits the resulting
    /// snapshot if it reports a change.
    ///
    /// The emit happens before the lock is released, so listeners see
    /// snapshots in the order the changes were applied.
    fn update(&self, change: impl FnOnce(&mut PlayerState) -> bool) {
        let mut state = self.state.write();
        if change(&mut state) {
            self.emitter.emit_status(state.snapshot());
        }
    }

    /// Like [`update`](Self::update), for changes that can be refused.
    fn try_update(
        &self,
        change: impl FnOnce(&mut PlayerState) -> Result<bool, PlayerError>,
    ) -> Result<(), PlayerError> {
        let mut state = self.state.write();
        if change(&mut state)? {
            self.emitter.emit_status(state.snapshot());
        }
        Ok(())
    }
}

impl PlayerController for MemoryPlayer {
    fn status(&self) -> StatusSnapshot {
        self.state.read().snapshot()
    }

    fn play(&self) {
        self.update(|state| {
            if state.tracks.is_empty() || state.playing {
                return false;
            }
            state.playing = true;
            true
        });
    }

    fn pause(&self) {
        self.update(|state| std::mem::replace(&mut state.playing, false));
    }

    fn next(&self) {
        self.update(|state| {
            if state.tracks.is_empty() {
                return false;
            }
            state.skip_forward();
            true
        });
    }

    fn previous(&self) {
        self.update(|state| {
            let len = state.tracks.len();
            if len == 0 {
                return false;
            }
            state.current = (state.current + len - 1) % len;
            state.elapsed = Duration::ZERO;
            true
        });
    }

    fn next_play_mode(&self) {
        self.update(|state| {
            state.mode = state.mode.next();
            true
        });
    }

    fn set_play_mode(&self, mode: PlayMode) -> Result<(), PlayerError> {
        self.update(|state| std::mem::replace(&mut state.mode, mode) != mode);
        Ok(())
    }

    fn activate_intelligent_mode(&self) -> Result<(), PlayerError> {
        self.try_update(|state| {
            if !state.logged_in {
                return Err(PlayerError::new(
                    "intelligent mode requires a logged-in account",
                ));
            }
            if state.tracks.is_empty() {
                return Err(PlayerError::new("no tracks available for intelligent mode"));
            }
            state.mode = PlayMode::Intelligent;
            state.playing = true;
            Ok(true)
        })?;
        log::info!("[Player] Intelligent mode activated");
        Ok(())
    }

    fn rerender(&self) {
        let count = self.rerenders.fetch_add(1, Ordering::Relaxed) + 1;
        log::debug!("[Player] Re-render requested (#{})", count);
    }
}

mod seconds {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
    }
}
