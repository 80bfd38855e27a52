//! Player status types shared by every endpoint.
//!
//! [`StatusSnapshot`] is the single value that travels over `/status` and the
//! event stream. Field names and encodings are part of the wire contract with
//! existing clients, so they are pinned with serde attributes rather than
//! derived from the Rust names.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Play mode reported by the player.
///
/// Encoded on the wire as its integer code (see [`PlayMode::code`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum PlayMode {
    /// Loop over the whole list.
    #[default]
    ListLoop,
    /// Play the list once, in order.
    Ordered,
    /// Repeat the current track.
    SingleLoop,
    /// Shuffle within the list.
    ListRandom,
    /// Endless shuffle.
    InfRandom,
    /// Recommendation-driven playback. Entered via
    /// `activate_intelligent_mode`, never via `set_play_mode`.
    Intelligent,
}

/// Error returned when a play-mode name or code is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown play mode: {0}")]
pub struct UnknownPlayMode(pub String);

impl PlayMode {
    /// Modes accepted by `set_play_mode`, in cycling order.
    pub const SETTABLE: [PlayMode; 5] = [
        PlayMode::ListLoop,
        PlayMode::Ordered,
        PlayMode::SingleLoop,
        PlayMode::ListRandom,
        PlayMode::InfRandom,
    ];

    /// Integer code used in the JSON status payload.
    pub fn code(self) -> u8 {
        match self {
            Self::ListLoop => 1,
            Self::Ordered => 2,
            Self::SingleLoop => 3,
            Self::ListRandom => 4,
            Self::InfRandom => 5,
            Self::Intelligent => 6,
        }
    }

    /// Command-argument name of the mode.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ListLoop => "list_loop",
            Self::Ordered => "ordered",
            Self::SingleLoop => "single_loop",
            Self::ListRandom => "list_random",
            Self::InfRandom => "inf_random",
            Self::Intelligent => "intelligent",
        }
    }

    /// Whether clients may select this mode directly.
    pub fn is_settable(self) -> bool {
        self != Self::Intelligent
    }

    /// Whether track selection is random in this mode.
    pub fn is_random(self) -> bool {
        matches!(self, Self::ListRandom | Self::InfRandom | Self::Intelligent)
    }

    /// The mode `next_play_mode` switches to.
    ///
    /// Cycles through [`PlayMode::SETTABLE`]; intelligent mode falls back to
    /// the start of the cycle.
    pub fn next(self) -> Self {
        match self {
            Self::ListLoop => Self::Ordered,
            Self::Ordered => Self::SingleLoop,
            Self::SingleLoop => Self::ListRandom,
            Self::ListRandom => Self::InfRandom,
            Self::InfRandom | Self::Intelligent => Self::ListLoop,
        }
    }
}

impl fmt::Display for PlayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlayMode {
    type Err = UnknownPlayMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "list_loop" => Ok(Self::ListLoop),
            "ordered" => Ok(Self::Ordered),
            "single_loop" => Ok(Self::SingleLoop),
            "list_random" => Ok(Self::ListRandom),
            "inf_random" => Ok(Self::InfRandom),
            "intelligent" => Ok(Self::Intelligent),
            other => Err(UnknownPlayMode(other.to_string())),
        }
    }
}

impl From<PlayMode> for u8 {
    fn from(mode: PlayMode) -> Self {
        mode.code()
    }
}

impl TryFrom<u8> for PlayMode {
    type Error = UnknownPlayMode;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(Self::ListLoop),
            2 => Ok(Self::Ordered),
            3 => Ok(Self::SingleLoop),
            4 => Ok(Self::ListRandom),
            5 => Ok(Self::InfRandom),
            6 => Ok(Self::Intelligent),
            other => Err(UnknownPlayMode(other.to_string())),
        }
    }
}

/// Point-in-time view of the player.
///
/// Built fresh for every query and broadcast and never mutated afterwards.
/// Durations are encoded as integer nanoseconds.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StatusSnapshot {
    /// Title of the current song.
    pub song_title: String,
    /// Artist of the current song.
    pub artist: String,
    /// Whether playback is running.
    pub is_playing: bool,
    /// Current play mode.
    pub play_mode: PlayMode,
    /// Total length of the current song.
    #[serde(with = "duration_nanos")]
    pub song_duration: Duration,
    /// Position within the current song.
    #[serde(with = "duration_nanos")]
    pub playback_played: Duration,
    /// Lyric line at the current position.
    pub lyric: String,
    /// Whether an account is logged in.
    pub is_logged_in: bool,
}

mod duration_nanos {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        let nanos = i64::try_from(value.as_nanos()).unwrap_or(i64::MAX);
        serializer.serialize_i64(nanos)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let nanos = i64::deserialize(deserializer)?;
        Ok(Duration::from_nanos(nanos.max(0) as u64))
    }
}
