//! Command parsing and dispatch.
//!
//! A request body is parsed into a [`CommandRequest`], validated into a
//! [`PlayerCommand`], then executed against the player. Each step fails with
//! the [`ControlError`] variant that decides the HTTP status.

use serde_json::{Map, Value};

use crate::error::{ControlError, ControlResult};
use crate::player::{PlayMode, PlayerController};

/// Raw command body: `{"command": "...", "args": ["..."]}`.
///
/// Missing or `null` fields read as empty.
#[derive(Debug, Default)]
pub struct CommandRequest {
    command: Option<String>,
    args: Option<Vec<String>>,
}

impl CommandRequest {
    /// Parses a JSON request body.
    ///
    /// Only the first JSON value is read and anything after it is ignored.
    /// Field names match case-insensitively and unknown fields are skipped.
    pub fn from_slice(body: &[u8]) -> ControlResult<Self> {
        let fields = serde_json::Deserializer::from_slice(body)
            .into_iter::<Option<Map<String, Value>>>()
            .next()
            .ok_or_else(|| ControlError::InvalidRequest("EOF".to_string()))?
            .map_err(invalid_request)?;

        let mut request = Self::default();
        for (key, value) in fields.unwrap_or_default() {
            if key.eq_ignore_ascii_case("command") {
                request.command = serde_json::from_value(value).map_err(invalid_request)?;
            } else if key.eq_ignore_ascii_case("args") {
                request.args = serde_json::from_value(value).map_err(invalid_request)?;
            }
        }
        Ok(request)
    }

    /// Returns the command name.
    pub fn name(&self) -> &str {
        self.command.as_deref().unwrap_or_default()
    }

    /// Returns the command arguments.
    pub fn args(&self) -> &[String] {
        self.args.as_deref().unwrap_or_default()
    }
}

/// A validated command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerCommand {
    SetPlayMode(PlayMode),
    Play,
    Pause,
    Next,
    Previous,
    NextPlayMode,
    ActivateIntelligentMode,
}

impl PlayerCommand {
    /// Returns the wire name of the command.
    pub fn name(&self) -> &'static str {
        match self {
            Self::SetPlayMode(_) => "set_play_mode",
            Self::Play => "play",
            Self::Pause => "pause",
            Self::Next => "next",
            Self::Previous => "previous",
            Self::NextPlayMode => "next_play_mode",
            Self::ActivateIntelligentMode => "activate_intelligent_mode",
        }
    }

    /// Runs the command against the player.
    ///
    /// A successful mode change is followed by a re-render request.
    pub fn execute(self, player: &dyn PlayerController) -> ControlResult<()> {
        match self {
            Self::SetPlayMode(mode) => {
                player.set_play_mode(mode)?;
                player.rerender();
            }
            Self::Play => player.play(),
            Self::Pause => player.pause(),
            Self::Next => player.next(),
            Self::Previous => player.previous(),
            Self::NextPlayMode => player.next_play_mode(),
            Self::ActivateIntelligentMode => player.activate_intelligent_mode()?,
        }
        Ok(())
    }
}

impl TryFrom<&CommandRequest> for PlayerCommand {
    type Error = ControlError;

    fn try_from(request: &CommandRequest) -> ControlResult<Self> {
        let command = match request.name() {
            "set_play_mode" => {
                let [arg] = request.args() else {
                    return Err(ControlError::InvalidArgs);
                };
                let mode = arg
                    .parse::<PlayMode>()
                    .ok()
                    .filter(|mode| mode.is_settable())
                    .ok_or(ControlError::InvalidPlayMode)?;
                Self::SetPlayMode(mode)
            }
            "play" => Self::Play,
            "pause" => Self::Pause,
            "next" => Self::Next,
            "previous" => Self::Previous,
            "next_play_mode" => Self::NextPlayMode,
            "activate_intelligent_mode" => Self::ActivateIntelligentMode,
            _ => return Err(ControlError::UnknownCommand),
        };
        Ok(command)
    }
}

fn invalid_request(e: serde_json::Error) -> ControlError {
    ControlError::InvalidRequest(e.to_string())
}

/// Parses, validates and executes one command body.
pub fn dispatch(player: &dyn PlayerController, body: &[u8]) -> ControlResult<PlayerCommand> {
    let request = CommandRequest::from_slice(body)?;
    let command = PlayerCommand::try_from(&request)?;
    log::debug!("[Command] Executing {}", command.name());
    command.execute(player)?;
    Ok(command)
}
