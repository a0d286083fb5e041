use std::fmt;

use crate::player::error::PlayerError;

/// A single playable audio item.
///
/// Immutable once enqueued; the queue position is implied by its index in
/// the session's track list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    /// Display name shown in replies and queue listings.
    pub title: String,
    /// Resolved source URL handed to the audio transport.
    pub source_url: String,
    /// Display name of the user who requested the track.
    pub requested_by: String,
}

impl Track {
    pub fn new(
        title: impl Into<String>,
        source_url: impl Into<String>,
        requested_by: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            source_url: source_url.into(),
            requested_by: requested_by.into(),
        }
    }
}

/// What happens to the queue pointer when a track completes or is skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RepeatMode {
    /// Advance; stop playback once the queue is exhausted.
    #[default]
    Off,
    /// Replay the current track on natural completion. An explicit skip
    /// still advances.
    Song,
    /// Advance; wrap around to the first track past the end.
    Queue,
}

impl RepeatMode {
    /// Parse the wire representation used by the `/loop` command (0/1/2).
    pub fn from_command_value(value: i64) -> Result<Self, PlayerError> {
        match value {
            0 => Ok(RepeatMode::Off),
            1 => Ok(RepeatMode::Song),
            2 => Ok(RepeatMode::Queue),
            other => Err(PlayerError::InvalidArgument(format!(
                "loop mode must be 0 (Off), 1 (Song) or 2 (Queue), got {}",
                other
            ))),
        }
    }
}

impl fmt::Display for RepeatMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RepeatMode::Off => write!(f, "Off"),
            RepeatMode::Song => write!(f, "Song"),
            RepeatMode::Queue => write!(f, "Queue"),
        }
    }
}

/// Playback status of a guild session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackStatus {
    #[default]
    Idle,
    Playing,
    Paused,
}
