use thiserror::Error;

use super::track::PlaybackStatus;

/// Errors that can occur during playback operations.
#[derive(Error, Debug)]
pub enum PlayerError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("No track is currently playing")]
    NoActiveTrack,

    #[error("Operation is not valid while playback is {status:?}")]
    InvalidState { status: PlaybackStatus },

    #[error("There is no queue for this server")]
    NoQueue,

    #[error("Could not resolve a playable source: {0}")]
    ResolutionFailure(String),

    #[error("Not in a guild")]
    NotInGuild,

    #[error("You need to be in a voice channel")]
    UserNotInVoiceChannel,

    #[error("Not connected to a voice channel")]
    NotConnected,

    #[error("Failed to join voice channel: {0}")]
    JoinError(String),

    #[error("Audio transport error: {0}")]
    TransportError(String),
}

/// Result type for playback operations.
pub type PlayerResult<T> = Result<T, PlayerError>;
