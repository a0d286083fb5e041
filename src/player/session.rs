use tracing::debug;

use super::error::{PlayerError, PlayerResult};
use super::track::{PlaybackStatus, RepeatMode, Track};

/// Why the queue pointer is being advanced.
///
/// The distinction matters under [`RepeatMode::Song`]: a natural completion
/// replays the current track, an explicit skip moves past it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvanceReason {
    Completion,
    Skip,
}

/// Outcome of advancing the queue pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// Playback continues with the track at this index.
    Next(usize),
    /// The queue is exhausted; the session is back to idle.
    Finished,
}

/// Read-only view of a session's queue, for the `/queue` listing.
#[derive(Debug, Clone)]
pub struct QueueSnapshot {
    /// Tracks in enqueue order. Positions shown to users are 1-based.
    pub tracks: Vec<Track>,
    /// Index of the currently playing track, if any.
    pub current: Option<usize>,
    pub repeat: RepeatMode,
    pub status: PlaybackStatus,
}

/// Per-guild playback state: the ordered track list, the current-playing
/// pointer, the repeat mode, and the playback status.
///
/// Purely in-memory and synchronous; the controller owns one of these per
/// guild behind a mutex and drives the audio transport from the values
/// returned here. Completed and skipped tracks stay in the list (the
/// pointer moves past them), which is what lets repeat-queue wrap back to
/// the first track.
#[derive(Debug, Default)]
pub struct GuildSession {
    tracks: Vec<Track>,
    current: Option<usize>,
    repeat: RepeatMode,
    status: PlaybackStatus,
    // Bumped every time a new playback is started; completion reports
    // carrying an older id are stale and must be ignored.
    play_id: u64,
}

impl GuildSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a track to the queue. Returns its 1-based position and
    /// `true` if playback should start with it (nothing was playing).
    pub fn enqueue(&mut self, track: Track) -> (usize, bool) {
        self.tracks.push(track);
        let position = self.tracks.len();

        if self.current.is_none() {
            self.current = Some(position - 1);
            self.status = PlaybackStatus::Playing;
            self.play_id += 1;
            (position, true)
        } else {
            (position, false)
        }
    }

    /// Move the queue pointer according to the repeat mode.
    ///
    /// Fails with [`PlayerError::NoActiveTrack`] when nothing is playing.
    pub fn advance(&mut self, reason: AdvanceReason) -> PlayerResult<Advance> {
        let current = self.current.ok_or(PlayerError::NoActiveTrack)?;

        let next = match (self.repeat, reason) {
            (RepeatMode::Song, AdvanceReason::Completion) => Some(current),
            (RepeatMode::Queue, _) => Some((current + 1) % self.tracks.len()),
            // Off always advances; so does Song on an explicit skip.
            _ => {
                let candidate = current + 1;
                (candidate < self.tracks.len()).then_some(candidate)
            }
        };

        match next {
            Some(index) => {
                debug!(from = current, to = index, ?reason, "advancing queue pointer");
                self.current = Some(index);
                self.status = PlaybackStatus::Playing;
                self.play_id += 1;
                Ok(Advance::Next(index))
            }
            None => {
                self.current = None;
                self.status = PlaybackStatus::Idle;
                Ok(Advance::Finished)
            }
        }
    }

    pub fn pause(&mut self) -> PlayerResult<()> {
        match self.status {
            PlaybackStatus::Playing => {
                self.status = PlaybackStatus::Paused;
                Ok(())
            }
            status => Err(PlayerError::InvalidState { status }),
        }
    }

    pub fn resume(&mut self) -> PlayerResult<()> {
        match self.status {
            PlaybackStatus::Paused => {
                self.status = PlaybackStatus::Playing;
                Ok(())
            }
            status => Err(PlayerError::InvalidState { status }),
        }
    }

    pub fn set_repeat(&mut self, mode: RepeatMode) {
        self.repeat = mode;
    }

    pub fn snapshot(&self) -> QueueSnapshot {
        QueueSnapshot {
            tracks: self.tracks.clone(),
            current: self.current,
            repeat: self.repeat,
            status: self.status,
        }
    }

    pub fn current_track(&self) -> Option<&Track> {
        self.current.and_then(|index| self.tracks.get(index))
    }

    pub fn status(&self) -> PlaybackStatus {
        self.status
    }

    pub fn play_id(&self) -> u64 {
        self.play_id
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }
}
